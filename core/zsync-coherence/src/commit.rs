//! Commit-on-write.
//!
//! Every transport call made through [`Coherent::sync`] is followed by a
//! store commit. The sequence is fixed: the host transport returns, the
//! commit runs, then `sync` returns. Anything the caller does with the
//! report therefore happens after the store is current.

use crate::coherent::Coherent;
use crate::config::CommitMode;
use crate::error::{CoherenceResult, TransportError};
use crate::resource::{Resource, SyncMethod, SyncOptions};
use tracing::warn;

/// What a [`Coherent::sync`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The transport operation that ran.
    pub method: SyncMethod,
    /// The transport's failure, if it reported one.
    pub transport_error: Option<TransportError>,
    /// Whether the store was written or invalidated afterwards.
    pub committed: bool,
}

impl SyncReport {
    /// Whether the transport call succeeded.
    pub fn is_ok(&self) -> bool {
        self.transport_error.is_none()
    }
}

impl<E: Resource> Coherent<E> {
    /// Runs a transport call, then commits the result to the shared store.
    ///
    /// By default the entity's snapshot is written at its token, whatever the
    /// method. A member's token is its owner's, so a member's commit replaces
    /// the owner's snapshot and the owner resyncs on its next guarded read.
    /// With [`CommitMode::Invalidate`] member writes and deletes remove the
    /// entry instead, and member reads leave the store alone.
    ///
    /// When the transport fails, local state is still committed unless
    /// `commit_on_transport_failure` is off. Store failures are returned as
    /// errors; transport failures only appear in the report.
    pub fn sync(&mut self, method: SyncMethod, options: SyncOptions) -> CoherenceResult<SyncReport> {
        let transport_error = self.entity.sync(method, options).err();

        if let Some(err) = &transport_error {
            if !self.layer.config().commit_on_transport_failure {
                warn!("{:?} failed, skipping commit: {}", method, err);
                return Ok(SyncReport {
                    method,
                    transport_error,
                    committed: false,
                });
            }
            warn!("{:?} failed, committing local state anyway: {}", method, err);
        }

        let committed = self.commit(method, transport_error.is_none())?;
        Ok(SyncReport {
            method,
            transport_error,
            committed,
        })
    }

    /// Reads the entity from the server and commits it.
    pub fn fetch(&mut self) -> CoherenceResult<SyncReport> {
        self.sync(SyncMethod::Read, SyncOptions::default())
    }

    /// Returns whether the store was touched.
    fn commit(&mut self, method: SyncMethod, transport_ok: bool) -> CoherenceResult<bool> {
        let token = self.token()?;
        let member = !self.entity.membership().is_standalone();

        let committed = match self.layer.config().commit_mode {
            CommitMode::Invalidate if member && !method.is_mutation() => false,
            CommitMode::Invalidate if member || method == SyncMethod::Delete => {
                self.layer.invalidate(&token)?;
                true
            }
            _ => {
                let dump = self.generate_dump()?;
                self.layer.commit_dump(&token, &dump)?;
                true
            }
        };

        if member && transport_ok {
            self.member_epoch = Some(self.layer.epoch(&token));
        }
        Ok(committed)
    }
}
