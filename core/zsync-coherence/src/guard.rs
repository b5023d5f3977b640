//! Read-time staleness guard.
//!
//! Before a guarded accessor returns data, the coherency unit's current
//! snapshot is compared with the one in the shared store. A mismatch means
//! some other context (or this one, through a member) has written since this
//! copy was last synced, and the unit is refetched before the accessor
//! proceeds. Nothing is checked proactively or in the background.
//!
//! The compare and the refetch are not atomic with respect to other
//! contexts. A write landing right after the compare is picked up by the
//! next guarded access, in whichever context makes it.

use crate::coherent::{lock_unit, Coherent};
use crate::error::{CoherenceResult, TransportError};
use crate::hooks::HoldGuard;
use crate::resource::{Collection, Resource, SyncMethod, SyncOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zsync_types::Membership;

/// Outcome of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The in-memory copy matched the store; nothing was fetched.
    Fresh,
    /// The copy was stale and has been refetched.
    Resynced,
    /// The copy was stale and the refetch failed. The in-memory state is
    /// whatever the transport left behind.
    ResyncFailed(TransportError),
}

impl Freshness {
    /// Whether a refetch was attempted.
    pub fn refetched(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

impl<E: Resource> Coherent<E> {
    /// Makes sure the coherency unit is in sync with the shared store,
    /// blocking on a refetch if it is not.
    ///
    /// For a member, the unit is its owner: the owner is guarded, then the
    /// member's own copy is re-read if the owner has been reloaded since the
    /// member last read. A member whose owner is already current is not
    /// re-read on its first guarded access.
    pub fn ensure_fresh(&mut self) -> CoherenceResult<Freshness> {
        let owner_id = match self.entity.membership() {
            Membership::Standalone => return self.guard_unit(),
            Membership::MemberOf(owner_id) => owner_id,
        };

        let owner = self.layer.owner(&owner_id)?;
        let freshness = lock_unit(&owner).ensure_fresh()?;
        if let Freshness::ResyncFailed(_) = freshness {
            return Ok(freshness);
        }

        let token = self.resolve_memoized()?;
        let epoch = self.layer.epoch(&token);
        match self.member_epoch {
            Some(seen) if seen == epoch => Ok(freshness),
            // First guarded read in this context with a current owner.
            None if freshness == Freshness::Fresh => {
                self.member_epoch = Some(epoch);
                Ok(Freshness::Fresh)
            }
            _ => Ok(self.reread_member(epoch)),
        }
    }

    /// The exported view, guaranteed fresh.
    pub fn fresh_json(&mut self) -> CoherenceResult<Value> {
        self.ensure_fresh()?;
        Ok(self.entity.export())
    }

    fn guard_unit(&mut self) -> CoherenceResult<Freshness> {
        let current = self.generate_dump()?;
        let token = self.token()?;
        if self.layer.dumps_equal(&current, &token)? {
            debug!("Snapshot at {} is current", token);
            return Ok(Freshness::Fresh);
        }

        info!("Snapshot at {} diverged, refetching", token);
        let layer = Arc::clone(&self.layer);
        let report = {
            let _hold = HoldGuard::engage(layer.hooks(), &token);
            self.sync(SyncMethod::Read, SyncOptions::REFETCH)?
        };

        Ok(match report.transport_error {
            None => Freshness::Resynced,
            Some(err) => {
                warn!("Refetch of {} failed: {}", token, err);
                Freshness::ResyncFailed(err)
            }
        })
    }

    /// Re-reads a member whose owner was reloaded. The owner's commit
    /// already holds the fresh snapshot, so the store is left alone.
    fn reread_member(&mut self, epoch: u64) -> Freshness {
        match self.entity.sync(SyncMethod::Read, SyncOptions::REFETCH) {
            Ok(()) => {
                self.member_epoch = Some(epoch);
                Freshness::Resynced
            }
            Err(err) => {
                warn!("Re-reading member after owner resync failed: {}", err);
                Freshness::ResyncFailed(err)
            }
        }
    }
}

impl<C: Collection> Coherent<C> {
    /// The members, guaranteed fresh.
    pub fn fresh_members(&mut self) -> CoherenceResult<&[C::Member]> {
        self.ensure_fresh()?;
        Ok(self.entity.members())
    }

    /// Visits every member after a freshness check.
    pub fn each<F>(&mut self, f: F) -> CoherenceResult<()>
    where
        F: FnMut(&C::Member),
    {
        self.fresh_members()?.iter().for_each(f);
        Ok(())
    }
}
