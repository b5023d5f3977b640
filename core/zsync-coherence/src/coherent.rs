//! The coherency decorator and token resolution.

use crate::error::{CoherenceError, CoherenceResult};
use crate::guard::Freshness;
use crate::layer::CoherencyLayer;
use crate::resource::Resource;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::debug;
use zsync_types::{Dump, Membership, Token};

/// A unit the layer can resolve and guard without knowing its entity type.
///
/// Owners are registered with the layer as `Mutex<dyn CoherencyUnit>` so
/// members of any concrete collection type can delegate to them.
pub trait CoherencyUnit: Send {
    /// Resolves (and memoizes) the unit's token without polling the wipe
    /// condition.
    fn resolve(&self) -> CoherenceResult<Token>;

    /// Runs the staleness guard on the unit.
    fn ensure_fresh(&mut self) -> CoherenceResult<Freshness>;
}

/// A host entity wrapped with cross-context coherency.
///
/// Read-path accessors (`fresh_json`, `fresh_members`, `each`) run the
/// staleness guard first; write-path calls go through [`Coherent::sync`],
/// which commits a snapshot once the transport returns.
pub struct Coherent<E> {
    pub(crate) entity: E,
    pub(crate) layer: Arc<CoherencyLayer>,
    token: OnceLock<Token>,
    /// Owner epoch at which a member's copy was last read.
    pub(crate) member_epoch: Option<u64>,
}

impl<E: Resource> Coherent<E> {
    /// Wraps `entity` for use in the context served by `layer`.
    pub fn new(entity: E, layer: Arc<CoherencyLayer>) -> Self {
        Self {
            entity,
            layer,
            token: OnceLock::new(),
            member_epoch: None,
        }
    }

    /// The wrapped entity, without a freshness check.
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Mutable access for local edits. Changes reach the store on the next
    /// [`sync`](Self::sync).
    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    /// Unwraps the entity.
    pub fn into_inner(self) -> E {
        self.entity
    }

    /// The layer this entity belongs to.
    pub fn layer(&self) -> &Arc<CoherencyLayer> {
        &self.layer
    }

    /// The entity's store address.
    ///
    /// When the layer polls on resolve, the wipe condition is evaluated
    /// first, so a wipe may remove this entity's own entry.
    pub fn token(&self) -> CoherenceResult<Token> {
        if self.layer.config().poll_wipe_on_resolve {
            self.layer.poll_wipe()?;
        }
        self.resolve_memoized()
    }

    /// Canonical snapshot of the entity's own exported view.
    pub fn generate_dump(&self) -> CoherenceResult<Dump> {
        Ok(Dump::of(&self.entity.export())?)
    }

    /// Whether the store holds exactly `dump` at this entity's token.
    pub fn dumps_equal(&self, dump: &Dump) -> CoherenceResult<bool> {
        let token = self.token()?;
        self.layer.dumps_equal(dump, &token)
    }

    pub(crate) fn resolve_memoized(&self) -> CoherenceResult<Token> {
        if let Some(token) = self.token.get() {
            return Ok(token.clone());
        }
        let token = self.derive_token()?;
        debug!("Resolved token {}", token);
        Ok(self.token.get_or_init(|| token).clone())
    }

    fn derive_token(&self) -> CoherenceResult<Token> {
        match self.entity.membership() {
            Membership::MemberOf(owner_id) => {
                let owner = self.layer.owner(&owner_id)?;
                let token = lock_unit(&owner).resolve()?;
                Ok(token)
            }
            Membership::Standalone => {
                let locator = self
                    .entity
                    .locator()
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        CoherenceError::TokenResolution("entity has no resource locator".into())
                    })?;
                let client_id = self.entity.client_id();
                Ok(self.layer.address_for(&locator, client_id.as_ref()))
            }
        }
    }
}

impl<E: Resource> CoherencyUnit for Coherent<E> {
    fn resolve(&self) -> CoherenceResult<Token> {
        self.resolve_memoized()
    }

    fn ensure_fresh(&mut self) -> CoherenceResult<Freshness> {
        Coherent::ensure_fresh(self)
    }
}

pub(crate) fn lock_unit(
    unit: &Arc<Mutex<dyn CoherencyUnit>>,
) -> MutexGuard<'_, dyn CoherencyUnit + 'static> {
    unit.lock().unwrap_or_else(PoisonError::into_inner)
}
