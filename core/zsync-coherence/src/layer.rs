//! The per-context coherency layer.
//!
//! One layer lives in each execution context. It owns the context's view of
//! the shared store, the configuration, the host's blocking hooks, the wipe
//! condition and the registry of owners that members delegate to.

use crate::coherent::CoherencyUnit;
use crate::config::CoherencyConfig;
use crate::error::{CoherenceError, CoherenceResult};
use crate::hooks::{BlockingHooks, NoopHooks};
use crate::wipe::{wipe_namespace, WipeCondition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tracing::{debug, info};
use zsync_store::SharedStore;
use zsync_types::{ClientId, Dump, OwnerId, Token};

/// A registered owner. Held weakly: the registry never keeps an owner alive.
type OwnerSlot = Weak<Mutex<dyn CoherencyUnit>>;

/// Shared coherency state for one execution context.
pub struct CoherencyLayer {
    /// The store shared with every other context.
    store: Arc<dyn SharedStore>,
    /// Configuration.
    config: CoherencyConfig,
    /// Host callbacks around blocking resyncs.
    hooks: Arc<dyn BlockingHooks>,
    /// When `poll_wipe` clears the namespace.
    wipe_condition: RwLock<WipeCondition>,
    /// Owners that members resolve through.
    owners: RwLock<HashMap<OwnerId, OwnerSlot>>,
    /// Per-token count of snapshots committed from this context. Entries
    /// are never dropped, so the map grows with the number of distinct
    /// tokens committed; wipes and invalidations keep the counts so members
    /// never see an epoch repeat.
    epochs: RwLock<HashMap<Token, u64>>,
}

impl CoherencyLayer {
    /// Creates a layer with no-op hooks.
    pub fn new(store: Arc<dyn SharedStore>, config: CoherencyConfig) -> Self {
        Self::with_hooks(store, config, Arc::new(NoopHooks))
    }

    /// Creates a layer with custom blocking hooks.
    pub fn with_hooks(
        store: Arc<dyn SharedStore>,
        config: CoherencyConfig,
        hooks: Arc<dyn BlockingHooks>,
    ) -> Self {
        Self {
            store,
            config,
            hooks,
            wipe_condition: RwLock::new(WipeCondition::Never),
            owners: RwLock::new(HashMap::new()),
            epochs: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the initial wipe condition.
    #[must_use]
    pub fn with_wipe_condition(self, condition: impl Into<WipeCondition>) -> Self {
        self.set_wipe_condition(condition);
        self
    }

    /// Returns the shared store.
    pub fn store(&self) -> &Arc<dyn SharedStore> {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoherencyConfig {
        &self.config
    }

    pub(crate) fn hooks(&self) -> &dyn BlockingHooks {
        self.hooks.as_ref()
    }

    // ── Addressing ───────────────────────────────────────────────

    /// Derives the store address for a locator.
    ///
    /// A client id, when given, is prepended to the locator as-is. The
    /// separator is only inserted when the result does not already start
    /// with one.
    pub fn address_for(&self, locator: &str, client_id: Option<&ClientId>) -> Token {
        let base = match client_id {
            Some(cid) => format!("{cid}{locator}"),
            None => locator.to_string(),
        };
        let namespace = &self.config.namespace;
        if base.starts_with(self.config.separator) {
            Token::new(format!("{namespace}{base}"))
        } else {
            Token::new(format!("{namespace}{}{base}", self.config.separator))
        }
    }

    // ── Snapshots ────────────────────────────────────────────────

    /// Whether the store currently holds exactly `dump` at `token`.
    ///
    /// A missing entry never matches.
    pub fn dumps_equal(&self, dump: &Dump, token: &Token) -> CoherenceResult<bool> {
        let stored = self.store.get_item(token.as_str())?;
        Ok(stored.as_deref() == Some(dump.as_str()))
    }

    /// [`dumps_equal`](Self::dumps_equal) for a dump handed over untyped.
    ///
    /// Fails with [`CoherenceError::InvalidArgument`] unless `raw` is a JSON
    /// string.
    pub fn assert_raw(&self, raw: &Value, token: &Token) -> CoherenceResult<bool> {
        let dump = Dump::from_value(raw)?;
        self.dumps_equal(&dump, token)
    }

    /// Writes `dump` at `token`.
    pub fn commit_dump(&self, token: &Token, dump: &Dump) -> CoherenceResult<()> {
        self.store.set_item(token.as_str(), dump.as_str())?;
        *self
            .epochs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(token.clone())
            .or_insert(0) += 1;
        debug!("Committed {} bytes at {}", dump.as_str().len(), token);
        Ok(())
    }

    /// How many snapshots this context has committed at `token`.
    ///
    /// Members compare it with the epoch they last read at to notice that
    /// their owner was reloaded underneath them.
    pub(crate) fn epoch(&self, token: &Token) -> u64 {
        self.epochs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .copied()
            .unwrap_or(0)
    }

    /// Removes the snapshot at `token`, forcing every context to resync.
    pub fn invalidate(&self, token: &Token) -> CoherenceResult<()> {
        self.store.remove_item(token.as_str())?;
        debug!("Invalidated {}", token);
        Ok(())
    }

    // ── Wipe policy ──────────────────────────────────────────────

    /// Replaces the wipe condition.
    pub fn set_wipe_condition(&self, condition: impl Into<WipeCondition>) {
        let mut slot = self
            .wipe_condition
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = condition.into();
    }

    /// Removes every namespaced key and returns how many were removed.
    pub fn wipe(&self) -> CoherenceResult<usize> {
        let removed = wipe_namespace(self.store.as_ref(), &self.config)?;
        info!(
            "Wiped {} entries under {} ({:?} match)",
            removed,
            self.config.namespace_prefix(),
            self.config.marker_match
        );
        Ok(removed)
    }

    /// Evaluates the wipe condition and wipes if it holds.
    ///
    /// Returns the number of removed keys when a wipe ran.
    pub fn poll_wipe(&self) -> CoherenceResult<Option<usize>> {
        let condition = self
            .wipe_condition
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if condition.evaluate() {
            self.wipe().map(Some)
        } else {
            Ok(None)
        }
    }

    // ── Owners ───────────────────────────────────────────────────

    /// Registers `owner` under `id` so members tagged `MemberOf(id)` can
    /// resolve through it.
    ///
    /// Only a weak reference is kept; dropping the owner unregisters it in
    /// effect. Callers must not hold the owner's lock while a member of it
    /// is resolved or guarded.
    pub fn register_owner<U>(&self, id: OwnerId, owner: &Arc<Mutex<U>>)
    where
        U: CoherencyUnit + 'static,
    {
        let owner: Arc<Mutex<dyn CoherencyUnit>> = owner.clone();
        let slot: OwnerSlot = Arc::downgrade(&owner);
        self.owners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, slot);
    }

    /// Forgets the owner registered under `id`.
    pub fn unregister_owner(&self, id: &OwnerId) {
        self.owners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Looks up a live owner.
    pub(crate) fn owner(&self, id: &OwnerId) -> CoherenceResult<Arc<Mutex<dyn CoherencyUnit>>> {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        let slot = owners
            .get(id)
            .ok_or_else(|| CoherenceError::TokenResolution(format!("owner {id} is not registered")))?;
        slot.upgrade()
            .ok_or_else(|| CoherenceError::TokenResolution(format!("owner {id} has been dropped")))
    }
}
