#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zsync_coherence::{BlockingHooks, CoherencyConfig, CoherencyLayer};
use zsync_store::{MemoryStore, SharedStore, StoreError, StoreResult};
use zsync_types::Token;

/// A layer over a clone of `store`, i.e. one more context sharing it.
pub fn context(store: &MemoryStore) -> Arc<CoherencyLayer> {
    context_with(store, CoherencyConfig::default())
}

pub fn context_with(store: &MemoryStore, config: CoherencyConfig) -> Arc<CoherencyLayer> {
    Arc::new(CoherencyLayer::new(Arc::new(store.clone()), config))
}

pub fn stored(store: &MemoryStore, key: &str) -> Option<String> {
    store.get_item(key).unwrap()
}

/// Records every hold/free pair.
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub holds: AtomicUsize,
    pub frees: AtomicUsize,
    pub tokens: Mutex<Vec<Token>>,
}

impl CountingHooks {
    pub fn holds(&self) -> usize {
        self.holds.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }
}

impl BlockingHooks for CountingHooks {
    fn hold(&self, token: &Token) {
        self.holds.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.clone());
    }

    fn free(&self, _token: &Token) {
        self.frees.fetch_add(1, Ordering::SeqCst);
    }
}

/// A store that is never reachable.
pub struct UnavailableStore;

impl SharedStore for UnavailableStore {
    fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn remove_item(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }
}
