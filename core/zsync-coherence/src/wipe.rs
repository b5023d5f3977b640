//! Namespace-scoped bulk eviction.

use crate::config::CoherencyConfig;
use std::fmt;
use std::sync::Arc;
use zsync_store::{SharedStore, StoreResult};

/// When the namespace should be wiped.
#[derive(Clone, Default)]
pub enum WipeCondition {
    /// Never wipe on poll.
    #[default]
    Never,
    /// Wipe on every poll.
    Always,
    /// Wipe whenever the predicate returns true.
    When(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl WipeCondition {
    /// Wraps a predicate.
    pub fn when(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self::When(Arc::new(predicate))
    }

    /// Evaluates the condition.
    pub fn evaluate(&self) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::When(predicate) => predicate(),
        }
    }
}

impl From<bool> for WipeCondition {
    fn from(wipe: bool) -> Self {
        if wipe { Self::Always } else { Self::Never }
    }
}

impl fmt::Debug for WipeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Removes every key in the namespace and returns how many were removed.
pub(crate) fn wipe_namespace(store: &dyn SharedStore, config: &CoherencyConfig) -> StoreResult<usize> {
    let prefix = config.namespace_prefix();
    let mut removed = 0;
    for key in store.keys()? {
        if config.marker_match.matches(&key, &prefix) {
            store.remove_item(&key)?;
            removed += 1;
        }
    }
    Ok(removed)
}
