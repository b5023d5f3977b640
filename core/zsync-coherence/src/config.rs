//! Coherency layer configuration.

use serde::{Deserialize, Serialize};

/// Namespace marker prepended to every store key this layer owns.
pub const DEFAULT_NAMESPACE: &str = "_z";

/// Path separator used by resource locators.
pub const DEFAULT_SEPARATOR: char = '/';

/// How `wipe` decides that a store key belongs to the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// The key starts with marker + separator.
    #[default]
    Prefix,
    /// The key contains marker + separator anywhere. Also removes foreign
    /// keys that happen to embed the marker text.
    Substring,
}

impl MarkerMatch {
    /// Whether `key` falls inside the namespace identified by `prefix`.
    pub fn matches(self, key: &str, prefix: &str) -> bool {
        match self {
            Self::Prefix => key.starts_with(prefix),
            Self::Substring => key.contains(prefix),
        }
    }
}

/// What a commit does with the store after a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Write the entity's snapshot at its token after every call. A member
    /// writes its own snapshot at its owner's token.
    #[default]
    Snapshot,
    /// Remove the entry after a member's write or any delete, so every
    /// context refetches on its next guarded read. A member's read leaves
    /// the store alone. Other calls write a snapshot as usual.
    Invalidate,
}

/// Configuration for a coherency layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherencyConfig {
    /// Namespace marker for store keys.
    pub namespace: String,
    /// Separator inserted between the marker and a relative locator.
    pub separator: char,
    /// Key matching used by namespace wipes.
    pub marker_match: MarkerMatch,
    /// Evaluate the wipe condition on every token resolution.
    pub poll_wipe_on_resolve: bool,
    /// Commit local state to the store even when the transport failed.
    pub commit_on_transport_failure: bool,
    /// Whether member writes and deletes write a snapshot or evict.
    pub commit_mode: CommitMode,
}

impl CoherencyConfig {
    /// Marker plus separator: the prefix every owned key starts with.
    pub fn namespace_prefix(&self) -> String {
        format!("{}{}", self.namespace, self.separator)
    }
}

impl Default for CoherencyConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            separator: DEFAULT_SEPARATOR,
            marker_match: MarkerMatch::Prefix,
            poll_wipe_on_resolve: false,
            commit_on_transport_failure: true,
            commit_mode: CommitMode::Snapshot,
        }
    }
}
