//! Identifier types used to address entities.
//!
//! Client ids use UUID v7 when generated locally so that ids minted in
//! different contexts never collide; hosts may also supply their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-side identifier of an entity that may not have a server id yet.
///
/// Used to keep unsaved entities sharing a base locator apart in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new, time-ordered client ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Wraps a host-provided client ID (e.g. `"c1"`).
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an owner (a collection) in a coherency layer's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new owner ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an owner ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an owner ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an entity relates to a coherency unit.
///
/// A member has no snapshot of its own: staleness is judged against its
/// owner's persisted snapshot, and its token is the owner's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum Membership {
    /// The entity is its own coherency unit.
    #[default]
    Standalone,
    /// The entity belongs to the owner with the given id.
    MemberOf(OwnerId),
}

impl Membership {
    /// Returns the owner id, if any.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        match self {
            Self::Standalone => None,
            Self::MemberOf(id) => Some(*id),
        }
    }

    /// Whether the entity is its own coherency unit.
    #[must_use]
    pub fn is_standalone(&self) -> bool {
        matches!(self, Self::Standalone)
    }
}
