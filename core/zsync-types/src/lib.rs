//! Core type definitions for zsync.
//!
//! This crate defines the small, store-agnostic vocabulary shared by the
//! store and coherency crates:
//! - [`Token`]: namespaced address of a coherency unit in the shared store
//! - [`Dump`]: canonical snapshot string of an entity's exported state
//! - [`ClientId`] / [`OwnerId`]: client-side and owner identifiers
//! - [`Membership`]: whether an entity is standalone or a member of an owner
//!
//! Canonical JSON helpers live in [`canonical`].

pub mod canonical;
mod ids;
mod snapshot;

pub use ids::{ClientId, Membership, OwnerId};
pub use snapshot::{Dump, Token};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid dump: expected a JSON string, got {0}")]
    InvalidDump(&'static str),
}
