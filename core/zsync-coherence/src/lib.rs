//! Cross-context cache coherency over a shared store.
//!
//! Several execution contexts (webviews, processes, threads) each hold their
//! own in-memory copies of the same entities, while one shared string-keyed
//! store is the source of truth. This crate keeps those copies coherent:
//!
//! - **Addressing**: every coherency unit gets a stable, namespaced
//!   [`Token`](zsync_types::Token). Members resolve to their owner's token.
//! - **Staleness guard**: guarded reads compare the unit's canonical
//!   [`Dump`](zsync_types::Dump) against the store and block on a refetch
//!   when they differ ([`Coherent::ensure_fresh`]).
//! - **Commit-on-write**: every transport call made through
//!   [`Coherent::sync`] is followed by a store commit.
//! - **Wipe policy**: the whole namespace can be evicted on demand, or when a
//!   [`WipeCondition`] holds ([`CoherencyLayer::poll_wipe`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use zsync_coherence::mock::{MockCollection, MockServer};
//! use zsync_coherence::{CoherencyConfig, CoherencyLayer, Coherent, Freshness};
//! use zsync_store::MemoryStore;
//!
//! let server = MockServer::new();
//! server.put("/items/1", serde_json::json!({"id": 1}));
//!
//! let store = Arc::new(MemoryStore::new());
//! let layer = Arc::new(CoherencyLayer::new(store, CoherencyConfig::default()));
//! let mut items = Coherent::new(MockCollection::new(&server, "/items"), layer);
//!
//! assert_eq!(items.token().unwrap().as_str(), "_z/items");
//! assert_eq!(items.ensure_fresh().unwrap(), Freshness::Resynced);
//! assert_eq!(items.ensure_fresh().unwrap(), Freshness::Fresh);
//! ```

mod coherent;
mod commit;
mod config;
mod error;
mod guard;
mod hooks;
mod layer;
pub mod resource;
mod wipe;

pub use coherent::{CoherencyUnit, Coherent};
pub use commit::SyncReport;
pub use config::{CoherencyConfig, CommitMode, MarkerMatch, DEFAULT_NAMESPACE, DEFAULT_SEPARATOR};
pub use error::{CoherenceError, CoherenceResult, TransportError};
pub use guard::Freshness;
pub use hooks::{BlockingHooks, NoopHooks};
pub use layer::CoherencyLayer;
pub use resource::{mock, Collection, Resource, SyncMethod, SyncOptions, TransportResult};
pub use wipe::WipeCondition;
