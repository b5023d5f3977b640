//! Capabilities the coherency layer consumes from a host entity framework.
//!
//! A host entity (model or collection) exposes five things: an exported view,
//! a resource locator, an optional client id, its membership, and a transport
//! primitive. The layer never looks inside the entity beyond these.

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zsync_types::{ClientId, Membership};

/// Result type for host transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// The operation a transport call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMethod {
    Create,
    Read,
    Update,
    Delete,
}

impl SyncMethod {
    /// Whether the operation changes server state.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Options passed through to the host transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Complete the round trip before returning.
    pub blocking: bool,
    /// Do not emit change events while applying the response.
    pub silent: bool,
}

impl SyncOptions {
    /// Options used by the staleness guard's refetch.
    pub const REFETCH: Self = Self {
        blocking: true,
        silent: true,
    };
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            blocking: true,
            silent: false,
        }
    }
}

/// A host entity participating in cross-context coherency.
pub trait Resource: Send {
    /// The exported attribute view, as the host would render or send it.
    fn export(&self) -> Value;

    /// The resource locator (a static URL or one computed from state).
    /// `None` when the entity has no address.
    fn locator(&self) -> Option<String>;

    /// Client-side identifier, for entities that may not be saved yet.
    fn client_id(&self) -> Option<ClientId> {
        None
    }

    /// Whether the entity is its own coherency unit or belongs to an owner.
    fn membership(&self) -> Membership {
        Membership::Standalone
    }

    /// Runs a transport call and applies its response to the entity.
    ///
    /// With `options.blocking` the call must not return before the response
    /// has been applied.
    fn sync(&mut self, method: SyncMethod, options: SyncOptions) -> TransportResult<()>;
}

/// A resource whose state is a list of members.
pub trait Collection: Resource {
    type Member;

    /// The members as currently held in memory.
    fn members(&self) -> &[Self::Member];
}

/// In-memory host entities for tests and demos.
pub mod mock {
    use super::*;
    use serde_json::Map;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use zsync_types::OwnerId;

    /// A fake REST server shared by every context's entities.
    #[derive(Debug, Clone, Default)]
    pub struct MockServer {
        records: Arc<Mutex<BTreeMap<String, Value>>>,
        next_id: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    impl MockServer {
        /// Creates an empty server.
        pub fn new() -> Self {
            Self::default()
        }

        /// Stores a record at `path`.
        pub fn put(&self, path: impl Into<String>, record: Value) {
            self.records().insert(path.into(), record);
        }

        /// Returns the record at `path`.
        pub fn get(&self, path: &str) -> Option<Value> {
            self.records().get(path).cloned()
        }

        /// Removes the record at `path`.
        pub fn remove(&self, path: &str) -> Option<Value> {
            self.records().remove(path)
        }

        /// Records directly under `base` (`base/<id>`), in path order.
        pub fn list(&self, base: &str) -> Vec<Value> {
            let prefix = format!("{base}/");
            self.records()
                .iter()
                .filter(|(path, _)| {
                    path.strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
                })
                .map(|(_, record)| record.clone())
                .collect()
        }

        /// Makes every subsequent request fail (or succeed again).
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> TransportResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(TransportError::Network("connection refused".into()))
            } else {
                Ok(())
            }
        }

        fn allocate_id(&self) -> u64 {
            self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1
        }

        fn records(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
            self.records.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// A model: a JSON object addressed by `root/<id>` once saved.
    #[derive(Debug, Clone)]
    pub struct MockModel {
        server: MockServer,
        root: Option<String>,
        id: Option<u64>,
        client_id: Option<ClientId>,
        membership: Membership,
        attributes: Map<String, Value>,
        reads: usize,
    }

    impl MockModel {
        /// A new, unsaved model under `root`.
        pub fn new(server: &MockServer, root: impl Into<String>) -> Self {
            Self {
                server: server.clone(),
                root: Some(root.into()),
                id: None,
                client_id: None,
                membership: Membership::Standalone,
                attributes: Map::new(),
                reads: 0,
            }
        }

        /// A model with no locator at all.
        pub fn unaddressed(server: &MockServer) -> Self {
            Self {
                root: None,
                ..Self::new(server, "")
            }
        }

        /// A handle on the already-saved model `root/<id>`.
        pub fn existing(server: &MockServer, root: impl Into<String>, id: u64) -> Self {
            let mut model = Self::new(server, root);
            model.id = Some(id);
            model.attributes.insert("id".into(), Value::from(id));
            model
        }

        pub fn with_client_id(mut self, client_id: ClientId) -> Self {
            self.client_id = Some(client_id);
            self
        }

        pub fn member_of(mut self, owner: OwnerId) -> Self {
            self.membership = Membership::MemberOf(owner);
            self
        }

        /// Sets an attribute locally, without syncing.
        pub fn set(&mut self, key: &str, value: impl Into<Value>) {
            self.attributes.insert(key.to_string(), value.into());
        }

        pub fn get(&self, key: &str) -> Option<&Value> {
            self.attributes.get(key)
        }

        pub fn id(&self) -> Option<u64> {
            self.id
        }

        /// Number of completed or attempted read requests.
        pub fn reads(&self) -> usize {
            self.reads
        }

        fn path(&self) -> Option<String> {
            let root = self.root.as_ref()?;
            Some(match self.id {
                Some(id) => format!("{root}/{id}"),
                None => root.clone(),
            })
        }
    }

    impl Resource for MockModel {
        fn export(&self) -> Value {
            Value::Object(self.attributes.clone())
        }

        fn locator(&self) -> Option<String> {
            self.path()
        }

        fn client_id(&self) -> Option<ClientId> {
            self.client_id.clone()
        }

        fn membership(&self) -> Membership {
            self.membership
        }

        fn sync(&mut self, method: SyncMethod, _options: SyncOptions) -> TransportResult<()> {
            if method == SyncMethod::Read {
                self.reads += 1;
            }
            self.server.check()?;
            let path = self
                .path()
                .ok_or_else(|| TransportError::NotFound("model has no url".into()))?;

            match method {
                SyncMethod::Create => {
                    let id = self.server.allocate_id();
                    self.id = Some(id);
                    self.attributes.insert("id".into(), Value::from(id));
                    self.server
                        .put(format!("{path}/{id}"), Value::Object(self.attributes.clone()));
                }
                SyncMethod::Read => match self.server.get(&path) {
                    Some(Value::Object(record)) => self.attributes = record,
                    Some(_) | None => return Err(TransportError::NotFound(path)),
                },
                SyncMethod::Update => {
                    if self.id.is_none() {
                        return Err(TransportError::Status {
                            status: 400,
                            message: "cannot update an unsaved model".into(),
                        });
                    }
                    self.server.put(path, Value::Object(self.attributes.clone()));
                }
                SyncMethod::Delete => {
                    self.server
                        .remove(&path)
                        .ok_or(TransportError::NotFound(path))?;
                }
            }
            Ok(())
        }
    }

    /// A read-only collection listing every record under its url.
    #[derive(Debug, Clone)]
    pub struct MockCollection {
        server: MockServer,
        url: String,
        members: Vec<Value>,
        reads: usize,
    }

    impl MockCollection {
        pub fn new(server: &MockServer, url: impl Into<String>) -> Self {
            Self {
                server: server.clone(),
                url: url.into(),
                members: Vec::new(),
                reads: 0,
            }
        }

        /// Replaces the in-memory members, without syncing.
        pub fn reset(&mut self, members: Vec<Value>) {
            self.members = members;
        }

        /// Number of completed or attempted read requests.
        pub fn reads(&self) -> usize {
            self.reads
        }
    }

    impl Resource for MockCollection {
        fn export(&self) -> Value {
            Value::Array(self.members.clone())
        }

        fn locator(&self) -> Option<String> {
            Some(self.url.clone())
        }

        fn sync(&mut self, method: SyncMethod, _options: SyncOptions) -> TransportResult<()> {
            if method != SyncMethod::Read {
                return Err(TransportError::Status {
                    status: 405,
                    message: format!("{method:?} is not supported on a collection"),
                });
            }
            self.reads += 1;
            self.server.check()?;
            self.members = self.server.list(&self.url);
            Ok(())
        }
    }

    impl Collection for MockCollection {
        type Member = Value;

        fn members(&self) -> &[Value] {
            &self.members
        }
    }
}
