mod common;

use common::{context, context_with, stored};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use zsync_coherence::mock::{MockCollection, MockModel, MockServer};
use zsync_coherence::{
    CoherenceError, CoherencyConfig, Coherent, CommitMode, Resource, SyncMethod, SyncOptions,
    TransportError, TransportResult,
};
use zsync_store::{MemoryStore, SharedStore, StoreError};

// ── Round trips ──────────────────────────────────────────────────

#[test]
fn create_commits_snapshot_at_token() {
    let server = MockServer::new();
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::new(&server, "/notes"), context(&store));
    note.entity_mut().set("title", "hello");

    let report = note.sync(SyncMethod::Create, SyncOptions::default()).unwrap();
    assert!(report.is_ok());
    assert!(report.committed);

    let token = note.token().unwrap();
    let dump = note.generate_dump().unwrap();
    assert_eq!(stored(&store, token.as_str()).as_deref(), Some(dump.as_str()));
    assert_eq!(dump.as_str(), r#"{"id":1,"title":"hello"}"#);
}

#[test]
fn update_commits_latest_state() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "title": "a"}));
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));
    note.fetch().unwrap();

    note.entity_mut().set("title", "b");
    note.sync(SyncMethod::Update, SyncOptions::default()).unwrap();

    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(r#"{"id":1,"title":"b"}"#)
    );
    assert_eq!(server.get("/notes/1"), Some(json!({"id": 1, "title": "b"})));
}

#[test]
fn delete_commits_final_snapshot() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "title": "gone"}));
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));
    note.fetch().unwrap();

    let report = note.sync(SyncMethod::Delete, SyncOptions::default()).unwrap();
    assert!(report.committed);
    assert_eq!(server.get("/notes/1"), None);
    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(note.generate_dump().unwrap().as_str())
    );
}

#[test]
fn delete_removes_entry_in_invalidate_mode() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1}));
    let store = MemoryStore::new();
    let config = CoherencyConfig {
        commit_mode: CommitMode::Invalidate,
        ..Default::default()
    };
    let mut note = Coherent::new(
        MockModel::existing(&server, "/notes", 1),
        context_with(&store, config),
    );
    note.fetch().unwrap();
    assert!(stored(&store, "_z/notes/1").is_some());

    let report = note.sync(SyncMethod::Delete, SyncOptions::default()).unwrap();
    assert!(report.committed);
    assert_eq!(stored(&store, "_z/notes/1"), None);
    assert_eq!(server.get("/notes/1"), None);
}

#[test]
fn fetch_commits_read_state() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "body": {"b": 2, "a": 1}}));
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));

    let report = note.fetch().unwrap();
    assert_eq!(report.method, SyncMethod::Read);
    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(r#"{"body":{"a":1,"b":2},"id":1}"#)
    );
}

// ── Transport failures ───────────────────────────────────────────

#[test]
fn failed_update_still_commits_local_state() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "title": "a"}));
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));
    note.fetch().unwrap();

    server.set_failing(true);
    note.entity_mut().set("title", "offline edit");
    let report = note.sync(SyncMethod::Update, SyncOptions::default()).unwrap();

    assert!(matches!(report.transport_error, Some(TransportError::Network(_))));
    assert!(report.committed);
    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(r#"{"id":1,"title":"offline edit"}"#)
    );
    // The server never saw the edit.
    assert_eq!(server.get("/notes/1"), Some(json!({"id": 1, "title": "a"})));
}

#[test]
fn failed_delete_keeps_local_snapshot() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "title": "a"}));
    let store = MemoryStore::new();
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));
    note.fetch().unwrap();

    server.set_failing(true);
    let report = note.sync(SyncMethod::Delete, SyncOptions::default()).unwrap();

    assert!(matches!(report.transport_error, Some(TransportError::Network(_))));
    assert!(report.committed);
    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(r#"{"id":1,"title":"a"}"#)
    );
    assert!(server.get("/notes/1").is_some());
}

#[test]
fn failed_update_skips_commit_when_configured() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "title": "a"}));
    let store = MemoryStore::new();
    let config = CoherencyConfig {
        commit_on_transport_failure: false,
        ..Default::default()
    };
    let mut note = Coherent::new(
        MockModel::existing(&server, "/notes", 1),
        context_with(&store, config),
    );
    note.fetch().unwrap();

    server.set_failing(true);
    note.entity_mut().set("title", "offline edit");
    let report = note.sync(SyncMethod::Update, SyncOptions::default()).unwrap();

    assert!(!report.is_ok());
    assert!(!report.committed);
    assert_eq!(
        stored(&store, "_z/notes/1").as_deref(),
        Some(r#"{"id":1,"title":"a"}"#)
    );
}

#[test]
fn rejected_collection_write_is_reported() {
    let server = MockServer::new();
    let store = MemoryStore::new();
    let mut items = Coherent::new(MockCollection::new(&server, "/items"), context(&store));

    let report = items.sync(SyncMethod::Create, SyncOptions::default()).unwrap();
    assert!(matches!(
        report.transport_error,
        Some(TransportError::Status { status: 405, .. })
    ));
}

// ── Store failures ───────────────────────────────────────────────

#[test]
fn quota_exceeded_propagates() {
    let server = MockServer::new();
    server.put("/notes/1", json!({"id": 1, "body": "x".repeat(64)}));
    let store = MemoryStore::with_quota(32);
    let mut note = Coherent::new(MockModel::existing(&server, "/notes", 1), context(&store));

    match note.fetch() {
        Err(CoherenceError::Store(StoreError::QuotaExceeded { key, limit, .. })) => {
            assert_eq!(key, "_z/notes/1");
            assert_eq!(limit, 32);
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
}

// ── Ordering ─────────────────────────────────────────────────────

/// Records what the store held at `key` while its transport call ran.
struct Probe {
    store: MemoryStore,
    value: Value,
    seen_during_transport: Vec<Option<String>>,
}

impl Resource for Probe {
    fn export(&self) -> Value {
        self.value.clone()
    }

    fn locator(&self) -> Option<String> {
        Some("/probe".into())
    }

    fn sync(&mut self, _method: SyncMethod, _options: SyncOptions) -> TransportResult<()> {
        self.seen_during_transport
            .push(self.store.get_item("_z/probe").unwrap());
        self.value = json!({"version": self.seen_during_transport.len()});
        Ok(())
    }
}

#[test]
fn commit_runs_after_transport_completes() {
    let store = MemoryStore::new();
    let probe = Probe {
        store: store.clone(),
        value: json!({"version": 0}),
        seen_during_transport: Vec::new(),
    };
    let mut probe = Coherent::new(probe, context(&store));

    probe.sync(SyncMethod::Update, SyncOptions::default()).unwrap();
    probe.sync(SyncMethod::Update, SyncOptions::default()).unwrap();

    // Each transport call saw the previous commit, never its own.
    assert_eq!(
        probe.entity().seen_during_transport,
        vec![None, Some(r#"{"version":1}"#.to_string())]
    );
    assert_eq!(stored(&store, "_z/probe").as_deref(), Some(r#"{"version":2}"#));
}
