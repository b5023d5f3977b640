mod common;

use common::{context, context_with, stored};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use zsync_coherence::mock::{MockCollection, MockServer};
use zsync_coherence::{CoherencyConfig, CoherencyLayer, Coherent, MarkerMatch, WipeCondition};
use zsync_store::{MemoryStore, SharedStore};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    for key in ["_z/items", "_z/c1/notes", "other", "my_z/thing", "x_z"] {
        store.set_item(key, "v").unwrap();
    }
    store
}

fn remaining(store: &MemoryStore) -> Vec<String> {
    store.keys().unwrap()
}

// ── Explicit wipe ────────────────────────────────────────────────

#[test]
fn wipe_removes_only_namespaced_keys() {
    let store = seeded();
    let removed = context(&store).wipe().unwrap();

    assert_eq!(removed, 2);
    assert_eq!(remaining(&store), vec!["my_z/thing", "other", "x_z"]);
}

#[test]
fn substring_match_also_takes_embedded_markers() {
    let store = seeded();
    let config = CoherencyConfig {
        marker_match: MarkerMatch::Substring,
        ..Default::default()
    };
    let removed = context_with(&store, config).wipe().unwrap();

    assert_eq!(removed, 3);
    assert_eq!(remaining(&store), vec!["other", "x_z"]);
}

#[test]
fn custom_namespace_is_isolated() {
    let store = seeded();
    store.set_item("app/items", "v").unwrap();
    let config = CoherencyConfig {
        namespace: "app".into(),
        ..Default::default()
    };

    assert_eq!(context_with(&store, config).wipe().unwrap(), 1);
    assert_eq!(stored(&store, "app/items"), None);
    assert_eq!(stored(&store, "_z/items").as_deref(), Some("v"));
}

#[test]
fn wipe_on_empty_store_is_noop() {
    let store = MemoryStore::new();
    assert_eq!(context(&store).wipe().unwrap(), 0);
}

// ── Conditions ───────────────────────────────────────────────────

#[test]
fn poll_without_condition_does_nothing() {
    let store = seeded();
    assert_eq!(context(&store).poll_wipe().unwrap(), None);
    assert_eq!(store.len(), 5);
}

#[test]
fn poll_with_true_wipes() {
    let store = seeded();
    let layer = context(&store);
    layer.set_wipe_condition(true);

    assert_eq!(layer.poll_wipe().unwrap(), Some(2));
    assert_eq!(layer.poll_wipe().unwrap(), Some(0));
}

#[test]
fn predicate_is_evaluated_on_every_poll() {
    let store = seeded();
    let calls = Arc::new(AtomicUsize::new(0));
    let armed = Arc::new(AtomicBool::new(false));
    let layer = context(&store);
    {
        let calls = Arc::clone(&calls);
        let armed = Arc::clone(&armed);
        layer.set_wipe_condition(WipeCondition::when(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            armed.load(Ordering::SeqCst)
        }));
    }

    assert_eq!(layer.poll_wipe().unwrap(), None);
    armed.store(true, Ordering::SeqCst);
    assert_eq!(layer.poll_wipe().unwrap(), Some(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn condition_can_be_set_at_construction() {
    let store = seeded();
    let layer = CoherencyLayer::new(Arc::new(store.clone()), CoherencyConfig::default())
        .with_wipe_condition(WipeCondition::Always);

    assert_eq!(layer.poll_wipe().unwrap(), Some(2));
}

#[test]
fn condition_from_bool_and_debug() {
    assert!(matches!(WipeCondition::from(false), WipeCondition::Never));
    assert!(matches!(WipeCondition::from(true), WipeCondition::Always));
    assert_eq!(format!("{:?}", WipeCondition::when(|| true)), "When(..)");
    assert!(!WipeCondition::default().evaluate());
}

// ── Resolve-time polling ─────────────────────────────────────────

#[test]
fn resolve_polls_when_enabled() {
    let store = seeded();
    let server = MockServer::new();
    let config = CoherencyConfig {
        poll_wipe_on_resolve: true,
        ..Default::default()
    };
    let layer = context_with(&store, config);
    layer.set_wipe_condition(true);

    let items = Coherent::new(MockCollection::new(&server, "/items"), layer);
    assert_eq!(items.token().unwrap().as_str(), "_z/items");
    assert_eq!(remaining(&store), vec!["my_z/thing", "other", "x_z"]);
}

#[test]
fn resolve_leaves_store_alone_by_default() {
    let store = seeded();
    let server = MockServer::new();
    let layer = context(&store);
    layer.set_wipe_condition(true);

    let items = Coherent::new(MockCollection::new(&server, "/items"), layer);
    items.token().unwrap();
    assert_eq!(store.len(), 5);
}

#[test]
fn resolve_time_wipe_forces_a_resync() {
    let store = MemoryStore::new();
    let server = MockServer::new();
    server.put("/items/1", json!({"id": 1}));
    let config = CoherencyConfig {
        poll_wipe_on_resolve: true,
        ..Default::default()
    };
    let layer = context_with(&store, config);
    let mut items = Coherent::new(MockCollection::new(&server, "/items"), layer.clone());
    items.fetch().unwrap();
    assert_eq!(items.entity().reads(), 1);

    layer.set_wipe_condition(true);
    assert!(items.ensure_fresh().unwrap().refetched());
    assert_eq!(items.entity().reads(), 2);
}
