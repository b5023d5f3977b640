//! Store maintenance commands behind the `zsync` binary.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use zsync_coherence::{CoherencyConfig, CoherencyLayer, MarkerMatch};
use zsync_store::{SharedStore, SqliteStore};
use zsync_types::{ClientId, Token};

/// A layer over the SQLite store at `path`.
pub fn open_layer(path: &Path, config: CoherencyConfig) -> Result<CoherencyLayer> {
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    Ok(CoherencyLayer::new(Arc::new(store), config))
}

/// Keys inside the layer's namespace, in store order.
pub fn namespaced_keys(layer: &CoherencyLayer) -> Result<Vec<String>> {
    let prefix = layer.config().namespace_prefix();
    let marker_match = layer.config().marker_match;
    let keys = layer.store().keys().context("failed to list keys")?;
    Ok(keys
        .into_iter()
        .filter(|key| marker_match.matches(key, &prefix))
        .collect())
}

/// The snapshot at `key`, pretty-printed when it parses as JSON.
pub fn show_entry(layer: &CoherencyLayer, key: &str) -> Result<Option<String>> {
    let Some(raw) = layer
        .store()
        .get_item(key)
        .with_context(|| format!("failed to read {key}"))?
    else {
        return Ok(None);
    };
    Ok(Some(match serde_json::from_str::<Value>(&raw) {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(_) => raw,
    }))
}

/// The token a standalone entity at `locator` would resolve to.
pub fn token_for(layer: &CoherencyLayer, locator: &str, client_id: Option<&str>) -> Result<Token> {
    if locator.is_empty() {
        anyhow::bail!("locator must not be empty");
    }
    let client_id = client_id.map(ClientId::from_string);
    Ok(layer.address_for(locator, client_id.as_ref()))
}

/// Wipes the namespace, returning how many keys went.
pub fn wipe(path: &Path, mut config: CoherencyConfig, substring: bool) -> Result<usize> {
    if substring {
        config.marker_match = MarkerMatch::Substring;
    }
    let layer = open_layer(path, config)?;
    layer.wipe().context("wipe failed")
}
