//! The shared key-value settings store.
//!
//! A flat map from string keys to JSON values with async get/set. The store is
//! shared by every component and has no transactions: concurrent writers race
//! and the last write to a key wins.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::Result;

/// Global playback speed (`number`).
pub const VIDEO_SPEED: &str = "videoSpeed";
/// Per-domain speeds (`{ [domain]: number }`).
pub const PER_SITE_SPEEDS: &str = "perSiteSpeeds";
/// The settings record (`{ perSiteSpeed, showOverlay, autoApply }`).
pub const SETTINGS: &str = "settings";

/// A flat, asynchronous key-value store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch `keys`. Keys that were never written are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Write every entry, replacing existing values. Other keys are untouched.
    async fn set(&self, entries: Map<String, Value>) -> Result<()>;
}

/// Build a single-entry map for [`SettingsStore::set`].
pub fn entry(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    let _ = map.insert(key.to_owned(), value);
    map
}
