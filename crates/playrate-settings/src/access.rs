//! Typed reads and writes over a [`SettingsStore`].
//!
//! Readers never fail: a store error or a malformed value is logged and the
//! affected part falls back to its default. Writers return the store error so
//! callers can decide whether to log it.

use std::collections::BTreeMap;

use playrate_core::{Settings, Speed, SpeedConfig, SpeedTarget};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::errors::Result;
use crate::store::{PER_SITE_SPEEDS, SETTINGS, SettingsStore, VIDEO_SPEED, entry};

/// Load settings, global speed and per-site speeds in one read.
pub async fn load_speed_config(store: &dyn SettingsStore) -> SpeedConfig {
    let mut values = match store.get(&[SETTINGS, VIDEO_SPEED, PER_SITE_SPEEDS]).await {
        Ok(values) => values,
        Err(error) => {
            warn!(%error, "settings store read failed, using defaults");
            return SpeedConfig::default();
        }
    };
    SpeedConfig {
        settings: take_typed(&mut values, SETTINGS).unwrap_or_default(),
        global_speed: take_typed(&mut values, VIDEO_SPEED),
        per_site_speeds: take_site_map(&mut values)
            .map(decode_site_speeds)
            .unwrap_or_default(),
    }
}

/// Load the settings record alone.
pub async fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.get(&[SETTINGS]).await {
        Ok(mut values) => take_typed(&mut values, SETTINGS).unwrap_or_default(),
        Err(error) => {
            warn!(%error, "settings store read failed, using default settings");
            Settings::default()
        }
    }
}

/// The stored global speed, or [`Speed::DEFAULT`].
pub async fn load_global_speed(store: &dyn SettingsStore) -> Speed {
    match store.get(&[VIDEO_SPEED]).await {
        Ok(mut values) => take_typed(&mut values, VIDEO_SPEED).unwrap_or_default(),
        Err(error) => {
            warn!(%error, "settings store read failed, using default speed");
            Speed::DEFAULT
        }
    }
}

/// Replace the whole settings record.
pub async fn save_settings(store: &dyn SettingsStore, settings: &Settings) -> Result<()> {
    store
        .set(entry(SETTINGS, serde_json::to_value(settings)?))
        .await
}

/// Persist a committed speed under the key chosen by `settings`.
///
/// In per-site mode with a known domain this re-reads `perSiteSpeeds` and
/// writes the updated map back; otherwise it writes `videoSpeed`. Concurrent
/// committers race and the last write wins.
#[instrument(skip(store, settings), fields(speed = speed.value()))]
pub async fn commit_speed(
    store: &dyn SettingsStore,
    settings: &Settings,
    domain: Option<&str>,
    speed: Speed,
) -> Result<SpeedTarget> {
    let target = settings.speed_target(domain);
    match &target {
        SpeedTarget::Site(domain) => {
            let mut current = store.get(&[PER_SITE_SPEEDS]).await?;
            let mut sites = Map::new();
            for (site, stored) in take_site_map(&mut current).map(decode_site_speeds).unwrap_or_default() {
                let _ = sites.insert(site, serde_json::to_value(stored)?);
            }
            let _ = sites.insert(domain.clone(), serde_json::to_value(speed)?);
            store.set(entry(PER_SITE_SPEEDS, Value::Object(sites))).await?;
            debug!(domain = %domain, "committed per-site speed");
        }
        SpeedTarget::Global => {
            store.set(entry(VIDEO_SPEED, serde_json::to_value(speed)?)).await?;
            debug!("committed global speed");
        }
    }
    Ok(target)
}

/// The raw `perSiteSpeeds` object, if the stored value is one.
fn take_site_map(values: &mut Map<String, Value>) -> Option<Map<String, Value>> {
    match values.remove(PER_SITE_SPEEDS)? {
        Value::Object(sites) => Some(sites),
        other => {
            warn!(found = %other, "perSiteSpeeds is not an object, ignoring");
            None
        }
    }
}

/// Decode each entry on its own; malformed entries are dropped.
fn decode_site_speeds(sites: Map<String, Value>) -> BTreeMap<String, Speed> {
    sites
        .into_iter()
        .filter_map(|(domain, raw)| match serde_json::from_value::<Speed>(raw) {
            Ok(speed) => Some((domain.to_ascii_lowercase(), speed)),
            Err(error) => {
                warn!(domain = %domain, %error, "ignoring malformed per-site speed");
                None
            }
        })
        .collect()
}

fn take_typed<T: DeserializeOwned>(values: &mut Map<String, Value>, key: &str) -> Option<T> {
    let raw = values.remove(key)?;
    match serde_json::from_value(raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "ignoring malformed stored value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn per_site(enabled: bool) -> Settings {
        Settings {
            per_site_speed: enabled,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let config = load_speed_config(&store).await;
        assert_eq!(config, SpeedConfig::default());
        assert_eq!(config.resolve(Some("example.com")), Speed::DEFAULT);
    }

    #[tokio::test]
    async fn loads_all_three_keys() {
        let store = MemoryStore::new()
            .with(VIDEO_SPEED, json!(1.5))
            .with(PER_SITE_SPEEDS, json!({"example.com": 2.0}))
            .with(SETTINGS, json!({"perSiteSpeed": true, "showOverlay": false, "autoApply": true}));
        let config = load_speed_config(&store).await;
        assert_eq!(config.global_speed, Some(Speed::new(1.5)));
        assert_eq!(config.site_speed("example.com"), Some(Speed::new(2.0)));
        assert!(!config.settings.show_overlay);
    }

    #[tokio::test]
    async fn precedence_follows_per_site_toggle() {
        let store = MemoryStore::new()
            .with(VIDEO_SPEED, json!(1.5))
            .with(PER_SITE_SPEEDS, json!({"example.com": 2.0}))
            .with(SETTINGS, json!({"perSiteSpeed": true}));
        let config = load_speed_config(&store).await;
        assert_eq!(config.resolve(Some("example.com")), Speed::new(2.0));

        save_settings(&store, &per_site(false)).await.unwrap();
        let config = load_speed_config(&store).await;
        assert_eq!(config.resolve(Some("example.com")), Speed::new(1.5));
    }

    #[tokio::test]
    async fn stored_values_are_clamped_on_read() {
        let store = MemoryStore::new()
            .with(VIDEO_SPEED, json!(42.0))
            .with(PER_SITE_SPEEDS, json!({"Slow.Example": 0.01}));
        let config = load_speed_config(&store).await;
        assert_eq!(config.global(), Speed::MAX);
        assert_eq!(config.site_speed("slow.example"), Some(Speed::MIN));
    }

    #[tokio::test]
    async fn malformed_values_fall_back_individually() {
        let store = MemoryStore::new()
            .with(VIDEO_SPEED, json!("fast"))
            .with(PER_SITE_SPEEDS, json!({"example.com": 2.0}))
            .with(SETTINGS, json!([1, 2, 3]));
        let config = load_speed_config(&store).await;
        assert_eq!(config.global_speed, None);
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.site_speed("example.com"), Some(Speed::new(2.0)));
    }

    #[tokio::test]
    async fn bad_site_entry_keeps_the_others() {
        let store = MemoryStore::new()
            .with(VIDEO_SPEED, json!(1.5))
            .with(PER_SITE_SPEEDS, json!({"example.com": 2.0, "other.org": "fast", "nan.net": null}));
        let config = load_speed_config(&store).await;
        assert_eq!(config.site_speed("example.com"), Some(Speed::new(2.0)));
        assert_eq!(config.site_speed("other.org"), None);
        assert_eq!(config.resolve(Some("example.com")), Speed::new(2.0));
        assert_eq!(config.resolve(Some("other.org")), Speed::new(1.5));
    }

    #[tokio::test]
    async fn commit_drops_bad_site_entries() {
        let store = MemoryStore::new().with(PER_SITE_SPEEDS, json!({"a.com": 1.25, "b.com": "fast", "c.com": null}));
        let _ = commit_speed(&store, &per_site(true), Some("d.com"), Speed::new(2.0))
            .await
            .unwrap();
        assert_eq!(
            store.value(PER_SITE_SPEEDS),
            Some(json!({"a.com": 1.25, "d.com": 2.0}))
        );
    }

    #[tokio::test]
    async fn unavailable_store_reads_defaults() {
        let store = MemoryStore::new().with(VIDEO_SPEED, json!(3.0));
        store.set_unavailable(true);
        assert_eq!(load_speed_config(&store).await, SpeedConfig::default());
        assert_eq!(load_settings(&store).await, Settings::default());
        assert_eq!(load_global_speed(&store).await, Speed::DEFAULT);
    }

    #[tokio::test]
    async fn commit_per_site_keeps_other_domains() {
        let store = MemoryStore::new().with(PER_SITE_SPEEDS, json!({"a.com": 1.25}));
        let target = commit_speed(&store, &per_site(true), Some("B.com"), Speed::new(2.0))
            .await
            .unwrap();
        assert_eq!(target, SpeedTarget::Site("b.com".into()));
        assert_eq!(
            store.value(PER_SITE_SPEEDS),
            Some(json!({"a.com": 1.25, "b.com": 2.0}))
        );
        assert_eq!(store.value(VIDEO_SPEED), None);
    }

    #[tokio::test]
    async fn commit_global_when_per_site_disabled() {
        let store = MemoryStore::new();
        let target = commit_speed(&store, &per_site(false), Some("a.com"), Speed::new(1.75))
            .await
            .unwrap();
        assert_eq!(target, SpeedTarget::Global);
        assert_eq!(store.value(VIDEO_SPEED), Some(json!(1.75)));
        assert_eq!(store.value(PER_SITE_SPEEDS), None);
    }

    #[tokio::test]
    async fn commit_global_without_domain() {
        let store = MemoryStore::new();
        let target = commit_speed(&store, &per_site(true), None, Speed::new(0.5))
            .await
            .unwrap();
        assert_eq!(target, SpeedTarget::Global);
        assert_eq!(load_global_speed(&store).await, Speed::new(0.5));
    }

    #[tokio::test]
    async fn commit_replaces_non_object_site_map() {
        let store = MemoryStore::new().with(PER_SITE_SPEEDS, json!("garbage"));
        let _ = commit_speed(&store, &per_site(true), Some("a.com"), Speed::new(1.5))
            .await
            .unwrap();
        assert_eq!(store.value(PER_SITE_SPEEDS), Some(json!({"a.com": 1.5})));
    }

    #[tokio::test]
    async fn commit_propagates_store_failure() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(
            commit_speed(&store, &per_site(false), None, Speed::DEFAULT)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn save_settings_round_trips() {
        let store = MemoryStore::new();
        let settings = Settings {
            per_site_speed: false,
            show_overlay: false,
            auto_apply: true,
        };
        save_settings(&store, &settings).await.unwrap();
        assert_eq!(load_settings(&store).await, settings);
    }
}
