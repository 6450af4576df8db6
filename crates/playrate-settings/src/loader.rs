//! Runtime configuration loading with deep merge and environment overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RuntimeConfig::default()`]
//! 2. If `~/.playrate/config.json` exists, deep-merge user values over defaults
//! 3. Apply `PLAYRATE_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::errors::SettingsError;

/// Resolve the path to the config file (`~/.playrate/config.json`).
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".playrate").join("config.json")
}

/// Load the runtime config from the default path with env var overrides.
pub fn load_config() -> Result<RuntimeConfig, SettingsError> {
    load_config_from_path(&config_path())
}

/// Load the runtime config from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_config_from_path(path: &Path) -> Result<RuntimeConfig, SettingsError> {
    let defaults = serde_json::to_value(RuntimeConfig::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading config from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "config file not found, using defaults");
        defaults
    };

    let mut config: RuntimeConfig = serde_json::from_value(merged)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to a loaded config.
///
/// Durations must parse as integers inside their range; invalid values are
/// ignored with a warning.
pub fn apply_env_overrides(config: &mut RuntimeConfig) {
    if let Some(v) = read_env_level("PLAYRATE_LOG_LEVEL") {
        config.log_level = v;
    }

    let timing = &mut config.timing;
    if let Some(v) = read_env_u64("PLAYRATE_OVERLAY_HIDE_MS", 100, 60_000) {
        timing.overlay_hide_ms = v;
    }
    if let Some(v) = read_env_u64("PLAYRATE_CONTROL_WINDOW_MS", 0, 10_000) {
        timing.control_window_ms = v;
    }
    if let Some(v) = read_env_u64("PLAYRATE_POLL_INTERVAL_MS", 10, 10_000) {
        timing.poll_interval_ms = v;
    }
    if let Some(v) = read_env_u64("PLAYRATE_RESCAN_INTERVAL_MS", 100, 60_000) {
        timing.rescan_interval_ms = v;
    }
    if let Some(v) = read_env_u64("PLAYRATE_INJECTION_SETTLE_MS", 0, 10_000) {
        timing.injection_settle_ms = v;
    }
    if let Some(v) = read_env_u64("PLAYRATE_READY_TIMEOUT_MS", 10, 60_000) {
        timing.ready_timeout_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a tracing level name (case-insensitive).
pub fn parse_level(val: &str) -> Option<String> {
    let lower = val.trim().to_lowercase();
    matches!(
        lower.as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
    .then_some(lower)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_level(name: &str) -> Option<String> {
    let val = std::env::var(name).ok().filter(|v| !v.is_empty())?;
    let result = parse_level(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid log level env var, ignoring");
    }
    result
}
