//! Runtime tunables shared by the agent and the control components.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Default tracing level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Timer settings.
    pub timing: TimingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            timing: TimingConfig::default(),
        }
    }
}

/// Timer settings, all in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingConfig {
    /// Overlay inactivity before it fades.
    pub overlay_hide_ms: u64,
    /// How long a programmatic rate set suppresses manual-change detection.
    pub control_window_ms: u64,
    /// Rate poll interval per watched media element.
    pub poll_interval_ms: u64,
    /// Interval of the agent's periodic media rescan.
    pub rescan_interval_ms: u64,
    /// Settle delay after an injection that cannot acknowledge readiness.
    pub injection_settle_ms: u64,
    /// Upper bound on waiting for an injected agent's readiness signal.
    pub ready_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            overlay_hide_ms: 1500,
            control_window_ms: 500,
            poll_interval_ms: 100,
            rescan_interval_ms: 1000,
            injection_settle_ms: 100,
            ready_timeout_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// See [`TimingConfig::overlay_hide_ms`].
    pub fn overlay_hide(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_ms)
    }

    /// See [`TimingConfig::control_window_ms`].
    pub fn control_window(&self) -> Duration {
        Duration::from_millis(self.control_window_ms)
    }

    /// See [`TimingConfig::poll_interval_ms`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// See [`TimingConfig::rescan_interval_ms`].
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }

    /// See [`TimingConfig::injection_settle_ms`].
    pub fn injection_settle(&self) -> Duration {
        Duration::from_millis(self.injection_settle_ms)
    }

    /// See [`TimingConfig::ready_timeout_ms`].
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
