//! The user settings record and the speed-resolution snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::speed::Speed;

/// User-facing toggles, stored under the `settings` key.
///
/// Fields missing from a stored record fall back to their defaults
/// individually, so `{"showOverlay": false}` keeps per-site mode and
/// auto-apply on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Remember speeds per domain instead of one global value.
    pub per_site_speed: bool,
    /// Show the on-page speed indicator.
    pub show_overlay: bool,
    /// Apply the remembered speed when a page or new media loads.
    pub auto_apply: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            per_site_speed: true,
            show_overlay: true,
            auto_apply: true,
        }
    }
}

impl Settings {
    /// Which key a newly committed speed for `domain` belongs under.
    pub fn speed_target(&self, domain: Option<&str>) -> SpeedTarget {
        match domain {
            Some(d) if self.per_site_speed && !d.is_empty() => {
                SpeedTarget::Site(d.to_ascii_lowercase())
            }
            _ => SpeedTarget::Global,
        }
    }
}

/// Where a committed speed is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeedTarget {
    /// `perSiteSpeeds[domain]`.
    Site(String),
    /// `videoSpeed`.
    Global,
}

/// Everything speed resolution depends on, loaded once per operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpeedConfig {
    /// The settings record.
    pub settings: Settings,
    /// `videoSpeed`, if ever stored.
    pub global_speed: Option<Speed>,
    /// `perSiteSpeeds`, keyed by lower-case host.
    pub per_site_speeds: BTreeMap<String, Speed>,
}

impl SpeedConfig {
    /// The global speed, or [`Speed::DEFAULT`] when none was stored.
    pub fn global(&self) -> Speed {
        self.global_speed.unwrap_or_default()
    }

    /// The stored per-site speed for `domain`, ignoring the per-site toggle.
    pub fn site_speed(&self, domain: &str) -> Option<Speed> {
        self.per_site_speeds
            .get(&domain.to_ascii_lowercase())
            .copied()
    }

    /// Effective speed for a page on `domain`.
    ///
    /// With per-site mode on and an entry for the domain, the entry wins.
    /// Otherwise the global speed applies.
    pub fn resolve(&self, domain: Option<&str>) -> Speed {
        if self.settings.per_site_speed {
            if let Some(speed) = domain.and_then(|d| self.site_speed(d)) {
                return speed;
            }
        }
        self.global()
    }
}
