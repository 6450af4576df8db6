//! Playback speed arithmetic.
//!
//! Every speed that reaches a media element or the settings store passes
//! through [`Speed::new`], which clamps into `MIN_SPEED..=MAX_SPEED`.
//! Deserialization goes through the same constructor, so an out-of-range
//! value written by an older build is clamped on read.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Slowest playback rate the extension will apply.
pub const MIN_SPEED: f64 = 0.25;
/// Fastest playback rate the extension will apply.
pub const MAX_SPEED: f64 = 10.0;
/// Rate used when nothing else is known.
pub const DEFAULT_SPEED: f64 = 1.0;
/// Increment used by the increase/decrease keyboard commands.
pub const COMMAND_STEP: f64 = 0.25;
/// Increment used by the popup arrow keys.
pub const POPUP_STEP: f64 = 0.1;

/// A playback rate clamped to `[MIN_SPEED, MAX_SPEED]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Speed(f64);

impl Speed {
    /// Normal playback.
    pub const DEFAULT: Self = Self(DEFAULT_SPEED);
    /// Lower bound.
    pub const MIN: Self = Self(MIN_SPEED);
    /// Upper bound.
    pub const MAX: Self = Self(MAX_SPEED);

    /// Clamp a raw rate into range. `NaN` maps to [`Speed::DEFAULT`].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::DEFAULT;
        }
        Self(value.clamp(MIN_SPEED, MAX_SPEED))
    }

    /// The raw rate.
    pub fn value(self) -> f64 {
        self.0
    }

    /// One command step faster, capped at [`MAX_SPEED`].
    #[must_use]
    pub fn increased(self) -> Self {
        Self::new((self.0 + COMMAND_STEP).min(MAX_SPEED))
    }

    /// One command step slower, floored at [`MIN_SPEED`].
    #[must_use]
    pub fn decreased(self) -> Self {
        Self::new((self.0 - COMMAND_STEP).max(MIN_SPEED))
    }

    /// Shift by an arbitrary delta and clamp.
    #[must_use]
    pub fn offset(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }

    /// Two-decimal readout without the suffix (`"1.50"`).
    pub fn readout(self) -> String {
        format!("{:.2}", self.0)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_speed(self.0))
    }
}

impl From<f64> for Speed {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Speed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::new)
    }
}

/// Format a rate the way the overlay and popup label show it (`"2.50×"`).
///
/// Takes a raw `f64` because the overlay also echoes rates the user set
/// through the page's own controls, which are not clamped.
pub fn format_speed(rate: f64) -> String {
    format!("{rate:.2}×")
}
