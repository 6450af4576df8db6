//! Named keyboard commands.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::speed::Speed;

/// A keyboard command registered with the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// `increase-speed`
    IncreaseSpeed,
    /// `decrease-speed`
    DecreaseSpeed,
    /// `reset-speed`
    ResetSpeed,
    /// `toggle-overlay`
    ToggleOverlay,
}

impl Command {
    /// Every command, in registration order.
    pub const ALL: [Self; 4] = [
        Self::IncreaseSpeed,
        Self::DecreaseSpeed,
        Self::ResetSpeed,
        Self::ToggleOverlay,
    ];

    /// Registered command name.
    pub fn name(self) -> &'static str {
        match self {
            Self::IncreaseSpeed => "increase-speed",
            Self::DecreaseSpeed => "decrease-speed",
            Self::ResetSpeed => "reset-speed",
            Self::ToggleOverlay => "toggle-overlay",
        }
    }

    /// The speed this command produces from `current`, or `None` for
    /// commands that do not change speed.
    pub fn next_speed(self, current: Speed) -> Option<Speed> {
        match self {
            Self::IncreaseSpeed => Some(current.increased()),
            Self::DecreaseSpeed => Some(current.decreased()),
            Self::ResetSpeed => Some(Speed::DEFAULT),
            Self::ToggleOverlay => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The command name is not one we register.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct ParseCommandError(pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ParseCommandError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_names() {
        for cmd in Command::ALL {
            assert_eq!(cmd.name().parse::<Command>().unwrap(), cmd);
        }
    }

    #[test]
    fn parse_unknown() {
        let err = "speed-up".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "unknown command: speed-up");
    }

    #[test]
    fn increase_at_9_9_is_ten() {
        let next = Command::IncreaseSpeed.next_speed(Speed::new(9.9)).unwrap();
        assert_eq!(next, Speed::MAX);
    }

    #[test]
    fn decrease_at_0_3_is_quarter() {
        let next = Command::DecreaseSpeed.next_speed(Speed::new(0.3)).unwrap();
        assert_eq!(next, Speed::MIN);
    }

    #[test]
    fn reset_always_one() {
        for start in [0.25, 1.0, 3.7, 10.0] {
            let next = Command::ResetSpeed.next_speed(Speed::new(start)).unwrap();
            assert_eq!(next, Speed::DEFAULT);
        }
    }

    #[test]
    fn toggle_has_no_speed() {
        assert!(Command::ToggleOverlay.next_speed(Speed::DEFAULT).is_none());
    }

    #[test]
    fn display_is_name() {
        assert_eq!(Command::ResetSpeed.to_string(), "reset-speed");
    }
}
