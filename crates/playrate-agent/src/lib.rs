//! # playrate-agent
//!
//! The page agent: one instance per page, injected on load or on demand.
//!
//! - **Protocol endpoint**: [`PageAgent::handle`] answers `getCurrentSpeed`,
//!   `setSpeed` and `toggleOverlay`
//! - **Auto-apply**: on start and whenever media is added, the resolved
//!   per-site or global speed is applied to every media element
//! - **Overlay**: [`Overlay`] renders `"1.50×"` and fades after inactivity
//! - **Manual-change detection**: [`RateWatcher`] polls each element and
//!   ignores changes inside the extension-controlled window
//!
//! The page itself is reached through the [`MediaHost`], [`MediaElement`] and
//! [`OverlaySurface`] traits.

#![deny(unsafe_code)]

pub mod agent;
pub mod controlled;
pub mod errors;
pub mod overlay;
pub mod page;
pub mod watcher;

#[cfg(test)]
mod test_support;

pub use agent::PageAgent;
pub use controlled::ControlledMarks;
pub use errors::MediaError;
pub use overlay::Overlay;
pub use page::{MediaElement, MediaHost, MediaId, MediaMutation, OverlaySurface};
pub use watcher::RateWatcher;
