//! # playrate-control
//!
//! The privileged side of playrate: everything that talks *to* page agents.
//!
//! - **Delivery**: [`Delivery`] sends protocol requests to a tab, injecting
//!   the agent and retrying exactly once when nobody answers
//! - **Command dispatcher**: [`CommandDispatcher`] turns the named keyboard
//!   commands into speed changes for the active tab
//! - **Control surface**: [`ControlSurface`] backs the popup (slider, arrow
//!   keys, settings toggles)
//!
//! Browser capabilities are reached through the [`TabResolver`],
//! [`TabMessenger`] and [`ScriptInjector`] traits.

#![deny(unsafe_code)]

pub mod delivery;
pub mod dispatcher;
pub mod errors;
pub mod popup;
pub mod tabs;

#[cfg(test)]
mod test_support;

pub use delivery::Delivery;
pub use dispatcher::{CommandDispatcher, Outcome};
pub use errors::{DispatchError, Result, TransportError};
pub use popup::{ControlSurface, PopupKey, SpeedDisplay};
pub use tabs::{CommandFeed, Readiness, ScriptInjector, TabId, TabInfo, TabMessenger, TabResolver};
