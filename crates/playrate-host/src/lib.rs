//! # playrate-host
//!
//! An in-process browser that runs playrate end to end.
//!
//! - **Pages**: [`Document`] with [`MediaNode`]s and an [`OverlayNode`]
//! - **Browser**: [`Browser`] owns tabs, runs one page agent per scriptable
//!   page and implements the tab resolver, messenger and injector traits
//! - **Commands**: [`CommandRegistry`] delivers keyboard shortcuts
//! - **Extension**: [`Extension`] wires the store, dispatcher and popup

#![deny(unsafe_code)]

pub mod browser;
pub mod commands;
pub mod document;
pub mod extension;

pub use browser::{Browser, Tab, is_scriptable};
pub use commands::CommandRegistry;
pub use document::{Document, MAX_NATIVE_RATE, MIN_NATIVE_RATE, MediaKind, MediaNode, OverlayNode};
pub use extension::{Extension, storage_path};
