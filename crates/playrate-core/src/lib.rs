//! # playrate-core
//!
//! Foundation types shared by every playrate component:
//!
//! - **Speeds**: [`Speed`], a playback rate clamped to `[0.25, 10.0]`
//! - **Settings**: the stored [`Settings`] record and the [`SpeedConfig`]
//!   snapshot used for per-site/global resolution
//! - **Protocol**: [`AgentRequest`] / [`AgentResponse`] exchanged with page agents
//! - **Commands**: the named keyboard [`Command`]s
//! - **Domains**: [`domain_of`] for per-site keys
//! - **Logging**: [`logging::init_subscriber`]

#![deny(unsafe_code)]

pub mod command;
pub mod domain;
pub mod logging;
pub mod protocol;
pub mod settings;
pub mod speed;

pub use command::{Command, ParseCommandError};
pub use domain::domain_of;
pub use protocol::{AgentRequest, AgentResponse, OverlayAck, ProtocolError, SetSpeedAck, SpeedReport};
pub use settings::{Settings, SpeedConfig, SpeedTarget};
pub use speed::{Speed, format_speed};
