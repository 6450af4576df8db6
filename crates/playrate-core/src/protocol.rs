//! Wire messages exchanged with a page agent.
//!
//! Requests are `action`-tagged JSON objects:
//!
//! ```json
//! {"action": "getCurrentSpeed"}
//! {"action": "setSpeed", "speed": 1.5}
//! {"action": "toggleOverlay", "show": true}
//! ```
//!
//! Responses carry no tag; each request kind has exactly one response shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::speed::Speed;

/// A message addressed to a page agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AgentRequest {
    /// Report the rate of the page's media.
    GetCurrentSpeed,
    /// Apply a rate to every media element on the page.
    SetSpeed {
        /// Requested rate, clamped on decode.
        speed: Speed,
    },
    /// Enable or disable the overlay. `None` flips the current state.
    ToggleOverlay {
        /// Desired visibility.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        show: Option<bool>,
    },
}

impl AgentRequest {
    /// The `action` tag, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetCurrentSpeed => "getCurrentSpeed",
            Self::SetSpeed { .. } => "setSpeed",
            Self::ToggleOverlay { .. } => "toggleOverlay",
        }
    }
}

/// Reply to `getCurrentSpeed`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedReport {
    /// Raw media rate (not clamped; the page may have set anything).
    pub speed: f64,
}

/// Reply to `setSpeed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSpeedAck {
    /// The handler ran.
    pub success: bool,
    /// At least one media element took the rate.
    pub applied: bool,
}

/// Reply to `toggleOverlay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayAck {
    /// The handler ran.
    pub success: bool,
}

/// Any agent reply. Variant order matters for untagged decoding: the most
/// specific shape is tried first.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentResponse {
    /// `{speed}`
    Speed(SpeedReport),
    /// `{success, applied}`
    SetSpeed(SetSpeedAck),
    /// `{success}`
    Overlay(OverlayAck),
}

impl AgentResponse {
    /// The reported speed, if this is a `getCurrentSpeed` reply.
    pub fn speed(&self) -> Option<f64> {
        match self {
            Self::Speed(report) => Some(report.speed),
            _ => None,
        }
    }

    /// Whether the agent reported success. Speed reports always count.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Speed(_) => true,
            Self::SetSpeed(ack) => ack.success,
            Self::Overlay(ack) => ack.success,
        }
    }
}

/// Errors decoding or interpreting protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The JSON did not match any known message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The agent answered with a shape that does not fit the request.
    #[error("unexpected response to {action}")]
    UnexpectedResponse {
        /// The request's action tag.
        action: &'static str,
    },
}

/// Decode a request from its JSON form.
pub fn decode_request(message: &Value) -> Result<AgentRequest, ProtocolError> {
    Ok(AgentRequest::deserialize(message)?)
}

/// Decode a response from its JSON form.
pub fn decode_response(message: &Value) -> Result<AgentResponse, ProtocolError> {
    Ok(AgentResponse::deserialize(message)?)
}
