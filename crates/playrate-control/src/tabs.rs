//! Browser capabilities used to reach page agents.

use async_trait::async_trait;
use playrate_core::{AgentRequest, AgentResponse, domain_of};
use tokio::sync::{mpsc, oneshot};

use crate::errors::TransportError;

/// Browser tab id.
pub type TabId = u32;

/// The parts of a tab the control side cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabInfo {
    /// Tab id.
    pub id: TabId,
    /// Current URL, when the browser exposes it.
    pub url: Option<String>,
}

impl TabInfo {
    /// Per-site settings key for this tab, if the URL has a host.
    pub fn domain(&self) -> Option<String> {
        self.url.as_deref().and_then(domain_of)
    }
}

/// Resolves the tab the user is looking at.
#[async_trait]
pub trait TabResolver: Send + Sync {
    /// The active tab of the focused window, if any.
    async fn active_tab(&self) -> Option<TabInfo>;
}

/// Request/response messaging with the agent in a tab.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    /// Deliver one request and wait for the reply.
    async fn send(&self, tab: TabId, request: &AgentRequest) -> Result<AgentResponse, TransportError>;
}

/// How an injected agent announces it has finished initializing.
#[derive(Debug)]
pub enum Readiness {
    /// Fires once the agent can answer messages.
    Signal(oneshot::Receiver<()>),
    /// The injector cannot report readiness; callers wait a settle delay.
    Unsupported,
}

/// Loads the page agent into an already open tab.
#[async_trait]
pub trait ScriptInjector: Send + Sync {
    /// Run the agent script in `tab`.
    async fn inject(&self, tab: TabId) -> Result<Readiness, TransportError>;
}

/// Named keyboard commands as delivered by the browser's command registry.
pub type CommandFeed = mpsc::UnboundedReceiver<String>;
