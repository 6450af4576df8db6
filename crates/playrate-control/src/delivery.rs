//! Message delivery to page agents with on-demand injection.
//!
//! A failed send means no agent is listening in the tab. The agent is then
//! injected once, the caller waits for its readiness signal (bounded by
//! `readyTimeoutMs`, or a fixed settle delay when the injector cannot signal)
//! and the send is retried exactly once.

use std::sync::Arc;

use playrate_core::{AgentRequest, AgentResponse};
use playrate_settings::TimingConfig;
use tokio::time;
use tracing::{debug, instrument, warn};

use crate::errors::{DispatchError, Result, TransportError};
use crate::tabs::{Readiness, ScriptInjector, TabId, TabMessenger};

/// Sends requests to page agents, injecting them when absent.
pub struct Delivery {
    messenger: Arc<dyn TabMessenger>,
    injector: Arc<dyn ScriptInjector>,
    timing: TimingConfig,
}

impl Delivery {
    /// Combine a messenger and an injector.
    pub fn new(
        messenger: Arc<dyn TabMessenger>,
        injector: Arc<dyn ScriptInjector>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            messenger,
            injector,
            timing,
        }
    }

    /// One delivery attempt, no injection.
    pub async fn send(
        &self,
        tab: TabId,
        request: &AgentRequest,
    ) -> std::result::Result<AgentResponse, TransportError> {
        self.messenger.send(tab, request).await
    }

    /// Ask the agent for its media rate. `None` when unreachable or when the
    /// reply carries no usable speed.
    pub async fn query_speed(&self, tab: TabId) -> Option<f64> {
        match self.send(tab, &AgentRequest::GetCurrentSpeed).await {
            Ok(response) => response.speed().filter(|s| s.is_finite() && *s > 0.0),
            Err(error) => {
                debug!(tab, %error, "no live speed from page agent");
                None
            }
        }
    }

    /// Deliver `request`, injecting the agent and retrying once on failure.
    #[instrument(skip(self, request), fields(action = request.action()))]
    pub async fn send_with_injection(
        &self,
        tab: TabId,
        request: &AgentRequest,
    ) -> Result<AgentResponse> {
        match self.send(tab, request).await {
            Ok(response) => return Ok(response),
            Err(error) => debug!(%error, "page agent unreachable, injecting"),
        }
        self.inject_and_wait(tab).await?;
        self.send(tab, request)
            .await
            .map_err(|source| DispatchError::DeliveryFailed { tab, source })
    }

    /// Inject the agent into `tab` and wait until it is ready or the wait
    /// bound passes.
    pub async fn inject_and_wait(&self, tab: TabId) -> Result<()> {
        let readiness = self
            .injector
            .inject(tab)
            .await
            .map_err(|source| DispatchError::InjectionFailed { tab, source })?;

        match readiness {
            Readiness::Signal(ready) => {
                match time::timeout(self.timing.ready_timeout(), ready).await {
                    Ok(Ok(())) => debug!(tab, "injected agent ready"),
                    Ok(Err(_)) => warn!(tab, "injected agent dropped its readiness signal"),
                    Err(_) => warn!(
                        tab,
                        timeout_ms = self.timing.ready_timeout_ms,
                        "timed out waiting for injected agent"
                    ),
                }
            }
            Readiness::Unsupported => {
                time::sleep(self.timing.injection_settle()).await;
            }
        }
        Ok(())
    }
}
