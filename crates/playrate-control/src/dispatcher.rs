//! Keyboard command handling.
//!
//! Speed commands read the current speed (live from the agent, else the
//! stored global speed), step it, deliver it with injection fallback and
//! persist it. Persistence happens even when delivery fails, so the agent
//! applies the new speed on its next load.

use std::sync::Arc;

use playrate_core::{AgentRequest, Command, Speed, SpeedTarget};
use playrate_settings::{SettingsStore, commit_speed, load_global_speed, load_settings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::delivery::Delivery;
use crate::errors::Result;
use crate::tabs::{CommandFeed, TabId, TabInfo, TabResolver};

/// What a dispatched command did.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// There was no active tab; nothing happened.
    NoActiveTab,
    /// A speed command ran.
    SpeedChanged {
        /// Target tab.
        tab: TabId,
        /// The committed speed.
        speed: Speed,
        /// Whether the agent acknowledged the new speed.
        delivered: bool,
        /// Where the speed was stored.
        target: SpeedTarget,
    },
    /// The overlay toggle ran.
    OverlayToggled {
        /// Target tab.
        tab: TabId,
        /// Whether an agent answered the toggle directly.
        delivered: bool,
    },
}

/// Routes named commands to the active tab's agent.
pub struct CommandDispatcher {
    tabs: Arc<dyn TabResolver>,
    delivery: Arc<Delivery>,
    store: Arc<dyn SettingsStore>,
}

impl CommandDispatcher {
    /// Build a dispatcher over the browser capabilities and the store.
    pub fn new(
        tabs: Arc<dyn TabResolver>,
        delivery: Arc<Delivery>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            tabs,
            delivery,
            store,
        }
    }

    /// Entry point for the browser's command callback. Never fails: unknown
    /// names and errors are logged.
    pub async fn on_command(&self, name: &str) -> Option<Outcome> {
        let command = match name.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                warn!(%error, "ignoring command");
                return None;
            }
        };
        match self.dispatch(command).await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!(%command, %error, "command failed");
                None
            }
        }
    }

    /// Run `command` against the active tab.
    #[instrument(skip(self), fields(command = %command))]
    pub async fn dispatch(&self, command: Command) -> Result<Outcome> {
        let Some(tab) = self.tabs.active_tab().await else {
            debug!("no active tab");
            return Ok(Outcome::NoActiveTab);
        };
        match command {
            Command::ToggleOverlay => Ok(self.toggle_overlay(tab.id).await),
            _ => self.change_speed(command, &tab).await,
        }
    }

    /// Consume commands until `cancel` fires or the feed closes. Commands are
    /// handled one at a time in arrival order.
    pub async fn run(self: Arc<Self>, mut commands: CommandFeed, cancel: CancellationToken) {
        info!("command dispatcher running");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                name = commands.recv() => match name {
                    Some(name) => {
                        let _ = self.on_command(&name).await;
                    }
                    None => break,
                },
            }
        }
        debug!("command dispatcher stopped");
    }

    async fn change_speed(&self, command: Command, tab: &TabInfo) -> Result<Outcome> {
        let current = match self.delivery.query_speed(tab.id).await {
            Some(speed) => Speed::new(speed),
            None => load_global_speed(self.store.as_ref()).await,
        };
        let speed = command.next_speed(current).unwrap_or(current);
        debug!(tab = tab.id, from = current.value(), to = speed.value(), "speed command");

        let delivered = match self
            .delivery
            .send_with_injection(tab.id, &AgentRequest::SetSpeed { speed })
            .await
        {
            Ok(response) => response.is_success(),
            Err(error) => {
                warn!(tab = tab.id, %error, "could not deliver speed to page");
                false
            }
        };

        let settings = load_settings(self.store.as_ref()).await;
        let domain = tab.domain();
        let target = commit_speed(self.store.as_ref(), &settings, domain.as_deref(), speed).await?;

        Ok(Outcome::SpeedChanged {
            tab: tab.id,
            speed,
            delivered,
            target,
        })
    }

    async fn toggle_overlay(&self, tab: TabId) -> Outcome {
        let request = AgentRequest::ToggleOverlay { show: None };
        match self.delivery.send(tab, &request).await {
            Ok(_) => Outcome::OverlayToggled {
                tab,
                delivered: true,
            },
            Err(error) => {
                debug!(tab, %error, "toggle not delivered, injecting page agent");
                if let Err(error) = self.delivery.inject_and_wait(tab).await {
                    warn!(tab, %error, "could not inject page agent");
                }
                Outcome::OverlayToggled {
                    tab,
                    delivered: false,
                }
            }
        }
    }
}
