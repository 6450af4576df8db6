//! The popup control surface.
//!
//! One [`ControlSurface`] lives for one popup invocation. It resolves the
//! speed to display when opened, pushes user changes to the page agent and
//! the store, and writes settings toggles through immediately.

use std::sync::Arc;

use playrate_core::speed::POPUP_STEP;
use playrate_core::{AgentRequest, Settings, Speed, format_speed};
use playrate_settings::{SettingsStore, commit_speed, load_settings, load_speed_config, save_settings};
use tracing::{debug, instrument, warn};

use crate::delivery::Delivery;
use crate::tabs::{TabInfo, TabResolver};

/// What the popup renders for the current speed.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedDisplay {
    /// Slider position.
    pub slider: f64,
    /// Large label, `"1.50×"`.
    pub label: String,
    /// Numeric readout, `"1.50"`.
    pub readout: String,
}

impl From<Speed> for SpeedDisplay {
    fn from(speed: Speed) -> Self {
        Self {
            slider: speed.value(),
            label: format_speed(speed.value()),
            readout: speed.readout(),
        }
    }
}

/// Keys the popup reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupKey {
    /// One popup step faster.
    ArrowUp,
    /// One popup step slower.
    ArrowDown,
    /// Back to normal speed.
    Digit0,
}

impl PopupKey {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::ArrowUp),
            "ArrowDown" => Some(Self::ArrowDown),
            "0" => Some(Self::Digit0),
            _ => None,
        }
    }
}

/// State and actions of one open popup.
pub struct ControlSurface {
    tabs: Arc<dyn TabResolver>,
    delivery: Arc<Delivery>,
    store: Arc<dyn SettingsStore>,
    settings: Settings,
    tab: Option<TabInfo>,
    domain: Option<String>,
    speed: Speed,
}

impl ControlSurface {
    /// Open the popup: load settings, find the tab and resolve the speed.
    #[instrument(skip_all)]
    pub async fn open(
        tabs: Arc<dyn TabResolver>,
        delivery: Arc<Delivery>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let settings = load_settings(store.as_ref()).await;
        let tab = tabs.active_tab().await;
        let domain = tab.as_ref().and_then(TabInfo::domain);
        let mut surface = Self {
            tabs,
            delivery,
            store,
            settings,
            tab,
            domain,
            speed: Speed::DEFAULT,
        };
        surface.speed = surface.resolve_speed().await;
        debug!(domain = ?surface.domain, speed = surface.speed.value(), "popup opened");
        surface
    }

    /// Current settings as shown in the settings panel.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// The active tab's domain.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The speed currently displayed.
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Render model for the speed widgets.
    pub fn display(&self) -> SpeedDisplay {
        self.speed.into()
    }

    /// Slider dragged: update the display only.
    pub fn slider_input(&mut self, value: f64) {
        self.speed = Speed::new(value);
    }

    /// Slider released: commit the value.
    pub async fn slider_change(&mut self, value: f64) {
        self.set_speed(value).await;
    }

    /// Handle a key press. Returns whether the key was consumed.
    pub async fn on_key(&mut self, key: &str) -> bool {
        let Some(key) = PopupKey::from_key(key) else {
            return false;
        };
        let next = match key {
            PopupKey::ArrowUp => self.speed.offset(POPUP_STEP),
            PopupKey::ArrowDown => self.speed.offset(-POPUP_STEP),
            PopupKey::Digit0 => Speed::DEFAULT,
        };
        self.set_speed(next.value()).await;
        true
    }

    /// Commit a user-chosen speed: deliver it, optionally flash the overlay,
    /// persist it and refresh the display. Failures are logged.
    #[instrument(skip(self))]
    pub async fn set_speed(&mut self, value: f64) {
        let speed = Speed::new(value);

        if let Some(tab) = self.tab.as_ref().map(|t| t.id) {
            match self
                .delivery
                .send_with_injection(tab, &AgentRequest::SetSpeed { speed })
                .await
            {
                Ok(_) => {
                    if self.settings.show_overlay {
                        let show = AgentRequest::ToggleOverlay { show: Some(true) };
                        if let Err(error) = self.delivery.send(tab, &show).await {
                            debug!(tab, %error, "overlay request not delivered");
                        }
                    }
                }
                Err(error) => warn!(tab, %error, "could not deliver speed to page"),
            }
        } else {
            debug!("no active tab, persisting only");
        }

        if let Err(error) =
            commit_speed(self.store.as_ref(), &self.settings, self.domain(), speed).await
        {
            warn!(%error, "failed to persist speed");
        }
        self.speed = speed;
    }

    /// Toggle per-site mode and re-resolve the displayed speed.
    pub async fn set_per_site_speed(&mut self, enabled: bool) {
        self.settings.per_site_speed = enabled;
        self.save_settings().await;
        self.speed = self.resolve_speed().await;
    }

    /// Toggle the overlay and tell the page agent. Delivery failures are
    /// ignored; the agent reads the setting on its next load.
    pub async fn set_show_overlay(&mut self, enabled: bool) {
        self.settings.show_overlay = enabled;
        self.save_settings().await;
        if let Some(tab) = self.tab.as_ref().map(|t| t.id) {
            let request = AgentRequest::ToggleOverlay {
                show: Some(enabled),
            };
            if let Err(error) = self.delivery.send(tab, &request).await {
                debug!(tab, %error, "overlay toggle not delivered");
            }
        }
    }

    /// Toggle auto-apply.
    pub async fn set_auto_apply(&mut self, enabled: bool) {
        self.settings.auto_apply = enabled;
        self.save_settings().await;
    }

    /// Re-read the active tab, for popups that outlive a tab switch.
    pub async fn refresh_tab(&mut self) {
        self.tab = self.tabs.active_tab().await;
        self.domain = self.tab.as_ref().and_then(TabInfo::domain);
        self.speed = self.resolve_speed().await;
    }

    async fn save_settings(&self) {
        if let Err(error) = save_settings(self.store.as_ref(), &self.settings).await {
            warn!(%error, "failed to save settings");
        }
    }

    /// Live agent speed first, else per-site/global resolution.
    async fn resolve_speed(&self) -> Speed {
        if let Some(tab) = &self.tab {
            if let Some(live) = self.delivery.query_speed(tab.id).await {
                return Speed::new(live);
            }
        }
        let mut config = load_speed_config(self.store.as_ref()).await;
        config.settings = self.settings;
        config.resolve(self.domain())
    }
}
