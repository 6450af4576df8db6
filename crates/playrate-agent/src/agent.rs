//! The per-page agent.
//!
//! Answers protocol messages, applies resolved speeds when the page loads or
//! gains media, and owns the overlay and rate watchers for its page. All of
//! its background tasks end when [`PageAgent::shutdown`] is called.

use std::sync::Arc;

use playrate_core::protocol::decode_request;
use playrate_core::speed::DEFAULT_SPEED;
use playrate_core::{AgentRequest, AgentResponse, OverlayAck, ProtocolError, SetSpeedAck, Speed, SpeedReport};
use playrate_settings::{SettingsStore, TimingConfig, load_speed_config};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::controlled::ControlledMarks;
use crate::overlay::Overlay;
use crate::page::{MediaHost, MediaMutation, OverlaySurface};
use crate::watcher::RateWatcher;

/// One agent per page.
pub struct PageAgent {
    host: Arc<dyn MediaHost>,
    store: Arc<dyn SettingsStore>,
    domain: Option<String>,
    overlay: Arc<Overlay>,
    marks: Arc<ControlledMarks>,
    watcher: RateWatcher,
    timing: TimingConfig,
    cancel: CancellationToken,
}

impl PageAgent {
    /// Build an agent for `host`. Nothing runs until [`PageAgent::start`].
    pub fn new(
        host: Arc<dyn MediaHost>,
        surface: Arc<dyn OverlaySurface>,
        store: Arc<dyn SettingsStore>,
        timing: TimingConfig,
    ) -> Arc<Self> {
        let cancel = CancellationToken::new();
        let overlay = Arc::new(Overlay::new(surface, timing.overlay_hide()));
        let marks = Arc::new(ControlledMarks::new(timing.control_window()));
        let watcher = RateWatcher::new(
            timing.poll_interval(),
            Arc::clone(&marks),
            Arc::clone(&overlay),
            cancel.clone(),
        );
        let domain = host
            .hostname()
            .map(|h| h.to_ascii_lowercase())
            .filter(|h| !h.is_empty());
        Arc::new(Self {
            host,
            store,
            domain,
            overlay,
            marks,
            watcher,
            timing,
            cancel,
        })
    }

    /// The page's lower-case host name.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The overlay this agent drives.
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// The rate watcher registry.
    pub fn watcher(&self) -> &RateWatcher {
        &self.watcher
    }

    /// Load settings, apply the resolved speed, install watchers and start the
    /// background loops. Returns once the agent can answer messages.
    #[instrument(skip(self), fields(domain = self.domain.as_deref().unwrap_or("")))]
    pub async fn start(self: &Arc<Self>) {
        let config = load_speed_config(self.store.as_ref()).await;
        let speed = config.resolve(self.domain());

        if config.settings.show_overlay {
            self.overlay.create();
            self.overlay.set_enabled(true);
        }
        if config.settings.auto_apply {
            let _ = self.set_media_speed(speed);
        }
        let _ = self.install_watchers();

        let mutations = self.host.observe_mutations();
        let _ = tokio::spawn(Arc::clone(self).observe(mutations));
        info!(speed = speed.value(), "page agent started");
    }

    /// Stop every background task owned by this agent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.overlay.shutdown();
        debug!("page agent shut down");
    }

    /// Whether [`PageAgent::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Answer one decoded request.
    pub fn handle(&self, request: &AgentRequest) -> AgentResponse {
        debug!(action = request.action(), "agent request");
        match *request {
            AgentRequest::GetCurrentSpeed => AgentResponse::Speed(SpeedReport {
                speed: self.current_speed(),
            }),
            AgentRequest::SetSpeed { speed } => AgentResponse::SetSpeed(SetSpeedAck {
                success: true,
                applied: self.set_media_speed(speed),
            }),
            AgentRequest::ToggleOverlay { show } => {
                self.toggle_overlay(show);
                AgentResponse::Overlay(OverlayAck { success: true })
            }
        }
    }

    /// Decode, answer and encode one raw message.
    pub fn handle_message(&self, message: &Value) -> Result<Value, ProtocolError> {
        let request = decode_request(message).inspect_err(|error| {
            warn!(%error, "rejecting malformed agent message");
        })?;
        Ok(serde_json::to_value(self.handle(&request))?)
    }

    /// Rate of the first playing element, else the first element, else 1.0.
    pub fn current_speed(&self) -> f64 {
        let media = self.host.query_media();
        media
            .iter()
            .find(|m| !m.is_paused())
            .or_else(|| media.first())
            .map_or(DEFAULT_SPEED, |m| m.playback_rate())
    }

    /// Apply `speed` to every media element on the page.
    ///
    /// Each element is marked extension-controlled before its rate changes.
    /// Per-element failures are logged and skipped. Returns whether at least
    /// one element took the rate.
    pub fn set_media_speed(&self, speed: Speed) -> bool {
        let mut applied = 0_usize;
        for element in self.host.query_media() {
            let id = element.id();
            self.marks.mark(id);
            match element.set_playback_rate(speed.value()) {
                Ok(()) => applied += 1,
                Err(error) => warn!(media = id, %error, "failed to set playback rate"),
            }
        }
        debug!(speed = speed.value(), applied, "applied speed to media");
        if applied > 0 && self.overlay.is_enabled() {
            self.overlay.show(speed.value());
        }
        applied > 0
    }

    /// Enable or disable the overlay; `None` flips it.
    pub fn toggle_overlay(&self, show: Option<bool>) {
        let show = show.unwrap_or(!self.overlay.is_enabled());
        self.overlay.set_enabled(show);
        if show {
            self.overlay.show(self.current_speed());
        } else {
            self.overlay.hide();
        }
        debug!(show, "overlay toggled");
    }

    /// Watch every element that has no poll task yet. Returns how many were
    /// newly installed.
    pub fn install_watchers(&self) -> usize {
        self.host
            .query_media()
            .into_iter()
            .filter(|element| self.watcher.watch(Arc::clone(element)))
            .count()
    }

    async fn on_media_added(&self) {
        let config = load_speed_config(self.store.as_ref()).await;
        if config.settings.auto_apply && !self.host.query_media().is_empty() {
            let _ = self.set_media_speed(config.resolve(self.domain()));
        }
        let _ = self.install_watchers();
    }

    async fn observe(self: Arc<Self>, mut mutations: mpsc::UnboundedReceiver<MediaMutation>) {
        let period = self.timing.rescan_interval();
        let mut rescan = time::interval_at(Instant::now() + period, period);
        let mut feed_open = true;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = rescan.tick() => {
                    let installed = self.install_watchers();
                    if installed > 0 {
                        debug!(installed, "rescan found unwatched media");
                    }
                }
                mutation = mutations.recv(), if feed_open => match mutation {
                    Some(MediaMutation::Added(id)) => {
                        debug!(media = id, "media added");
                        self.on_media_added().await;
                    }
                    Some(MediaMutation::Removed(id)) => debug!(media = id, "media removed"),
                    None => {
                        debug!("mutation feed closed, continuing with rescan only");
                        feed_open = false;
                    }
                },
            }
        }
    }
}
