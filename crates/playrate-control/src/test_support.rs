//! Scripted browser fake for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use playrate_core::{AgentRequest, AgentResponse, OverlayAck, SetSpeedAck, SpeedReport};
use tokio::sync::oneshot;

use crate::errors::TransportError;
use crate::tabs::{Readiness, ScriptInjector, TabId, TabInfo, TabMessenger, TabResolver};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum InjectMode {
    /// Injection loads the agent and signals readiness.
    Ready,
    /// Injection loads the agent but cannot signal.
    Unsupported,
    /// Injection "succeeds" but the agent never starts.
    Silent,
    /// The browser refuses.
    Refused,
}

pub struct FakeBrowser {
    active: Mutex<Option<TabInfo>>,
    agent_loaded: AtomicBool,
    inject_mode: Mutex<InjectMode>,
    media_rate: Mutex<f64>,
    overlay_shown: Mutex<Option<bool>>,
    sent: Mutex<Vec<AgentRequest>>,
    injections: AtomicUsize,
    unsent_signals: Mutex<Vec<oneshot::Sender<()>>>,
}

impl FakeBrowser {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            active: Mutex::new(Some(TabInfo {
                id: 1,
                url: url.map(str::to_owned),
            })),
            agent_loaded: AtomicBool::new(false),
            inject_mode: Mutex::new(InjectMode::Ready),
            media_rate: Mutex::new(1.0),
            overlay_shown: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            injections: AtomicUsize::new(0),
            unsent_signals: Mutex::new(Vec::new()),
        }
    }

    pub fn without_tab() -> Self {
        let browser = Self::new(None);
        *browser.active.lock() = None;
        browser
    }

    pub fn with_agent(self, rate: f64) -> Self {
        self.agent_loaded.store(true, Ordering::Relaxed);
        *self.media_rate.lock() = rate;
        self
    }

    pub fn inject_mode(self, mode: InjectMode) -> Self {
        *self.inject_mode.lock() = mode;
        self
    }

    pub fn media_rate(&self) -> f64 {
        *self.media_rate.lock()
    }

    pub fn overlay_shown(&self) -> Option<bool> {
        *self.overlay_shown.lock()
    }

    pub fn sent(&self) -> Vec<AgentRequest> {
        self.sent.lock().clone()
    }

    pub fn injections(&self) -> usize {
        self.injections.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TabResolver for FakeBrowser {
    async fn active_tab(&self) -> Option<TabInfo> {
        self.active.lock().clone()
    }
}

#[async_trait]
impl TabMessenger for FakeBrowser {
    async fn send(&self, tab: TabId, request: &AgentRequest) -> Result<AgentResponse, TransportError> {
        self.sent.lock().push(request.clone());
        if !self.agent_loaded.load(Ordering::Relaxed) {
            return Err(TransportError::NoReceiver(tab));
        }
        Ok(match *request {
            AgentRequest::GetCurrentSpeed => AgentResponse::Speed(SpeedReport {
                speed: *self.media_rate.lock(),
            }),
            AgentRequest::SetSpeed { speed } => {
                *self.media_rate.lock() = speed.value();
                AgentResponse::SetSpeed(SetSpeedAck {
                    success: true,
                    applied: true,
                })
            }
            AgentRequest::ToggleOverlay { show } => {
                *self.overlay_shown.lock() = show;
                AgentResponse::Overlay(OverlayAck { success: true })
            }
        })
    }
}

#[async_trait]
impl ScriptInjector for FakeBrowser {
    async fn inject(&self, tab: TabId) -> Result<Readiness, TransportError> {
        let _ = self.injections.fetch_add(1, Ordering::Relaxed);
        let mode = *self.inject_mode.lock();
        match mode {
            InjectMode::Ready => {
                self.agent_loaded.store(true, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel();
                let _ = tx.send(());
                Ok(Readiness::Signal(rx))
            }
            InjectMode::Unsupported => {
                self.agent_loaded.store(true, Ordering::Relaxed);
                Ok(Readiness::Unsupported)
            }
            InjectMode::Silent => {
                let (tx, rx) = oneshot::channel();
                self.unsent_signals.lock().push(tx);
                Ok(Readiness::Signal(rx))
            }
            InjectMode::Refused => Err(TransportError::InjectionRefused {
                tab,
                reason: "chrome:// pages cannot be scripted".into(),
            }),
        }
    }
}
