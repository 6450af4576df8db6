//! The on-page speed indicator.
//!
//! The surface is mounted at most once per page. Every [`Overlay::show`]
//! cancels the pending fade and schedules a new one, so at most one fade is
//! ever outstanding.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use playrate_core::format_speed;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::page::OverlaySurface;

#[derive(Default)]
struct OverlayState {
    created: bool,
    fade: Option<JoinHandle<()>>,
}

/// Owns the overlay surface and its fade timer.
pub struct Overlay {
    surface: Arc<dyn OverlaySurface>,
    hide_after: Duration,
    enabled: AtomicBool,
    state: Mutex<OverlayState>,
}

impl Overlay {
    /// Wrap `surface`; shown values fade after `hide_after` of inactivity.
    pub fn new(surface: Arc<dyn OverlaySurface>, hide_after: Duration) -> Self {
        Self {
            surface,
            hide_after,
            enabled: AtomicBool::new(false),
            state: Mutex::new(OverlayState::default()),
        }
    }

    /// Mount the surface unless already mounted.
    pub fn create(&self) {
        let mut state = self.state.lock();
        self.create_locked(&mut state);
    }

    fn create_locked(&self, state: &mut OverlayState) {
        if !state.created {
            self.surface.mount();
            state.created = true;
            debug!("overlay created");
        }
    }

    /// Whether speed changes should be displayed.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable display of speed changes.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Display `rate`, then fade after the inactivity period.
    pub fn show(&self, rate: f64) {
        let mut state = self.state.lock();
        self.create_locked(&mut state);
        self.surface.render(&format_speed(rate));
        self.surface.set_opaque(true);

        if let Some(previous) = state.fade.take() {
            previous.abort();
        }
        let surface = Arc::clone(&self.surface);
        let delay = self.hide_after;
        state.fade = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            surface.set_opaque(false);
        }));
    }

    /// Fade out now and drop any pending fade.
    pub fn hide(&self) {
        let mut state = self.state.lock();
        if let Some(pending) = state.fade.take() {
            pending.abort();
        }
        if state.created {
            self.surface.set_opaque(false);
        }
    }

    /// Whether a fade is scheduled and has not run yet.
    pub fn has_pending_fade(&self) -> bool {
        self.state
            .lock()
            .fade
            .as_ref()
            .is_some_and(|fade| !fade.is_finished())
    }

    /// Cancel the pending fade without touching the surface.
    pub fn shutdown(&self) {
        if let Some(pending) = self.state.lock().fade.take() {
            pending.abort();
        }
    }
}
