//! Manual rate-change detection.
//!
//! Media elements offer no reliable change notification, so each watched
//! element gets a poll task. A rate change on an element that is not
//! extension-controlled counts as a user change and is shown on the overlay.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::controlled::ControlledMarks;
use crate::overlay::Overlay;
use crate::page::{MediaElement, MediaId};

/// Installs at most one poll task per media element.
pub struct RateWatcher {
    poll_interval: Duration,
    marks: Arc<ControlledMarks>,
    overlay: Arc<Overlay>,
    watched: Arc<Mutex<HashSet<MediaId>>>,
    cancel: CancellationToken,
}

impl RateWatcher {
    /// Poll tasks stop when `cancel` fires or their element detaches.
    pub fn new(
        poll_interval: Duration,
        marks: Arc<ControlledMarks>,
        overlay: Arc<Overlay>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            poll_interval,
            marks,
            overlay,
            watched: Arc::new(Mutex::new(HashSet::new())),
            cancel,
        }
    }

    /// Start polling `element`. Returns `false` if it is already watched.
    pub fn watch(&self, element: Arc<dyn MediaElement>) -> bool {
        let id = element.id();
        if !self.watched.lock().insert(id) {
            return false;
        }
        let poller = Poller {
            last: element.playback_rate(),
            element,
            marks: Arc::clone(&self.marks),
            overlay: Arc::clone(&self.overlay),
            watched: Arc::clone(&self.watched),
        };
        let _ = tokio::spawn(poller.run(self.poll_interval, self.cancel.clone()));
        debug!(media = id, "rate watcher installed");
        true
    }

    /// Whether `id` currently has a poll task.
    pub fn is_watching(&self, id: MediaId) -> bool {
        self.watched.lock().contains(&id)
    }

    /// Number of live poll tasks.
    pub fn watched_count(&self) -> usize {
        self.watched.lock().len()
    }
}

struct Poller {
    element: Arc<dyn MediaElement>,
    last: f64,
    marks: Arc<ControlledMarks>,
    overlay: Arc<Overlay>,
    watched: Arc<Mutex<HashSet<MediaId>>>,
}

impl Poller {
    async fn run(mut self, period: Duration, cancel: CancellationToken) {
        let id = self.element.id();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.element.is_connected() {
                        debug!(media = id, "media detached, rate watcher stopped");
                        break;
                    }
                    self.check(id);
                }
            }
        }
        self.marks.clear(id);
        let _ = self.watched.lock().remove(&id);
    }

    #[allow(clippy::float_cmp)]
    fn check(&mut self, id: MediaId) {
        let rate = self.element.playback_rate();
        if rate == self.last {
            return;
        }
        self.last = rate;
        if self.marks.is_controlled(id) {
            trace!(media = id, rate, "rate change by extension, ignored");
            return;
        }
        debug!(media = id, rate, "manual rate change");
        if self.overlay.is_enabled() {
            self.overlay.show(rate);
        }
    }
}
