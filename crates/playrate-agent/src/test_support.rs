//! Hand-written page fakes for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::errors::MediaError;
use crate::page::{MediaElement, MediaHost, MediaId, MediaMutation, OverlaySurface};

pub struct FakeMedia {
    id: MediaId,
    rate: Mutex<f64>,
    paused: AtomicBool,
    connected: AtomicBool,
    rejects: AtomicBool,
}

impl FakeMedia {
    pub fn new(id: MediaId) -> Arc<Self> {
        Arc::new(Self {
            id,
            rate: Mutex::new(1.0),
            paused: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            rejects: AtomicBool::new(false),
        })
    }

    pub fn rate(&self) -> f64 {
        *self.rate.lock()
    }

    pub fn user_sets_rate(&self, rate: f64) {
        *self.rate.lock() = rate;
    }

    pub fn play(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn detach(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    pub fn reattach(&self) {
        self.connected.store(true, Ordering::Relaxed);
    }

    pub fn reject_rates(&self) {
        self.rejects.store(true, Ordering::Relaxed);
    }
}

impl MediaElement for FakeMedia {
    fn id(&self) -> MediaId {
        self.id
    }

    fn playback_rate(&self) -> f64 {
        self.rate()
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError> {
        if self.rejects.load(Ordering::Relaxed) {
            return Err(MediaError::Rejected {
                id: self.id,
                rate,
                reason: "NotSupportedError".into(),
            });
        }
        *self.rate.lock() = rate;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct FakeSurface {
    mounts: AtomicUsize,
    fades: AtomicUsize,
    opaque: AtomicBool,
    text: Mutex<String>,
}

impl FakeSurface {
    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::Relaxed)
    }

    pub fn fades(&self) -> usize {
        self.fades.load(Ordering::Relaxed)
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque.load(Ordering::Relaxed)
    }

    pub fn text(&self) -> String {
        self.text.lock().clone()
    }
}

impl OverlaySurface for FakeSurface {
    fn mount(&self) {
        let _ = self.mounts.fetch_add(1, Ordering::Relaxed);
    }

    fn render(&self, text: &str) {
        *self.text.lock() = text.to_owned();
    }

    fn set_opaque(&self, opaque: bool) {
        if !opaque {
            let _ = self.fades.fetch_add(1, Ordering::Relaxed);
        }
        self.opaque.store(opaque, Ordering::Relaxed);
    }
}

pub struct FakePage {
    hostname: Option<String>,
    media: Mutex<Vec<Arc<FakeMedia>>>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MediaMutation>>>,
}

impl FakePage {
    pub fn new(hostname: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            hostname: hostname.map(str::to_owned),
            media: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        })
    }

    pub fn insert(&self, media: Arc<FakeMedia>) {
        let id = media.id();
        self.media.lock().push(media);
        self.notify(MediaMutation::Added(id));
    }

    pub fn remove(&self, id: MediaId) {
        self.media.lock().retain(|m| {
            if m.id() == id {
                m.detach();
            }
            m.id() != id
        });
        self.notify(MediaMutation::Removed(id));
    }

    pub fn close_observers(&self) {
        self.observers.lock().clear();
    }

    fn notify(&self, mutation: MediaMutation) {
        self.observers
            .lock()
            .retain(|tx| tx.send(mutation).is_ok());
    }
}

impl MediaHost for FakePage {
    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn query_media(&self) -> Vec<Arc<dyn MediaElement>> {
        self.media
            .lock()
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn MediaElement>)
            .collect()
    }

    fn observe_mutations(&self) -> mpsc::UnboundedReceiver<MediaMutation> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }
}
