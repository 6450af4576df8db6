//! Simulated page documents.
//!
//! A [`Document`] holds the page's media nodes and notifies observers when
//! nodes are inserted or removed. [`MediaNode`] behaves like an
//! `HTMLMediaElement`: it refuses rates outside the range browsers accept and
//! can be changed "by the user" through its native controls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use playrate_agent::{MediaElement, MediaError, MediaHost, MediaId, MediaMutation, OverlaySurface};
use playrate_core::domain_of;
use tokio::sync::mpsc;
use tracing::trace;

/// Slowest rate a media element accepts.
pub const MIN_NATIVE_RATE: f64 = 0.0625;
/// Fastest rate a media element accepts.
pub const MAX_NATIVE_RATE: f64 = 16.0;

/// `<video>` or `<audio>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// `<video>`
    Video,
    /// `<audio>`
    Audio,
}

/// A media element in a [`Document`].
pub struct MediaNode {
    id: MediaId,
    kind: MediaKind,
    rate: Mutex<f64>,
    paused: AtomicBool,
    connected: AtomicBool,
}

impl MediaNode {
    fn new(id: MediaId, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            rate: Mutex::new(1.0),
            paused: AtomicBool::new(true),
            connected: AtomicBool::new(true),
        }
    }

    /// Element kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Start playback.
    pub fn play(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Pause playback.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    /// Change the rate through the element's own controls.
    pub fn user_set_rate(&self, rate: f64) {
        *self.rate.lock() = rate;
    }
}

impl MediaElement for MediaNode {
    fn id(&self) -> MediaId {
        self.id
    }

    fn playback_rate(&self) -> f64 {
        *self.rate.lock()
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError> {
        if !self.is_connected() {
            return Err(MediaError::Detached(self.id));
        }
        if !(MIN_NATIVE_RATE..=MAX_NATIVE_RATE).contains(&rate) {
            return Err(MediaError::Rejected {
                id: self.id,
                rate,
                reason: "NotSupportedError: playback rate out of range".into(),
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

/// The DOM of one loaded page.
pub struct Document {
    url: String,
    hostname: Option<String>,
    media: Mutex<Vec<Arc<MediaNode>>>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MediaMutation>>>,
    next_id: AtomicU64,
}

impl Document {
    /// An empty document for `url`.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            hostname: domain_of(url),
            media: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The page URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Append a media element to the body.
    pub fn add_media(&self, kind: MediaKind) -> Arc<MediaNode> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let node = Arc::new(MediaNode::new(id, kind));
        self.media.lock().push(Arc::clone(&node));
        self.notify(MediaMutation::Added(id));
        node
    }

    /// Remove a media element. Returns whether it was present.
    pub fn remove_media(&self, id: MediaId) -> bool {
        let removed = {
            let mut media = self.media.lock();
            let before = media.len();
            media.retain(|node| {
                if node.id == id {
                    node.connected.store(false, Ordering::Relaxed);
                    false
                } else {
                    true
                }
            });
            media.len() != before
        };
        if removed {
            self.notify(MediaMutation::Removed(id));
        }
        removed
    }

    /// Snapshot of the media nodes in document order.
    pub fn media(&self) -> Vec<Arc<MediaNode>> {
        self.media.lock().clone()
    }

    /// Detach every node, as when the page unloads.
    pub fn unload(&self) {
        for node in self.media.lock().drain(..) {
            node.connected.store(false, Ordering::Relaxed);
        }
        self.observers.lock().clear();
    }

    fn notify(&self, mutation: MediaMutation) {
        trace!(url = %self.url, ?mutation, "dom mutation");
        self.observers
            .lock()
            .retain(|observer| observer.send(mutation).is_ok());
    }
}

impl MediaHost for Document {
    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn query_media(&self) -> Vec<Arc<dyn MediaElement>> {
        self.media
            .lock()
            .iter()
            .map(|node| Arc::clone(node) as Arc<dyn MediaElement>)
            .collect()
    }

    fn observe_mutations(&self) -> mpsc::UnboundedReceiver<MediaMutation> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }
}

/// The overlay `<div>` an agent mounts into a [`Document`].
#[derive(Default)]
pub struct OverlayNode {
    mounts: AtomicUsize,
    fades: AtomicUsize,
    opaque: AtomicBool,
    text: Mutex<String>,
}

impl OverlayNode {
    /// How many times the node was inserted.
    pub fn mount_count(&self) -> usize {
        self.mounts.load(Ordering::Relaxed)
    }

    /// Whether the node is in the document.
    pub fn is_mounted(&self) -> bool {
        self.mount_count() > 0
    }

    /// How many times the node faded out.
    pub fn fade_count(&self) -> usize {
        self.fades.load(Ordering::Relaxed)
    }

    /// Whether the node is currently visible.
    pub fn is_visible(&self) -> bool {
        self.opaque.load(Ordering::Relaxed)
    }

    /// Current text content.
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }
}

impl OverlaySurface for OverlayNode {
    fn mount(&self) {
        let _ = self.mounts.fetch_add(1, Ordering::Relaxed);
    }

    fn render(&self, text: &str) {
        *self.text.lock() = text.to_owned();
    }

    fn set_opaque(&self, opaque: bool) {
        let was = self.opaque.swap(opaque, Ordering::Relaxed);
        if was && !opaque {
            let _ = self.fades.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn hostname_from_url() {
        let doc = Document::new("https://Www.Example.com/watch?v=1");
        assert_eq!(doc.hostname().as_deref(), Some("www.example.com"));
        assert_eq!(Document::new("about:blank").hostname(), None);
    }

    #[test]
    fn media_ids_are_unique_and_ordered() {
        let doc = Document::new("https://a.com");
        let first = doc.add_media(MediaKind::Video);
        let second = doc.add_media(MediaKind::Audio);
        assert_ne!(first.id(), second.id());
        let ids: Vec<_> = doc.query_media().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
        assert_eq!(second.kind(), MediaKind::Audio);
    }

    #[test]
    fn native_rate_range_enforced() {
        let doc = Document::new("https://a.com");
        let node = doc.add_media(MediaKind::Video);
        assert!(node.set_playback_rate(10.0).is_ok());
        assert_matches!(node.set_playback_rate(32.0), Err(MediaError::Rejected { .. }));
        assert_eq!(node.playback_rate(), 10.0);
    }

    #[test]
    fn playback_state() {
        let doc = Document::new("https://a.com");
        let node = doc.add_media(MediaKind::Video);
        assert!(node.is_paused());
        node.play();
        assert!(!node.is_paused());
        node.pause();
        assert!(node.is_paused());
    }

    #[test]
    fn removed_node_is_detached() {
        let doc = Document::new("https://a.com");
        let node = doc.add_media(MediaKind::Video);
        assert!(doc.remove_media(node.id()));
        assert!(!doc.remove_media(node.id()));
        assert!(!node.is_connected());
        assert_matches!(node.set_playback_rate(2.0), Err(MediaError::Detached(_)));
        assert!(doc.media().is_empty());
    }

    #[tokio::test]
    async fn observers_see_mutations() {
        let doc = Document::new("https://a.com");
        let mut rx = doc.observe_mutations();
        let node = doc.add_media(MediaKind::Video);
        let _ = doc.remove_media(node.id());
        assert_eq!(rx.recv().await, Some(MediaMutation::Added(node.id())));
        assert_eq!(rx.recv().await, Some(MediaMutation::Removed(node.id())));
    }

    #[tokio::test]
    async fn unload_detaches_and_closes_feed() {
        let doc = Document::new("https://a.com");
        let mut rx = doc.observe_mutations();
        let node = doc.add_media(MediaKind::Video);
        doc.unload();
        assert!(!node.is_connected());
        assert_eq!(rx.recv().await, Some(MediaMutation::Added(node.id())));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn overlay_counts_real_fades_only() {
        let overlay = OverlayNode::default();
        overlay.set_opaque(false);
        assert_eq!(overlay.fade_count(), 0);
        overlay.mount();
        overlay.render("1.00×");
        overlay.set_opaque(true);
        overlay.set_opaque(false);
        assert_eq!(overlay.fade_count(), 1);
        assert_eq!(overlay.text(), "1.00×");
        assert!(!overlay.is_visible());
    }
}
