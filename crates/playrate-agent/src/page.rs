//! Capabilities the agent needs from the page it runs in.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::errors::MediaError;

/// Stable identity of a media element within its page.
pub type MediaId = u64;

/// A `<video>` or `<audio>` element.
pub trait MediaElement: Send + Sync {
    /// Page-unique id.
    fn id(&self) -> MediaId;
    /// Current `playbackRate`.
    fn playback_rate(&self) -> f64;
    /// Assign `playbackRate`.
    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError>;
    /// Whether playback is paused.
    fn is_paused(&self) -> bool;
    /// Whether the element is still attached to the document.
    fn is_connected(&self) -> bool;
}

/// A structural change to the page's media set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaMutation {
    /// A media element was inserted.
    Added(MediaId),
    /// A media element was removed.
    Removed(MediaId),
}

/// The document the agent is injected into.
pub trait MediaHost: Send + Sync {
    /// `location.hostname`, if the page has one.
    fn hostname(&self) -> Option<String>;
    /// All media elements currently in the document, in document order.
    fn query_media(&self) -> Vec<Arc<dyn MediaElement>>;
    /// Subscribe to media insertions and removals.
    fn observe_mutations(&self) -> mpsc::UnboundedReceiver<MediaMutation>;
}

/// The DOM node backing the speed overlay.
pub trait OverlaySurface: Send + Sync {
    /// Insert the node into the document.
    fn mount(&self);
    /// Replace the node's text.
    fn render(&self, text: &str);
    /// Fade in (`true`) or out (`false`).
    fn set_opaque(&self, opaque: bool);
}
