//! Extension-controlled marks.
//!
//! A programmatic rate set marks the element for a short window so the rate
//! watcher does not mistake it for a user change. Marks are deadlines on the
//! tokio clock: marking again inside the window pushes the deadline out.
//! Expired marks are pruned on every mark and on lookup.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::page::MediaId;

/// Per-element suppression deadlines.
pub struct ControlledMarks {
    window: Duration,
    deadlines: Mutex<HashMap<MediaId, Instant>>,
}

impl ControlledMarks {
    /// Marks last for `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: Mutex::new(HashMap::new()),
        }
    }

    /// Flag `id` as extension-controlled from now until now + window.
    pub fn mark(&self, id: MediaId) {
        let now = Instant::now();
        let mut deadlines = self.deadlines.lock();
        deadlines.retain(|_, deadline| *deadline > now);
        let _ = deadlines.insert(id, now + self.window);
    }

    /// Drop the mark for `id`, as when its element leaves the page.
    pub fn clear(&self, id: MediaId) {
        let _ = self.deadlines.lock().remove(&id);
    }

    /// Whether `id` is inside its window.
    pub fn is_controlled(&self, id: MediaId) -> bool {
        let mut deadlines = self.deadlines.lock();
        match deadlines.get(&id) {
            Some(deadline) if *deadline > Instant::now() => true,
            Some(_) => {
                let _ = deadlines.remove(&id);
                false
            }
            None => false,
        }
    }

    /// Number of marks not yet dropped, expired or not.
    pub fn len(&self) -> usize {
        self.deadlines.lock().len()
    }

    /// Whether no marks are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn unmarked_is_not_controlled() {
        let marks = ControlledMarks::new(WINDOW);
        assert!(!marks.is_controlled(1));
        assert!(marks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mark_lasts_for_window() {
        let marks = ControlledMarks::new(WINDOW);
        marks.mark(1);
        advance(Duration::from_millis(499)).await;
        assert!(marks.is_controlled(1));
        assert!(!marks.is_controlled(2));
        advance(Duration::from_millis(1)).await;
        assert!(!marks.is_controlled(1));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_mark_is_dropped() {
        let marks = ControlledMarks::new(WINDOW);
        marks.mark(1);
        advance(Duration::from_secs(1)).await;
        assert_eq!(marks.len(), 1);
        assert!(!marks.is_controlled(1));
        assert!(marks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn marking_prunes_expired_marks() {
        let marks = ControlledMarks::new(WINDOW);
        marks.mark(1);
        marks.mark(2);
        advance(Duration::from_secs(1)).await;
        marks.mark(3);
        assert_eq!(marks.len(), 1);
        assert!(marks.is_controlled(3));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_live_mark() {
        let marks = ControlledMarks::new(WINDOW);
        marks.mark(1);
        marks.clear(1);
        assert!(marks.is_empty());
        assert!(!marks.is_controlled(1));
    }

    #[tokio::test(start_paused = true)]
    async fn remark_extends_window() {
        let marks = ControlledMarks::new(WINDOW);
        marks.mark(1);
        advance(Duration::from_millis(400)).await;
        marks.mark(1);
        advance(Duration::from_millis(400)).await;
        assert!(marks.is_controlled(1));
        advance(Duration::from_millis(100)).await;
        assert!(!marks.is_controlled(1));
    }
}
