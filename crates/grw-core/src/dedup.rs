//! Recent-event dedup window.

use std::collections::{HashSet, VecDeque};

/// Compose the dedup key for one update. Absent components are pinned to
/// fixed sentinel strings so the key shape stays stable.
pub fn dedup_key(
    message_id: Option<&str>,
    action_type: Option<&str>,
    gift_id: Option<&str>,
) -> String {
    format!(
        "{}:{}:{}",
        message_id.unwrap_or("no-id"),
        action_type.unwrap_or("no-action"),
        gift_id.unwrap_or("")
    )
}

/// Bounded recent-key cache guarding against repeat delivery of the same
/// remote event.
///
/// Best-effort by contract: a restart clears it, and a duplicate older
/// than the window slips through. That risk is accepted; this is a shield
/// against redelivery bursts, not a durable store.
#[derive(Debug)]
pub struct DedupWindow {
    cap: usize,
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl DedupWindow {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            order: VecDeque::new(),
            keys: HashSet::new(),
        }
    }

    pub fn seen(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key; a no-op if already present. When the insert pushes
    /// the window past its bound, the oldest `cap` keys are evicted in one
    /// pass rather than trickling out one at a time.
    pub fn remember(&mut self, key: &str) {
        if !self.keys.insert(key.to_string()) {
            return;
        }
        self.order.push_back(key.to_string());
        if self.order.len() > self.cap {
            for old in self.order.drain(..self.cap) {
                self.keys.remove(&old);
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_then_seen() {
        let mut w = DedupWindow::new(100);
        assert!(!w.seen("a"));
        w.remember("a");
        assert!(w.seen("a"));
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn remember_is_noop_for_known_keys() {
        let mut w = DedupWindow::new(100);
        w.remember("a");
        w.remember("a");
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn window_stays_bounded_under_churn() {
        let mut w = DedupWindow::new(100);
        for i in 0..250 {
            w.remember(&format!("k{i}"));
            assert!(w.len() <= 100, "window exceeded bound at insert {i}");
        }
    }

    #[test]
    fn overflow_evicts_the_oldest_keys_in_bulk() {
        let mut w = DedupWindow::new(3);
        for k in ["a", "b", "c", "d"] {
            w.remember(k);
        }
        // The insert of "d" trips the bound and drops the first three.
        assert_eq!(w.len(), 1);
        assert!(w.seen("d"));
        assert!(!w.seen("a"));
        assert!(!w.seen("b"));
        assert!(!w.seen("c"));
    }

    #[test]
    fn key_sentinels_for_missing_components() {
        assert_eq!(dedup_key(None, None, None), "no-id:no-action:");
        assert_eq!(
            dedup_key(Some("5"), Some("GiftAction"), Some("77")),
            "5:GiftAction:77"
        );
    }
}
