//! First-sight tracking for flare events.
//!
//! The DONKI query window overlaps between polls, so without this an
//! event sitting in two windows would be announced twice.

use std::collections::HashSet;
use std::collections::VecDeque;

use budvabot_core::types::FlareEvent;

/// Bounded set of already-announced event keys. Insertion order is kept
/// so the oldest keys are evicted first once the cap is reached; the cap
/// comfortably exceeds any realistic 3-day window.
pub struct SeenFlares {
    keys: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenFlares {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// True exactly once per event identity.
    pub fn first_sight(&mut self, event: &FlareEvent) -> bool {
        let key = event.key();
        if self.keys.contains(&key) {
            return false;
        }
        if self.keys.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.keys.remove(&oldest);
        }
        self.keys.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for SeenFlares {
    fn default() -> Self {
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flare(class: &str, time: &str) -> FlareEvent {
        FlareEvent {
            class_type: class.into(),
            begin_time: time.into(),
        }
    }

    #[test]
    fn test_announces_once_across_overlapping_windows() {
        let mut seen = SeenFlares::default();
        let e = flare("M1.2", "2024-07-01T12:00Z");
        assert!(seen.first_sight(&e));
        assert!(!seen.first_sight(&e));
        assert!(!seen.first_sight(&e));
    }

    #[test]
    fn test_distinct_events_are_distinct() {
        let mut seen = SeenFlares::default();
        assert!(seen.first_sight(&flare("M1.2", "2024-07-01T12:00Z")));
        assert!(seen.first_sight(&flare("M1.2", "2024-07-01T15:00Z")));
        assert!(seen.first_sight(&flare("C3.0", "2024-07-01T12:00Z")));
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_eviction_keeps_capacity() {
        let mut seen = SeenFlares::new(2);
        seen.first_sight(&flare("A1.0", "t1"));
        seen.first_sight(&flare("B1.0", "t2"));
        seen.first_sight(&flare("C1.0", "t3"));
        assert_eq!(seen.len(), 2);
        // Oldest key was evicted, so it would be announced again.
        assert!(seen.first_sight(&flare("A1.0", "t1")));
    }
}
