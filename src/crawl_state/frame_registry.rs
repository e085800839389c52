//! Stable integer identities for browser frames
//!
//! Chrome names frames with opaque string ids that the driver owns. The
//! registry is a side table from those ids to small integers that never
//! repeat within a run. Entries are dropped when the browser reports the
//! frame detached; the counter is never rewound, so a dropped id is never
//! handed to a different frame.

use std::collections::HashMap;

use crate::crawl_events::{CdpFrameId, FrameKey};

#[derive(Debug, Default)]
pub struct FrameRegistry {
    ids: HashMap<CdpFrameId, FrameKey>,
    last_assigned: FrameKey,
}

impl FrameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer id for `frame`, assigning the next unused one on first sight
    pub fn id_for(&mut self, frame: &str) -> FrameKey {
        if let Some(id) = self.ids.get(frame) {
            return *id;
        }
        self.last_assigned += 1;
        let id = self.last_assigned;
        self.ids.insert(frame.to_string(), id);
        id
    }

    /// Lookup without assigning
    #[must_use]
    pub fn get(&self, frame: &str) -> Option<FrameKey> {
        self.ids.get(frame).copied()
    }

    /// Forget a frame the browser has detached
    pub fn forget(&mut self, frame: &str) -> Option<FrameKey> {
        self.ids.remove(frame)
    }

    /// Number of frames currently tracked
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut registry = FrameRegistry::new();
        assert_eq!(registry.id_for("A"), 1);
        assert_eq!(registry.id_for("B"), 2);
        assert_eq!(registry.id_for("A"), 1);
    }

    #[test]
    fn forgotten_ids_are_not_reused() {
        let mut registry = FrameRegistry::new();
        let first = registry.id_for("A");
        assert_eq!(registry.forget("A"), Some(first));
        assert!(registry.is_empty());
        assert_ne!(registry.id_for("B"), first);
        // The same CDP id coming back is a new frame as far as the log is concerned
        assert_ne!(registry.id_for("A"), first);
    }
}
