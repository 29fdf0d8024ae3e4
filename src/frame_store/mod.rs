//! FrameStore - Last-Known-State Cache
//!
//! ## Responsibilities
//!
//! - Hold the single most recent FrameEvent per camera
//! - Replace entries wholesale on each ingestion, never partially
//!
//! Entries are created on first ingestion for a camera and live for the
//! process lifetime. Events are shared as `Arc<FrameEvent>`, so a write
//! swaps the pointer and readers never observe a half-written event.
//! Access is a plain read/replace with no suspension point, so a
//! synchronous lock is sufficient; the hub reads this store from
//! non-async code during subscribe.

use crate::models::FrameEvent;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Per-camera last-known FrameEvent map
pub struct FrameStore {
    frames: RwLock<HashMap<String, Arc<FrameEvent>>>,
}

impl FrameStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            frames: RwLock::new(HashMap::new()),
        }
    }

    /// Latest event for a camera, if any ingestion has referenced it
    pub fn get(&self, camera_id: &str) -> Option<Arc<FrameEvent>> {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(camera_id)
            .cloned()
    }

    /// Replace the camera's entry with a new event
    pub fn set(&self, event: Arc<FrameEvent>) {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        frames.insert(event.camera_id.clone(), event);
    }

    /// Number of cameras with stored state
    pub fn camera_count(&self) -> usize {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(camera_id: &str) -> Arc<FrameEvent> {
        Arc::new(FrameEvent::new(
            camera_id.to_string(),
            Utc::now(),
            vec![],
            vec![],
        ))
    }

    #[test]
    fn test_get_absent_camera() {
        let store = FrameStore::new();
        assert!(store.get("9999").is_none());
        assert_eq!(store.camera_count(), 0);
    }

    #[test]
    fn test_set_then_get() {
        let store = FrameStore::new();
        let ev = event("42");
        store.set(ev.clone());
        let stored = store.get("42").unwrap();
        assert!(Arc::ptr_eq(&stored, &ev));
        assert_eq!(store.camera_count(), 1);
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let store = FrameStore::new();
        let first = event("42");
        let second = event("42");
        store.set(first.clone());
        store.set(second.clone());
        let stored = store.get("42").unwrap();
        assert!(Arc::ptr_eq(&stored, &second));
        assert!(!Arc::ptr_eq(&stored, &first));
        assert_eq!(store.camera_count(), 1);
    }

    #[test]
    fn test_cameras_are_independent() {
        let store = FrameStore::new();
        store.set(event("a"));
        store.set(event("b"));
        assert_eq!(store.camera_count(), 2);
        assert_eq!(store.get("a").unwrap().camera_id, "a");
        assert_eq!(store.get("b").unwrap().camera_id, "b");
    }
}
