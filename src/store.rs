//! Overlay state: the single source of truth the renderer draws from.
//!
//! Writers build a complete [`OverlayGeometry`] first and publish it with one
//! pointer swap. Readers get an immutable `Arc` snapshot, so a reader never
//! sees a cleared-then-partially-filled state and composition never holds the
//! lock.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{DetectionResult, HeadPose, Point, Segment};

/// Renderable snapshot of the latest detection, in frame pixel space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayGeometry {
    pub box_lines: Vec<Segment>,
    /// Origin + raw direction, extended only at render time
    pub gaze_lines: Vec<Segment>,
    pub landmark_points: Vec<Point>,
    /// Empty, or index-aligned with `landmark_points`
    pub landmark_visibility: Vec<bool>,
    /// Consecutive 28-point eye blocks, see `eye_topology`
    pub eye_points: Vec<Point>,
    pub confidence: f32,
    pub face_scale: f32,
    pub pose: Option<HeadPose>,
}

impl OverlayGeometry {
    /// The "no detection" state
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.box_lines.is_empty()
            && self.gaze_lines.is_empty()
            && self.landmark_points.is_empty()
            && self.landmark_visibility.is_empty()
            && self.eye_points.is_empty()
            && self.confidence == 0.0
            && self.face_scale == 0.0
            && self.pose.is_none()
    }
}

impl From<DetectionResult> for OverlayGeometry {
    fn from(result: DetectionResult) -> Self {
        Self {
            box_lines: result.box_lines,
            gaze_lines: result.gaze_lines,
            landmark_points: result.landmarks,
            landmark_visibility: result.landmark_visibility,
            eye_points: result.eye_landmarks,
            confidence: result.confidence,
            face_scale: result.face_scale,
            pose: result.pose,
        }
    }
}

pub struct OverlayStore {
    current: Mutex<Arc<OverlayGeometry>>,
    empty: Arc<OverlayGeometry>,
    generation: AtomicU64,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayStore {
    pub fn new() -> Self {
        let empty = Arc::new(OverlayGeometry::empty());
        Self {
            current: Mutex::new(empty.clone()),
            empty,
            generation: AtomicU64::new(0),
        }
    }

    /// Reset to the empty state. Idempotent.
    pub fn clear(&self) {
        self.publish(self.empty.clone());
    }

    /// Swap in a complete new snapshot
    pub fn replace(&self, geometry: OverlayGeometry) {
        self.publish(Arc::new(geometry));
    }

    /// Current snapshot; O(1), never waits on a writer for longer than a swap
    pub fn snapshot(&self) -> Arc<OverlayGeometry> {
        self.current.lock().clone()
    }

    /// Number of publishes so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn publish(&self, next: Arc<OverlayGeometry>) {
        let _previous = {
            let mut slot = self.current.lock();
            std::mem::replace(&mut *slot, next)
        };
        self.generation.fetch_add(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OverlayGeometry {
        OverlayGeometry {
            box_lines: vec![Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0))],
            gaze_lines: vec![Segment::new(Point::new(5.0, 5.0), Point::new(6.0, 5.0))],
            landmark_points: vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            landmark_visibility: vec![true, false],
            eye_points: vec![Point::new(3.0, 3.0); 56],
            confidence: 0.8,
            face_scale: 1.2,
            pose: Some(HeadPose::default()),
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = OverlayStore::new();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_replace_then_clear() {
        let store = OverlayStore::new();
        store.replace(sample());
        let snap = store.snapshot();
        assert_eq!(*snap, sample());
        assert!(!snap.is_empty());

        store.clear();
        let cleared = store.snapshot();
        assert!(cleared.is_empty());
        assert_eq!(cleared.confidence, 0.0);
        assert_eq!(cleared.face_scale, 0.0);
        // A snapshot taken earlier is unaffected by later publishes
        assert_eq!(*snap, sample());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = OverlayStore::new();
        store.replace(sample());
        store.clear();
        let once = store.snapshot();
        store.clear();
        let twice = store.snapshot();
        assert_eq!(*once, *twice);
        assert_eq!(*twice, OverlayGeometry::empty());
    }

    #[test]
    fn test_generation_counts_publishes() {
        let store = OverlayStore::new();
        store.replace(sample());
        store.clear();
        store.clear();
        assert_eq!(store.generation(), 3);
    }

    #[test]
    fn test_from_detection_result_keeps_fields() {
        let result = DetectionResult {
            confidence: 0.5,
            face_scale: 2.0,
            landmarks: vec![Point::new(1.0, 2.0)],
            landmark_visibility: vec![false],
            ..Default::default()
        };
        let geometry = OverlayGeometry::from(result);
        assert_eq!(geometry.confidence, 0.5);
        assert_eq!(geometry.face_scale, 2.0);
        assert_eq!(geometry.landmark_points, vec![Point::new(1.0, 2.0)]);
        assert_eq!(geometry.landmark_visibility, vec![false]);
        assert!(geometry.eye_points.is_empty());
    }
}
