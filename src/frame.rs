//! Latest-wins holder for decoded camera frames.
//!
//! The capture side publishes, the render side reads. Nothing is queued:
//! a frame published before the previous one was drawn simply replaces it.

use image::RgbImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An immutable decoded camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Capture sequence number assigned by the producer
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Zero-sized frames cannot be mapped to a display and are treated as missing
    pub fn is_drawable(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

#[derive(Default)]
pub struct FrameSink {
    // Held only for the handle swap or clone, never while drawing.
    current: Mutex<Option<Arc<Frame>>>,
    published: AtomicU64,
}

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame. Safe from any thread.
    pub fn publish(&self, frame: Frame) {
        let frame = Arc::new(frame);
        // The old frame is dropped outside the lock; an in-flight render may still hold it.
        let _previous = {
            let mut slot = self.current.lock();
            slot.replace(frame)
        };
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Most recently published frame, `None` before the first one arrives
    pub fn current(&self) -> Option<Arc<Frame>> {
        self.current.lock().clone()
    }

    /// Number of frames ever published
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u64) -> Frame {
        Frame::new(RgbImage::new(4, 3), seq)
    }

    #[test]
    fn test_empty_before_first_publish() {
        let sink = FrameSink::new();
        assert!(sink.current().is_none());
        assert_eq!(sink.published(), 0);
    }

    #[test]
    fn test_latest_wins() {
        let sink = FrameSink::new();
        sink.publish(frame(1));
        sink.publish(frame(2));
        sink.publish(frame(3));
        let current = sink.current().expect("frame published");
        assert_eq!(current.sequence, 3);
        assert_eq!((current.width(), current.height()), (4, 3));
        assert_eq!(sink.published(), 3);
    }

    #[test]
    fn test_held_frame_survives_replacement() {
        let sink = FrameSink::new();
        sink.publish(frame(1));
        let in_flight = sink.current().expect("frame published");
        sink.publish(frame(2));
        assert_eq!(in_flight.sequence, 1);
        assert_eq!(sink.current().map(|f| f.sequence), Some(2));
    }

    #[test]
    fn test_zero_sized_frame_not_drawable() {
        assert!(!Frame::new(RgbImage::new(0, 10), 0).is_drawable());
        assert!(frame(0).is_drawable());
    }
}
