//! Fan-in of the producer streams onto the overlay store and frame sink.
//!
//! Detection events (results and failures) share one unbounded channel so
//! their order is preserved and none is ever dropped. Frames go through a
//! single-slot channel where a new frame evicts the stale one. A single
//! reconciler thread drains both and applies them; producers never block.

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

use crate::error::{OverlayError, Result};
use crate::frame::{Frame, FrameSink};
use crate::store::{OverlayGeometry, OverlayStore};
use crate::types::DetectionResult;

/// One update from a producer
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    DetectionFailed,
    FrameReady(Frame),
    DetectionResult(DetectionResult),
}

#[derive(Debug)]
enum DetectionEvent {
    Failed,
    Result(DetectionResult),
}

/// Cloneable producer handle; every method returns immediately
#[derive(Clone)]
pub struct EventSender {
    frames_tx: Sender<Frame>,
    // Kept so a producer can evict the stale frame when the slot is full
    frames_rx: Receiver<Frame>,
    detections_tx: Sender<DetectionEvent>,
    closed: Arc<AtomicBool>,
}

impl EventSender {
    pub fn on_detection_failed(&self) -> Result<()> {
        self.send_detection(DetectionEvent::Failed)
    }

    pub fn on_detection_result(&self, result: DetectionResult) -> Result<()> {
        self.send_detection(DetectionEvent::Result(result))
    }

    /// Offer a frame; if the reconciler has not taken the previous one yet, it is replaced
    pub fn on_frame_ready(&self, frame: Frame) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(OverlayError::Disconnected);
        }
        match self.frames_tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(frame)) => {
                let _stale = self.frames_rx.try_recv();
                match self.frames_tx.try_send(frame) {
                    // Lost the slot to a concurrent producer: theirs is just as fresh
                    Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
                    Err(TrySendError::Disconnected(_)) => Err(OverlayError::Disconnected),
                }
            }
            Err(TrySendError::Disconnected(_)) => Err(OverlayError::Disconnected),
        }
    }

    pub fn send(&self, event: OverlayEvent) -> Result<()> {
        match event {
            OverlayEvent::DetectionFailed => self.on_detection_failed(),
            OverlayEvent::FrameReady(frame) => self.on_frame_ready(frame),
            OverlayEvent::DetectionResult(result) => self.on_detection_result(result),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send_detection(&self, event: DetectionEvent) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(OverlayError::Disconnected);
        }
        self.detections_tx
            .send(event)
            .map_err(|_| OverlayError::Disconnected)
    }
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<OverlayStore>,
    sink: Arc<FrameSink>,
}

impl Reconciler {
    pub fn new(store: Arc<OverlayStore>, sink: Arc<FrameSink>) -> Self {
        Self { store, sink }
    }

    /// Apply one event synchronously on the calling thread
    pub fn apply(&self, event: OverlayEvent) {
        match event {
            OverlayEvent::DetectionFailed => self.apply_detection(DetectionEvent::Failed),
            OverlayEvent::DetectionResult(result) => {
                self.apply_detection(DetectionEvent::Result(result))
            }
            OverlayEvent::FrameReady(frame) => self.sink.publish(frame),
        }
    }

    fn apply_detection(&self, event: DetectionEvent) {
        match event {
            DetectionEvent::Failed => {
                debug!("Detection failed, clearing overlay");
                self.store.clear();
            }
            DetectionEvent::Result(result) => {
                // Built before publishing so the store only ever swaps whole snapshots
                let geometry = OverlayGeometry::from(result);
                debug!(
                    landmarks = geometry.landmark_points.len(),
                    eye_points = geometry.eye_points.len(),
                    confidence = geometry.confidence,
                    "Detection result"
                );
                self.store.replace(geometry);
            }
        }
    }

    /// Start the reconciler thread. Returns the producer handle and the thread handle.
    pub fn spawn(self) -> std::io::Result<(EventSender, ReconcilerHandle)> {
        let (frames_tx, frames_rx) = bounded::<Frame>(1);
        let (detections_tx, detections_rx) = unbounded::<DetectionEvent>();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let closed = Arc::new(AtomicBool::new(false));

        let sender = EventSender {
            frames_tx,
            frames_rx: frames_rx.clone(),
            detections_tx,
            closed: closed.clone(),
        };

        let worker_closed = closed.clone();
        let thread = std::thread::Builder::new()
            .name("overlay-reconciler".to_string())
            .spawn(move || {
                info!("Reconciler started");
                loop {
                    select! {
                        recv(shutdown_rx) -> _ => break,
                        recv(detections_rx) -> msg => match msg {
                            Ok(event) => self.apply_detection(event),
                            // Every producer handle is gone
                            Err(_) => break,
                        },
                        recv(frames_rx) -> msg => match msg {
                            Ok(frame) => self.sink.publish(frame),
                            Err(_) => break,
                        },
                    }
                }
                worker_closed.store(true, Ordering::Release);
                info!("Reconciler stopped");
            })?;

        Ok((
            sender,
            ReconcilerHandle {
                shutdown_tx: Some(shutdown_tx),
                thread: Some(thread),
                closed,
            },
        ))
    }
}

/// Owns the reconciler thread; stopping it (or dropping the handle) ends delivery
pub struct ReconcilerHandle {
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    closed: Arc<AtomicBool>,
}

impl ReconcilerHandle {
    /// Stop delivery and wait for the thread. An event already being applied finishes first.
    pub fn shutdown(&mut self) {
        self.closed.store(true, Ordering::Release);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some() && !self.closed.load(Ordering::Acquire)
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use image::RgbImage;
    use std::time::{Duration, Instant};

    fn parts() -> (Arc<OverlayStore>, Arc<FrameSink>, Reconciler) {
        let store = Arc::new(OverlayStore::new());
        let sink = Arc::new(FrameSink::new());
        let reconciler = Reconciler::new(store.clone(), sink.clone());
        (store, sink, reconciler)
    }

    fn result(confidence: f32) -> DetectionResult {
        DetectionResult {
            confidence,
            face_scale: 1.0,
            landmarks: vec![Point::new(1.0, 1.0); 3],
            landmark_visibility: vec![true; 3],
            ..Default::default()
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_apply_routes_events() {
        let (store, sink, reconciler) = parts();

        reconciler.apply(OverlayEvent::DetectionResult(result(0.7)));
        assert_eq!(store.snapshot().confidence, 0.7);

        reconciler.apply(OverlayEvent::FrameReady(Frame::new(RgbImage::new(8, 6), 4)));
        assert_eq!(sink.current().map(|f| f.sequence), Some(4));

        reconciler.apply(OverlayEvent::DetectionFailed);
        assert!(store.snapshot().is_empty());
        // Frames are not touched by a detection failure
        assert!(sink.current().is_some());
    }

    #[test]
    fn test_threaded_detection_order_preserved() {
        let (store, _sink, reconciler) = parts();
        let (sender, mut handle) = reconciler.spawn().expect("spawn reconciler");

        for i in 1..=50 {
            sender.on_detection_result(result(i as f32 / 100.0)).unwrap();
        }
        sender.on_detection_failed().unwrap();
        sender.on_detection_result(result(0.99)).unwrap();

        assert!(wait_until(|| store.generation() == 52));
        assert_eq!(store.snapshot().confidence, 0.99);
        handle.shutdown();
    }

    #[test]
    fn test_frames_latest_wins() {
        let (_store, sink, reconciler) = parts();
        let (sender, mut handle) = reconciler.spawn().expect("spawn reconciler");

        for seq in 0..200 {
            sender
                .on_frame_ready(Frame::new(RgbImage::new(2, 2), seq))
                .unwrap();
        }
        assert!(wait_until(|| sink.current().map(|f| f.sequence) == Some(199)));
        assert!(sink.published() <= 200);
        handle.shutdown();
    }

    #[test]
    fn test_send_after_shutdown_is_disconnected() {
        let (_store, _sink, reconciler) = parts();
        let (sender, mut handle) = reconciler.spawn().expect("spawn reconciler");
        handle.shutdown();
        assert!(!handle.is_running());
        assert!(sender.is_closed());
        assert!(matches!(
            sender.on_detection_failed(),
            Err(OverlayError::Disconnected)
        ));
        assert!(matches!(
            sender.on_frame_ready(Frame::new(RgbImage::new(1, 1), 0)),
            Err(OverlayError::Disconnected)
        ));
    }

    #[test]
    fn test_dropping_all_senders_stops_worker() {
        let (_store, _sink, reconciler) = parts();
        let (sender, handle) = reconciler.spawn().expect("spawn reconciler");
        let probe = sender.closed.clone();
        drop(sender);
        assert!(wait_until(|| probe.load(Ordering::Acquire)));
        drop(handle);
    }
}
