//! Synthetic capture and detection producers.
//!
//! Stands in for a camera and a face tracker: a capture thread renders
//! gradient frames with a face-shaped blob, a detection thread reports
//! geometry for the same blob. Both follow one shared clock so the overlay
//! lines up with the frame content.

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_ellipse_mut;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::frame::Frame;
use crate::rates::RateCounters;
use crate::reconciler::EventSender;
use crate::types::{DetectionResult, HeadPose, Point, Segment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub frame_width: u32,
    pub frame_height: u32,
    pub camera_fps: f32,
    pub detection_fps: f32,
    /// Every n-th detection reports a failure; 0 never fails
    pub fail_every: u32,
    /// Set from the UI config, not stored with the simulator section
    #[serde(skip)]
    pub mirror: bool,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            camera_fps: 30.0,
            detection_fps: 15.0,
            fail_every: 40,
            mirror: false,
        }
    }
}

fn period(fps: f32) -> Duration {
    Duration::from_secs_f32(1.0 / fps.max(0.1))
}

/// Where the simulated face is at time `t` (seconds)
#[derive(Debug, Clone, Copy)]
struct Face {
    center: Point,
    width: f32,
    height: f32,
    face_scale: f32,
    confidence: f32,
    pitch: f32,
    yaw: f32,
    roll: f32,
    gaze: Point,
}

fn face_at(t: f32, frame_w: f32, frame_h: f32) -> Face {
    let base_width = frame_w * 0.28;
    let width = base_width * (0.9 + 0.1 * (t * 0.5).sin());
    let yaw = 0.4 * (t * 0.6).sin();
    Face {
        // Lissajous path around the frame center
        center: Point::new(
            frame_w / 2.0 + frame_w * 0.2 * (t * 0.9).sin(),
            frame_h / 2.0 + frame_h * 0.15 * (t * 1.3 + 0.5).sin(),
        ),
        width,
        height: width * 1.25,
        face_scale: width / base_width,
        confidence: 0.65 + 0.3 * (t * 0.7).sin(),
        pitch: 0.25 * (t * 0.8).sin(),
        yaw,
        roll: 0.1 * (t * 0.4).sin(),
        gaze: Point::new((t * 1.1).sin(), 0.5 * (t * 0.8).cos()),
    }
}

/// `n` points on an ellipse, starting at angle `start` and running clockwise on screen
fn ring(center: Point, rx: f32, ry: f32, n: usize, start: f32) -> impl Iterator<Item = Point> {
    (0..n).map(move |k| {
        let a = start + 2.0 * PI * k as f32 / n as f32;
        Point::new(center.x + rx * a.cos(), center.y + ry * a.sin())
    })
}

/// `n` evenly spaced points from `from` to `to`, both included
fn span(from: Point, to: Point, n: usize) -> impl Iterator<Item = Point> {
    let steps = n.saturating_sub(1).max(1) as f32;
    (0..n).map(move |k| from + (to - from) * (k as f32 / steps))
}

/// 68 points in the usual jaw, brows, nose, eyes, mouth order
fn face_landmarks(face: &Face) -> Vec<Point> {
    let Face { center: c, width: w, height: h, .. } = *face;
    let mut points = Vec::with_capacity(68);

    // Jaw, lower half of the face outline from left to right
    points.extend((0..17).map(|k| {
        let a = PI * (1.0 - k as f32 / 16.0);
        Point::new(c.x + 0.5 * w * a.cos(), c.y + 0.1 * h + 0.4 * h * a.sin())
    }));
    for side in [-1.0f32, 1.0] {
        let inner = Point::new(c.x + side * 0.08 * w, c.y - 0.22 * h);
        let outer = Point::new(c.x + side * 0.35 * w, c.y - 0.2 * h);
        // Brows run left to right on screen
        let (from, to) = if side < 0.0 { (outer, inner) } else { (inner, outer) };
        points.extend(span(from, to, 5));
    }
    points.extend(span(Point::new(c.x, c.y - 0.15 * h), Point::new(c.x, c.y + 0.05 * h), 4));
    points.extend(span(
        Point::new(c.x - 0.08 * w, c.y + 0.1 * h),
        Point::new(c.x + 0.08 * w, c.y + 0.1 * h),
        5,
    ));
    for side in [-1.0f32, 1.0] {
        let eye = Point::new(c.x + side * 0.18 * w, c.y - 0.1 * h);
        points.extend(ring(eye, 0.09 * w, 0.04 * w, 6, PI));
    }
    let mouth = Point::new(c.x, c.y + 0.25 * h);
    points.extend(ring(mouth, 0.18 * w, 0.06 * h, 12, PI));
    points.extend(ring(mouth, 0.12 * w, 0.03 * h, 8, PI));
    points
}

/// Jaw points on the far side of a turned head are flagged hidden
fn landmark_visibility(face: &Face) -> Vec<bool> {
    (0..68)
        .map(|i| match i {
            0..=3 => face.yaw <= 0.2,
            13..=16 => face.yaw >= -0.2,
            _ => true,
        })
        .collect()
}

/// Two 28-point eye blocks: iris ring, eyelid ring, pupil ring
fn eye_landmarks(face: &Face) -> (Vec<Point>, Vec<Segment>) {
    let Face { center: c, width: w, height: h, .. } = *face;
    let offset = Point::new(face.gaze.x * 0.03 * w, face.gaze.y * 0.03 * w);
    let mut points = Vec::with_capacity(56);
    let mut gaze = Vec::with_capacity(2);
    for side in [-1.0f32, 1.0] {
        let eye = Point::new(c.x + side * 0.18 * w, c.y - 0.1 * h);
        let pupil = eye + offset;
        points.extend(ring(pupil, 0.045 * w, 0.045 * w, 8, 0.0));
        points.extend(ring(eye, 0.09 * w, 0.045 * w, 12, PI));
        points.extend(ring(pupil, 0.02 * w, 0.02 * w, 8, 0.0));
        gaze.push(Segment::new(pupil, pupil + face.gaze * (0.12 * w)));
    }
    (points, gaze)
}

fn mirror_point(p: Point, frame_w: f32) -> Point {
    Point::new(frame_w - p.x, p.y)
}

/// The detection the simulated tracker reports at time `t`
pub fn synthetic_detection(t: f32, frame_w: f32, frame_h: f32, mirror: bool) -> DetectionResult {
    let face = face_at(t, frame_w, frame_h);
    let half = Point::new(face.width / 2.0, face.height / 2.0);
    let (x0, y0) = (face.center.x - half.x, face.center.y - half.y);
    let (x1, y1) = (face.center.x + half.x, face.center.y + half.y);
    let corners = [
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ];
    let box_lines = (0..4)
        .map(|i| Segment::new(corners[i], corners[(i + 1) % 4]))
        .collect();
    let (eye_points, gaze_lines) = eye_landmarks(&face);

    let mut result = DetectionResult {
        confidence: face.confidence,
        face_scale: face.face_scale,
        box_lines,
        landmarks: face_landmarks(&face),
        landmark_visibility: landmark_visibility(&face),
        eye_landmarks: eye_points,
        gaze_lines,
        pose: Some(HeadPose {
            translation_mm: [
                (face.center.x - frame_w / 2.0) * 0.5,
                (face.center.y - frame_h / 2.0) * 0.5,
                600.0 / face.face_scale,
            ],
            rotation_rad: [face.pitch, face.yaw, face.roll],
        }),
    };

    if mirror {
        let flip = |p: &mut Point| *p = mirror_point(*p, frame_w);
        result.landmarks.iter_mut().for_each(flip);
        result.eye_landmarks.iter_mut().for_each(flip);
        for segment in result.box_lines.iter_mut().chain(result.gaze_lines.iter_mut()) {
            flip(&mut segment.from);
            flip(&mut segment.to);
        }
        if let Some(pose) = result.pose.as_mut() {
            pose.translation_mm[0] = -pose.translation_mm[0];
            pose.rotation_rad[1] = -pose.rotation_rad[1];
            pose.rotation_rad[2] = -pose.rotation_rad[2];
        }
    }
    result
}

/// The camera frame at time `t`
pub fn synthetic_frame(t: f32, width: u32, height: u32, mirror: bool) -> RgbImage {
    let shade = (128.0 + 64.0 * (t * 0.3).sin()) as u8;
    let mut image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            shade,
        ])
    });
    let face = face_at(t, width as f32, height as f32);
    draw_filled_ellipse_mut(
        &mut image,
        (face.center.x as i32, face.center.y as i32),
        (face.width / 2.0) as i32,
        (face.height / 2.0) as i32,
        Rgb([224, 172, 140]),
    );
    if mirror {
        imageops::flip_horizontal_in_place(&mut image);
    }
    image
}

struct Shared {
    start: Mutex<Instant>,
    paused: AtomicBool,
    stop: AtomicBool,
}

impl Shared {
    fn elapsed(&self) -> f32 {
        self.start.lock().elapsed().as_secs_f32()
    }
}

pub struct Simulator {
    shared: Arc<Shared>,
    sender: EventSender,
    rates: Arc<RateCounters>,
    threads: Vec<JoinHandle<()>>,
}

impl Simulator {
    pub fn spawn(
        sender: EventSender,
        rates: Arc<RateCounters>,
        settings: SimulatorSettings,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            start: Mutex::new(Instant::now()),
            paused: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        });

        let capture = {
            let (shared, sender, rates, settings) =
                (shared.clone(), sender.clone(), rates.clone(), settings.clone());
            std::thread::Builder::new()
                .name("sim-capture".to_string())
                .spawn(move || capture_loop(&shared, &sender, &rates, &settings))?
        };
        let detection = {
            let (shared, sender, rates) = (shared.clone(), sender.clone(), rates.clone());
            let settings = settings.clone();
            std::thread::Builder::new()
                .name("sim-detection".to_string())
                .spawn(move || detection_loop(&shared, &sender, &rates, &settings))?
        };
        info!(
            "Simulator running: {}x{} @ {} fps, detection @ {} fps",
            settings.frame_width, settings.frame_height, settings.camera_fps, settings.detection_fps
        );

        Ok(Self {
            shared,
            sender,
            rates,
            threads: vec![capture, detection],
        })
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
        info!("Simulator paused");
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
        info!("Simulator resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Restart the clock, zero the rates and clear the overlay
    pub fn reset(&self) {
        *self.shared.start.lock() = Instant::now();
        self.rates.reset();
        let _ = self.sender.on_detection_failed();
        info!("Simulator reset");
    }

    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn running(shared: &Shared) -> bool {
    !shared.stop.load(Ordering::Acquire)
}

fn capture_loop(shared: &Shared, sender: &EventSender, rates: &RateCounters, settings: &SimulatorSettings) {
    let interval = period(settings.camera_fps);
    let mut sequence = 0u64;
    while running(shared) {
        if !shared.paused.load(Ordering::Acquire) {
            let image = synthetic_frame(
                shared.elapsed(),
                settings.frame_width,
                settings.frame_height,
                settings.mirror,
            );
            sequence += 1;
            if sender.on_frame_ready(Frame::new(image, sequence)).is_err() {
                debug!("Overlay closed, capture stopping");
                break;
            }
            rates.camera.tick();
        }
        std::thread::sleep(interval);
    }
}

fn detection_loop(shared: &Shared, sender: &EventSender, rates: &RateCounters, settings: &SimulatorSettings) {
    let interval = period(settings.detection_fps);
    let mut attempts = 0u64;
    while running(shared) {
        if !shared.paused.load(Ordering::Acquire) {
            attempts += 1;
            rates.landmark.tick();
            let sent = if settings.fail_every > 0 && attempts % settings.fail_every as u64 == 0 {
                sender.on_detection_failed()
            } else {
                let result = synthetic_detection(
                    shared.elapsed(),
                    settings.frame_width as f32,
                    settings.frame_height as f32,
                    settings.mirror,
                );
                rates.detected.tick();
                sender.on_detection_result(result)
            };
            if sent.is_err() {
                debug!("Overlay closed, detection stopping");
                break;
            }
        }
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eye_topology::TRACKER_EYE_TOPOLOGY;

    #[test]
    fn test_detection_shape() {
        let d = synthetic_detection(1.3, 640.0, 480.0, false);
        assert_eq!(d.box_lines.len(), 4);
        assert_eq!(d.landmarks.len(), 68);
        assert_eq!(d.landmark_visibility.len(), 68);
        assert_eq!(d.eye_landmarks.len(), 56);
        assert_eq!(d.gaze_lines.len(), 2);
        assert!(d.pose.is_some());
        assert_eq!(TRACKER_EYE_TOPOLOGY.pairs(d.eye_landmarks.len()).len(), 56);
    }

    #[test]
    fn test_detection_stays_in_frame() {
        for step in 0..200 {
            let t = step as f32 * 0.37;
            let d = synthetic_detection(t, 640.0, 480.0, false);
            assert!((0.0..=1.0).contains(&d.confidence), "t={} confidence {}", t, d.confidence);
            for p in d.landmarks.iter().chain(d.eye_landmarks.iter()) {
                assert!(p.x >= 0.0 && p.x <= 640.0 && p.y >= 0.0 && p.y <= 480.0, "t={} {:?}", t, p);
            }
        }
    }

    #[test]
    fn test_turned_head_hides_far_jaw() {
        // yaw = 0.4 sin(0.6 t) peaks near t = 2.6
        let d = synthetic_detection(2.6, 640.0, 480.0, false);
        assert!(!d.landmark_visibility[0]);
        assert!(d.landmark_visibility[16]);
    }

    #[test]
    fn test_mirror_flips_x() {
        let plain = synthetic_detection(0.7, 640.0, 480.0, false);
        let mirrored = synthetic_detection(0.7, 640.0, 480.0, true);
        let (a, b) = (plain.landmarks[0], mirrored.landmarks[0]);
        assert!((a.x + b.x - 640.0).abs() < 1e-3);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_frame_has_face_blob() {
        let img = synthetic_frame(0.0, 64, 48, false);
        assert_eq!(img.dimensions(), (64, 48));
        let face = face_at(0.0, 64.0, 48.0);
        let p = img.get_pixel(face.center.x as u32, face.center.y as u32);
        assert_eq!(p.0, [224, 172, 140]);
    }
}
