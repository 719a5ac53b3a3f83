//! Live rate counters read by the renderer.
//!
//! The rates belong to the capture/detection side; the overlay only reads
//! them through [`RateSource`]. [`RateCounters`] is the implementation the
//! producers in this crate feed.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSnapshot {
    pub camera_fps: f64,
    pub landmark_fps: f64,
    pub detected_fps: f64,
}

pub trait RateSource: Send + Sync {
    fn camera_fps(&self) -> f64;
    fn landmark_fps(&self) -> f64;
    fn detected_fps(&self) -> f64;

    fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            camera_fps: self.camera_fps(),
            landmark_fps: self.landmark_fps(),
            detected_fps: self.detected_fps(),
        }
    }
}

/// Fixed rates, for hosts that compute them elsewhere
impl RateSource for RateSnapshot {
    fn camera_fps(&self) -> f64 {
        self.camera_fps
    }

    fn landmark_fps(&self) -> f64 {
        self.landmark_fps
    }

    fn detected_fps(&self) -> f64 {
        self.detected_fps
    }
}

#[derive(Debug, Default)]
struct MeterState {
    last: Option<Instant>,
    rate: f64,
    initialized: bool,
}

/// Events per second, smoothed with an exponential moving average
#[derive(Debug)]
pub struct RateMeter {
    state: Mutex<MeterState>,
    alpha: f64,
    stale_after: Duration,
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl RateMeter {
    pub fn new(alpha: f64) -> Self {
        Self {
            state: Mutex::new(MeterState::default()),
            alpha: alpha.clamp(0.0, 1.0),
            stale_after: Duration::from_secs(2),
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn tick(&self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&self, now: Instant) {
        let mut state = self.state.lock();
        if let Some(last) = state.last {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant_rate = 1.0 / dt;
                if state.initialized {
                    state.rate = self.alpha * instant_rate + (1.0 - self.alpha) * state.rate;
                } else {
                    state.rate = instant_rate;
                    state.initialized = true;
                }
            }
        }
        state.last = Some(now);
    }

    pub fn rate(&self) -> f64 {
        self.rate_at(Instant::now())
    }

    /// Smoothed rate; 0 when nothing ticked within the stale window
    pub fn rate_at(&self, now: Instant) -> f64 {
        let state = self.state.lock();
        match state.last {
            Some(last) if now.saturating_duration_since(last) <= self.stale_after => state.rate,
            _ => 0.0,
        }
    }

    pub fn reset(&self) {
        *self.state.lock() = MeterState::default();
    }
}

/// Camera, landmark (AI) and detected rates
#[derive(Debug, Default)]
pub struct RateCounters {
    pub camera: RateMeter,
    pub landmark: RateMeter,
    pub detected: RateMeter,
}

impl RateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.camera.reset();
        self.landmark.reset();
        self.detected.reset();
    }
}

impl RateSource for RateCounters {
    fn camera_fps(&self) -> f64 {
        self.camera.rate()
    }

    fn landmark_fps(&self) -> f64 {
        self.landmark.rate()
    }

    fn detected_fps(&self) -> f64 {
        self.detected.rate()
    }
}
