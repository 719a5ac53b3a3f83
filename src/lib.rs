pub mod args;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod eye_topology;
pub mod font;
pub mod frame;
#[cfg(feature = "window")]
pub mod output;
pub mod pose;
pub mod raster;
pub mod rates;
pub mod reconciler;
pub mod simulate;
pub mod store;
pub mod ttf;
pub mod types;


pub use compose::{compose, Composition, DrawCommand, Layer, OverlayLayers};
pub use engine::OverlayEngine;
pub use error::{OverlayError, Result};
pub use frame::{Frame, FrameSink};
pub use rates::{RateCounters, RateSnapshot, RateSource};
pub use reconciler::{EventSender, OverlayEvent, Reconciler};
pub use store::{OverlayGeometry, OverlayStore};
pub use types::{DetectionResult, HeadPose, Point, Rgba, Segment};

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
