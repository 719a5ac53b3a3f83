//! The overlay engine: store, frame sink, reconciler thread and rates behind
//! one handle. Producers talk to it through [`EventSender`]; the UI calls
//! [`OverlayEngine::render`] on every paint.

use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::compose::{compose, Composition, OverlayLayers};
use crate::error::Result;
use crate::frame::FrameSink;
use crate::raster::{rasterize, TextRenderer};
use crate::rates::RateSource;
use crate::reconciler::{EventSender, Reconciler, ReconcilerHandle};
use crate::store::OverlayStore;

pub struct OverlayEngine {
    store: Arc<OverlayStore>,
    frames: Arc<FrameSink>,
    rates: Arc<dyn RateSource>,
    layers: Mutex<OverlayLayers>,
    sender: EventSender,
    reconciler: Mutex<Option<ReconcilerHandle>>,
    cancelled: AtomicBool,
}

impl OverlayEngine {
    pub fn start(rates: Arc<dyn RateSource>) -> Result<Self> {
        let store = Arc::new(OverlayStore::new());
        let frames = Arc::new(FrameSink::new());
        let (sender, handle) = Reconciler::new(store.clone(), frames.clone()).spawn()?;
        info!("Overlay engine started");

        Ok(Self {
            store,
            frames,
            rates,
            layers: Mutex::new(OverlayLayers::default()),
            sender,
            reconciler: Mutex::new(Some(handle)),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Producer handle for the capture and detection sides
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Draw list for a display of the given size.
    /// Empty after [`cancel`](Self::cancel) or before the first frame.
    pub fn render(&self, display_w: f32, display_h: f32) -> Composition {
        if self.is_cancelled() {
            return Composition {
                width: display_w,
                height: display_h,
                items: Vec::new(),
            };
        }
        let geometry = self.store.snapshot();
        let frame = self.frames.current();
        let layers = self.layers();
        compose(
            &geometry,
            frame.as_ref().map(|f| (f.width(), f.height())),
            (display_w, display_h),
            &self.rates.snapshot(),
            &layers,
        )
    }

    /// Compose and rasterize over the current frame; `None` once cancelled
    pub fn render_image(&self, display_w: u32, display_h: u32, text: &TextRenderer) -> Option<RgbaImage> {
        if self.is_cancelled() {
            return None;
        }
        // Take the frame first so the composition never refers to a newer one
        let frame = self.frames.current();
        let geometry = self.store.snapshot();
        let composition = compose(
            &geometry,
            frame.as_ref().map(|f| (f.width(), f.height())),
            (display_w as f32, display_h as f32),
            &self.rates.snapshot(),
            &self.layers(),
        );
        Some(rasterize(frame.as_deref(), &composition, display_w, display_h, text))
    }

    /// Stop delivery and join the reconciler. Idempotent.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        // Release the lock before joining
        let handle = self.reconciler.lock().take();
        if let Some(mut handle) = handle {
            handle.shutdown();
            info!("Overlay engine cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn set_layers(&self, layers: OverlayLayers) {
        *self.layers.lock() = layers;
    }

    pub fn layers(&self) -> OverlayLayers {
        *self.layers.lock()
    }

    pub fn store(&self) -> &Arc<OverlayStore> {
        &self.store
    }

    pub fn frames(&self) -> &Arc<FrameSink> {
        &self.frames
    }

    pub fn rates(&self) -> &Arc<dyn RateSource> {
        &self.rates
    }
}

impl Drop for OverlayEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}
