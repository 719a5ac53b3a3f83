//! Headless renderer: runs the simulator for a moment and writes one overlay frame as PNG.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use gaze_overlay::args::Args;
use gaze_overlay::config::AppConfig;
use gaze_overlay::raster::TextRenderer;
use gaze_overlay::simulate::Simulator;
use gaze_overlay::{OverlayEngine, RateCounters};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render one overlay frame to a PNG", long_about = None)]
struct SnapshotArgs {
    #[command(flatten)]
    common: Args,

    /// PNG file to write
    #[arg(long, default_value = "overlay_snapshot.png")]
    output: PathBuf,

    /// Let the producers run this long before rendering
    #[arg(long, default_value_t = 500)]
    warmup_ms: u64,
}

fn main() -> Result<()> {
    gaze_overlay::init_tracing();
    let args = SnapshotArgs::parse();

    let mut config = AppConfig::load(&args.common.config)?;
    args.common.apply(&mut config);

    let rates = Arc::new(RateCounters::new());
    let engine = OverlayEngine::start(rates.clone()).context("starting overlay engine")?;
    engine.set_layers(config.layers);
    let mut simulator = Simulator::spawn(engine.sender(), rates, config.simulator.clone())
        .context("starting simulated camera")?;

    std::thread::sleep(Duration::from_millis(args.warmup_ms));
    // A slow machine may not have produced a frame yet
    let deadline = Instant::now() + Duration::from_secs(2);
    while engine.frames().current().is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    let text = TextRenderer::load(&config.ui.font_family);
    let image = engine
        .render_image(config.ui.display_width, config.ui.display_height, &text)
        .context("engine stopped before rendering")?;
    simulator.stop();
    engine.cancel();

    info!(
        frames = engine.frames().published(),
        detections = engine.store().generation(),
        "Rendered snapshot"
    );
    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("{}", format!("Wrote {}", args.output.display()).green());
    Ok(())
}
