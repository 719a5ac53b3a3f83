use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use minifb::Key;
use std::sync::Arc;
use tracing::info;

use gaze_overlay::args::Args;
use gaze_overlay::config::AppConfig;
use gaze_overlay::output::WindowOutput;
use gaze_overlay::raster::TextRenderer;
use gaze_overlay::simulate::Simulator;
use gaze_overlay::{Layer, OverlayEngine, RateCounters};

const TITLE: &str = "Gaze Overlay";

fn layer_for_key(key: Key) -> Option<Layer> {
    match key {
        Key::Key1 => Some(Layer::Box),
        Key::Key2 => Some(Layer::Landmarks),
        Key::Key3 => Some(Layer::Eyes),
        Key::Key4 => Some(Layer::Gaze),
        Key::Key5 => Some(Layer::Confidence),
        Key::Key6 => Some(Layer::Fps),
        Key::Key7 => Some(Layer::Pose),
        _ => None,
    }
}

fn main() -> Result<()> {
    gaze_overlay::init_tracing();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    args.apply(&mut config);

    let rates = Arc::new(RateCounters::new());
    let engine = OverlayEngine::start(rates.clone()).context("starting overlay engine")?;
    engine.set_layers(config.layers);

    let mut simulator = Simulator::spawn(engine.sender(), rates, config.simulator.clone())
        .context("starting simulated camera")?;
    println!(
        "{}",
        format!(
            "Opened simulated camera: {}x{} @ {} fps",
            config.simulator.frame_width, config.simulator.frame_height, config.simulator.camera_fps
        )
        .green()
    );

    let text = TextRenderer::load(&config.ui.font_family);
    let mut window = WindowOutput::new(
        TITLE,
        config.ui.display_width as usize,
        config.ui.display_height as usize,
        config.ui.target_fps,
    )?;
    println!("Controls: [P] Pause [R] Reset [1] Box [2] Landmarks [3] Eyes [4] Gaze [5] Confidence [6] FPS [7] Pose [Esc] Quit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        for key in window.keys_pressed() {
            match key {
                Key::P => {
                    if simulator.is_paused() {
                        simulator.resume();
                        window.set_title(TITLE);
                    } else {
                        simulator.pause();
                        window.set_title(&format!("{} (paused)", TITLE));
                    }
                }
                Key::R => simulator.reset(),
                other => {
                    if let Some(layer) = layer_for_key(other) {
                        let mut layers = engine.layers();
                        let shown = layers.toggle(layer);
                        engine.set_layers(layers);
                        info!("{:?} layer {}", layer, if shown { "on" } else { "off" });
                    }
                }
            }
        }

        let (width, height) = window.size();
        if width == 0 || height == 0 {
            window.idle();
            continue;
        }
        match engine.render_image(width as u32, height as u32, &text) {
            Some(image) => window.update(&image)?,
            None => break,
        }
    }

    // Producers first, so nothing is sent into a closed engine
    simulator.stop();
    engine.cancel();

    // Keep layer choices for the next run
    config.layers = engine.layers();
    config.save(&args.config)?;
    info!("Shut down cleanly");
    Ok(())
}
