use clap::Parser;
use std::path::PathBuf;

use crate::config::{AppConfig, DEFAULT_PATH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file (created with defaults if missing)
    #[arg(long, default_value = DEFAULT_PATH)]
    pub config: PathBuf,

    /// Display width, overrides the config
    #[arg(long)]
    pub width: Option<u32>,

    /// Display height, overrides the config
    #[arg(long)]
    pub height: Option<u32>,

    /// Mirror the camera output
    #[arg(long, default_value_t = false)]
    pub mirror: bool,
}

impl Args {
    /// Fold command line overrides into the loaded config
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.ui.display_width = width;
        }
        if let Some(height) = self.height {
            config.ui.display_height = height;
        }
        if self.mirror {
            config.ui.mirror_mode = true;
        }
        config.simulator.mirror = config.ui.mirror_mode;
    }
}
