use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::compose::OverlayLayers;
use crate::simulate::SimulatorSettings;

pub const DEFAULT_PATH: &str = "overlay_config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layers: OverlayLayers,
    pub ui: UiConfig,
    pub simulator: SimulatorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// TrueType family, e.g. "DejaVuSans"; the bitmap font is used if it cannot be found
    pub font_family: String,
    pub display_width: u32,
    pub display_height: u32,
    pub mirror_mode: bool,
    /// Preview repaint rate
    pub target_fps: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_family: "DejaVuSans".to_string(),
            display_width: 800,
            display_height: 600,
            mirror_mode: true,
            target_fps: 60,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file is missing or
    /// unreadable. The result is written back so new fields show up in the file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            // Missing fields take their defaults via #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        config.save(path)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay_config.json");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay_config.json");
        fs::write(&path, r#"{ "layers": { "show_fps": false }, "ui": { "display_width": 1024 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(!config.layers.show_fps);
        assert!(config.layers.show_box);
        assert_eq!(config.ui.display_width, 1024);
        assert_eq!(config.ui.display_height, 600);
        assert_eq!(config.simulator, SimulatorSettings::default());

        // Written back with every field present
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"fail_every\""));
        assert!(saved.contains("\"show_pose\""));
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay_config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_mirror_is_not_persisted_with_simulator() {
        let mut config = AppConfig::default();
        config.simulator.mirror = true;
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("\"mirror\""));
        assert!(json.contains("\"mirror_mode\""));
    }
}
