use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, Canvas};
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct FontRenderer {
    font: Font<'static>,
}

/// Common install locations for `{family}.ttf` on macOS and Linux
fn candidate_paths(family: &str) -> Vec<PathBuf> {
    let file = format!("{}.ttf", family);
    let mut paths: Vec<PathBuf> = [
        "/Library/Fonts",
        "/System/Library/Fonts",
        "/System/Library/Fonts/Supplemental",
        "/usr/share/fonts/truetype",
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/TTF",
        "/usr/share/fonts/dejavu",
    ]
    .iter()
    .map(|dir| Path::new(dir).join(&file))
    .collect();
    // Working directory last
    paths.push(PathBuf::from(file));
    paths
}

impl FontRenderer {
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Self { font })
    }

    pub fn try_load(family: &str) -> Option<Self> {
        for path in candidate_paths(family) {
            if !path.exists() {
                continue;
            }
            if let Some(renderer) = fs::read(&path).ok().and_then(Self::from_bytes) {
                info!("Loaded font from {}", path.display());
                return Some(renderer);
            }
        }

        warn!("Could not find font family '{}'. Falling back to bitmap.", family);
        None
    }

    /// Draw one line with its top edge at `y`; glyph coverage scales the alpha
    pub fn draw_text(
        &self,
        canvas: &mut Blend<RgbaImage>,
        x: f32,
        y: f32,
        text: &str,
        color: Rgba<u8>,
        size_px: f32,
    ) {
        let (width, height) = canvas.dimensions();
        let scale = Scale::uniform(size_px);
        let v_metrics = self.font.v_metrics(scale);
        let start = point(x, y + v_metrics.ascent);

        for glyph in self.font.layout(text, scale, start) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let alpha = (coverage * color.0[3] as f32) as u8;
                if alpha > 0 {
                    let [r, g, b, _] = color.0;
                    canvas.draw_pixel(px as u32, py as u32, Rgba([r, g, b, alpha]));
                }
            });
        }
    }

    pub fn line_height(&self, size_px: f32) -> f32 {
        let v_metrics = self.font.v_metrics(Scale::uniform(size_px));
        v_metrics.ascent - v_metrics.descent + v_metrics.line_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_end_with_working_dir() {
        let paths = candidate_paths("Arial");
        assert_eq!(paths.last(), Some(&PathBuf::from("Arial.ttf")));
        assert!(paths.iter().all(|p| p.to_string_lossy().ends_with("Arial.ttf")));
    }

    #[test]
    fn test_garbage_is_not_a_font() {
        assert!(FontRenderer::from_bytes(vec![0, 1, 2, 3]).is_none());
        assert!(FontRenderer::try_load("definitely-not-a-font-family").is_none());
    }
}
