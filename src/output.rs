use anyhow::Result;
use image::RgbaImage;
use std::time::Duration;

/// Preview window backed by minifb
pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
}

/// Pack RGBA pixels into minifb's 0RGB words; alpha is dropped
pub fn to_argb_words(image: &RgbaImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(image.pixels().map(|p| {
        let [r, g, b, _] = p.0;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }));
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize, target_fps: u32) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        let fps = target_fps.max(1) as u64;
        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / fps)));

        Ok(Self {
            window,
            buffer: Vec::with_capacity(width * height),
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn is_key_down(&self, key: minifb::Key) -> bool {
        self.window.is_key_down(key)
    }

    /// Keys that went down since the last update, without repeats
    pub fn keys_pressed(&self) -> Vec<minifb::Key> {
        self.window.get_keys_pressed(minifb::KeyRepeat::No)
    }

    /// Current client area size
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    pub fn update(&mut self, image: &RgbaImage) -> Result<()> {
        to_argb_words(image, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, image.width() as usize, image.height() as usize)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))
    }

    /// Pump events without drawing, e.g. before the first frame arrives
    pub fn idle(&mut self) {
        self.window.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_drops_alpha() {
        let image = RgbaImage::from_pixel(2, 1, image::Rgba([0x12, 0x34, 0x56, 0x00]));
        let mut words = vec![7; 5];
        to_argb_words(&image, &mut words);
        assert_eq!(words, vec![0x123456, 0x123456]);
    }
}
