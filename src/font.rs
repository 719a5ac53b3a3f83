//! A tiny 3x5 bitmap font, used when no TrueType font can be loaded.
//! Lowercase letters draw as uppercase; unknown characters draw as a block.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, Canvas};

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

/// Pixel scale that makes a glyph roughly `size_px` tall including leading
pub fn scale_for(size_px: f32) -> u32 {
    ((size_px / 7.0).round() as u32).max(1)
}

pub fn line_height(scale: u32) -> u32 {
    (GLYPH_HEIGHT + 2) * scale
}

pub fn measure_text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * (GLYPH_WIDTH + 1) * scale
}

pub fn draw_text_line(
    canvas: &mut Blend<RgbaImage>,
    x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
    scale: u32,
) {
    let advance = ((GLYPH_WIDTH + 1) * scale) as i32;
    let mut cx = x;
    for c in text.chars() {
        draw_char(canvas, cx, y, c, color, scale);
        cx += advance;
    }
}

fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'B' => [0x6, 0x5, 0x6, 0x5, 0x6],
        'C' => [0x7, 0x4, 0x4, 0x4, 0x7],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x7, 0x4, 0x5, 0x5, 0x7],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'J' => [0x1, 0x1, 0x1, 0x5, 0x7],
        'K' => [0x5, 0x5, 0x6, 0x5, 0x5],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x5, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x7, 0x5, 0x5, 0x5, 0x7],
        'P' => [0x7, 0x5, 0x7, 0x4, 0x4],
        'Q' => [0x7, 0x5, 0x5, 0x7, 0x1],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'U' => [0x5, 0x5, 0x5, 0x5, 0x7],
        'V' => [0x5, 0x5, 0x5, 0x5, 0x2],
        'W' => [0x5, 0x5, 0x5, 0x7, 0x5],
        'X' => [0x5, 0x5, 0x2, 0x5, 0x5],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        'Z' => [0x7, 0x1, 0x2, 0x4, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        ',' => [0x0, 0x0, 0x0, 0x2, 0x4],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '+' => [0x0, 0x2, 0x7, 0x2, 0x0],
        '%' => [0x5, 0x1, 0x2, 0x4, 0x5],
        '/' => [0x1, 0x1, 0x2, 0x4, 0x4],
        '°' => [0x2, 0x5, 0x2, 0x0, 0x0],
        '(' => [0x2, 0x4, 0x4, 0x4, 0x2],
        ')' => [0x2, 0x1, 0x1, 0x1, 0x2],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    }
}

fn draw_char(canvas: &mut Blend<RgbaImage>, x: i32, y: i32, c: char, color: Rgba<u8>, scale: u32) {
    let (width, height) = canvas.dimensions();
    let scale = scale as i32;
    for (row, bits) in glyph(c).iter().enumerate() {
        for col in 0..GLYPH_WIDTH as i32 {
            // Column 0 is bit 2
            if (bits >> (2 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row as i32 * scale + dy;
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        canvas.draw_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_counts_chars_not_bytes() {
        assert_eq!(measure_text_width("AB", 1), 8);
        assert_eq!(measure_text_width("17°", 2), 24);
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(glyph('f'), glyph('F'));
        assert_eq!(glyph('~'), [0x7; 5]);
    }

    #[test]
    fn test_scale_floor() {
        assert_eq!(scale_for(0.0), 1);
        assert_eq!(scale_for(14.0), 2);
    }

    #[test]
    fn test_draw_clips_and_colors() {
        let red = Rgba([255, 0, 0, 255]);
        let mut canvas = Blend(RgbaImage::new(6, 6));
        draw_text_line(&mut canvas, -1, 0, "11", red, 1);
        let img = canvas.0;
        // Second '1' starts at x = 3; its top pixel is column 1
        assert_eq!(*img.get_pixel(4, 0), red);
        assert_eq!(*img.get_pixel(3, 0), Rgba([0, 0, 0, 0]));
        // First glyph's stem at x = 0
        assert_eq!(*img.get_pixel(0, 2), red);
    }
}
