//! Turns a [`Composition`] into pixels over the current frame.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba as Pixel, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_polygon_mut, Blend,
};
use imageproc::point::Point as PolyPoint;
use imageproc::rect::Rect;

use crate::compose::{Composition, DrawCommand};
use crate::font;
use crate::frame::Frame;
use crate::ttf::FontRenderer;
use crate::types::{Point, Rgba};

/// TrueType text when a font was found, the bitmap font otherwise
pub enum TextRenderer {
    TrueType(FontRenderer),
    Bitmap,
}

impl TextRenderer {
    pub fn load(family: &str) -> Self {
        match FontRenderer::try_load(family) {
            Some(renderer) => Self::TrueType(renderer),
            None => Self::Bitmap,
        }
    }

    pub fn draw_lines(
        &self,
        canvas: &mut Blend<RgbaImage>,
        origin: Point,
        lines: &[String],
        size: f32,
        color: Pixel<u8>,
    ) {
        match self {
            Self::TrueType(renderer) => {
                let line_height = renderer.line_height(size);
                for (i, line) in lines.iter().enumerate() {
                    let y = origin.y + i as f32 * line_height;
                    renderer.draw_text(canvas, origin.x, y, line, color, size);
                }
            }
            Self::Bitmap => {
                let scale = font::scale_for(size);
                let line_height = font::line_height(scale) as i32;
                for (i, line) in lines.iter().enumerate() {
                    let y = origin.y.round() as i32 + i as i32 * line_height;
                    font::draw_text_line(canvas, origin.x.round() as i32, y, line, color, scale);
                }
            }
        }
    }
}

/// Draw `composition` over `frame` scaled to the display size.
/// Without a frame the background stays transparent.
pub fn rasterize(
    frame: Option<&Frame>,
    composition: &Composition,
    display_w: u32,
    display_h: u32,
    text: &TextRenderer,
) -> RgbaImage {
    let background = match frame {
        Some(frame) if frame.is_drawable() && display_w > 0 && display_h > 0 => {
            if frame.width() == display_w && frame.height() == display_h {
                DynamicImage::ImageRgb8(frame.image.clone()).into_rgba8()
            } else {
                let resized = imageops::resize(&frame.image, display_w, display_h, FilterType::Triangle);
                DynamicImage::ImageRgb8(resized).into_rgba8()
            }
        }
        _ => RgbaImage::new(display_w, display_h),
    };
    if display_w == 0 || display_h == 0 {
        return background;
    }

    let mut canvas = Blend(background);
    for item in &composition.items {
        draw_command(&mut canvas, &item.command, text);
    }
    canvas.0
}

fn draw_command(canvas: &mut Blend<RgbaImage>, command: &DrawCommand, text: &TextRenderer) {
    match command {
        DrawCommand::Line { from, to, color, width } => {
            draw_thick_line(canvas, *from, *to, *width, (*color).into());
        }
        DrawCommand::Ellipse { center, radius_x, radius_y, color } => {
            draw_filled_ellipse_mut(
                canvas,
                (center.x.round() as i32, center.y.round() as i32),
                radius_x.round().max(1.0) as i32,
                radius_y.round().max(1.0) as i32,
                (*color).into(),
            );
        }
        DrawCommand::RoundedRect { origin, width, height, radius, fill, stroke, stroke_width } => {
            draw_rounded_rect(canvas, *origin, *width, *height, *radius, *fill, *stroke, *stroke_width);
        }
        DrawCommand::Text { origin, lines, size, color } => {
            text.draw_lines(canvas, *origin, lines, *size, (*color).into());
        }
    }
}

/// Closed polygon without repeated vertices, or `None` when it collapses
/// below a triangle.
fn polygon(points: &[PolyPoint<i32>]) -> Option<Vec<PolyPoint<i32>>> {
    let mut poly: Vec<PolyPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        if poly.last() != Some(p) {
            poly.push(*p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    (poly.len() >= 3).then_some(poly)
}

fn draw_thick_line(canvas: &mut Blend<RgbaImage>, from: Point, to: Point, width: f32, color: Pixel<u8>) {
    let d = to - from;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if width > 1.0 && len > f32::EPSILON {
        let n = Point::new(-d.y / len, d.x / len) * (width / 2.0);
        let corners: Vec<PolyPoint<i32>> = [from + n, to + n, to - n, from - n]
            .iter()
            .map(|p| PolyPoint::new(p.x.round() as i32, p.y.round() as i32))
            .collect();
        if let Some(poly) = polygon(&corners) {
            draw_polygon_mut(canvas, &poly, color);
            return;
        }
    }
    draw_line_segment_mut(canvas, (from.x, from.y), (to.x, to.y), color);
}

#[allow(clippy::too_many_arguments)]
fn draw_rounded_rect(
    canvas: &mut Blend<RgbaImage>,
    origin: Point,
    width: f32,
    height: f32,
    radius: f32,
    fill: Rgba,
    stroke: Rgba,
    stroke_width: f32,
) {
    let x = origin.x.round() as i32;
    let y = origin.y.round() as i32;
    let w = width.round().max(0.0) as i32;
    let h = height.round().max(0.0) as i32;
    if w == 0 || h == 0 {
        return;
    }
    let r = (radius.round() as i32).clamp(0, w.min(h) / 2);
    let fill: Pixel<u8> = fill.into();

    // Pieces overlap, so a translucent fill darkens at the seams; HUD fills are opaque.
    if r == 0 {
        draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w as u32, h as u32), fill);
    } else {
        if w > 2 * r {
            draw_filled_rect_mut(canvas, Rect::at(x + r, y).of_size((w - 2 * r) as u32, h as u32), fill);
        }
        if h > 2 * r {
            draw_filled_rect_mut(canvas, Rect::at(x, y + r).of_size(w as u32, (h - 2 * r) as u32), fill);
        }
        for (cx, cy) in [
            (x + r, y + r),
            (x + w - 1 - r, y + r),
            (x + r, y + h - 1 - r),
            (x + w - 1 - r, y + h - 1 - r),
        ] {
            draw_filled_circle_mut(canvas, (cx, cy), r, fill);
        }
    }

    if stroke.a == 0 || stroke_width <= 0.0 {
        return;
    }
    let thickness = (stroke_width.round() as i32).max(1);
    for inset in 0..thickness {
        let (bw, bh) = (w - 2 * inset, h - 2 * inset);
        if bw <= 0 || bh <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(x + inset, y + inset).of_size(bw as u32, bh as u32),
            stroke.into(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{DrawItem, Layer};
    use image::{Rgb, RgbImage};

    fn composition(commands: Vec<DrawCommand>) -> Composition {
        Composition {
            width: 20.0,
            height: 20.0,
            items: commands
                .into_iter()
                .map(|command| DrawItem { layer: Layer::Box, command })
                .collect(),
        }
    }

    fn black_frame(w: u32, h: u32) -> Frame {
        Frame::new(RgbImage::from_pixel(w, h, Rgb([0, 0, 0])), 1)
    }

    #[test]
    fn test_no_frame_is_transparent() {
        let img = rasterize(None, &Composition::default(), 8, 6, &TextRenderer::Bitmap);
        assert_eq!(img.dimensions(), (8, 6));
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_frame_is_resized_to_display() {
        let frame = Frame::new(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])), 1);
        let img = rasterize(Some(&frame), &Composition::default(), 8, 8, &TextRenderer::Bitmap);
        assert_eq!(img.dimensions(), (8, 8));
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_thick_line_covers_its_width() {
        let c = composition(vec![DrawCommand::Line {
            from: Point::new(2.0, 10.0),
            to: Point::new(18.0, 10.0),
            color: Rgba::rgb(255, 255, 255),
            width: 4.0,
        }]);
        let img = rasterize(Some(&black_frame(20, 20)), &c, 20, 20, &TextRenderer::Bitmap);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(10, 9).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(10, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_degenerate_line_does_not_panic() {
        let c = composition(vec![DrawCommand::Line {
            from: Point::new(5.0, 5.0),
            to: Point::new(5.0, 5.0),
            color: Rgba::rgb(255, 255, 255),
            width: 3.0,
        }]);
        rasterize(Some(&black_frame(10, 10)), &c, 10, 10, &TextRenderer::Bitmap);
    }

    #[test]
    fn test_translucent_line_blends() {
        let c = composition(vec![DrawCommand::Line {
            from: Point::new(0.0, 5.0),
            to: Point::new(9.0, 5.0),
            color: Rgba::argb(128, 255, 255, 255),
            width: 1.0,
        }]);
        let img = rasterize(Some(&black_frame(10, 10)), &c, 10, 10, &TextRenderer::Bitmap);
        let p = img.get_pixel(4, 5).0;
        assert!((120..=136).contains(&p[0]), "expected half grey, got {:?}", p);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_rounded_rect_cuts_corners() {
        let c = composition(vec![DrawCommand::RoundedRect {
            origin: Point::new(0.0, 0.0),
            width: 12.0,
            height: 12.0,
            radius: 5.0,
            fill: Rgba::rgb(0, 255, 0),
            stroke: Rgba::argb(0, 0, 0, 0),
            stroke_width: 1.0,
        }]);
        let img = rasterize(Some(&black_frame(20, 20)), &c, 20, 20, &TextRenderer::Bitmap);
        assert_eq!(img.get_pixel(6, 6).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_rect_border_is_drawn() {
        let c = composition(vec![DrawCommand::RoundedRect {
            origin: Point::new(2.0, 2.0),
            width: 10.0,
            height: 6.0,
            radius: 0.0,
            fill: Rgba::WHITE_SMOKE,
            stroke: Rgba::BLACK,
            stroke_width: 0.5,
        }]);
        let frame = Frame::new(RgbImage::from_pixel(20, 20, Rgb([0, 0, 255])), 1);
        let img = rasterize(Some(&frame), &c, 20, 20, &TextRenderer::Bitmap);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [245, 245, 245, 255]);
    }

    #[test]
    fn test_ellipse_and_bitmap_text() {
        let c = composition(vec![
            DrawCommand::Ellipse {
                center: Point::new(5.0, 5.0),
                radius_x: 2.0,
                radius_y: 3.0,
                color: Rgba::rgb(255, 50, 50),
            },
            DrawCommand::Text {
                origin: Point::new(10.0, 10.0),
                lines: vec!["1".to_string(), "1".to_string()],
                size: 7.0,
                color: Rgba::rgb(255, 255, 255),
            },
        ]);
        let img = rasterize(Some(&black_frame(20, 20)), &c, 20, 20, &TextRenderer::Bitmap);
        assert_eq!(img.get_pixel(5, 5).0, [255, 50, 50, 255]);
        // Glyph '1' stem on both lines, 7px apart
        assert_eq!(img.get_pixel(11, 12).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(11, 19).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_polygon_collapse() {
        let p = |x, y| PolyPoint::new(x, y);
        assert!(polygon(&[p(0, 0), p(0, 0), p(0, 0), p(0, 0)]).is_none());
        assert!(polygon(&[p(0, 0), p(4, 0), p(4, 0), p(0, 0)]).is_none());
        assert_eq!(polygon(&[p(0, 0), p(4, 0), p(4, 2), p(0, 2)]).map(|v| v.len()), Some(4));
    }
}
