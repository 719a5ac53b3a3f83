use std::ops::{Add, Mul, Sub};

/// A 2D point in pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A line as a pair of points
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f32 {
        let d = self.to - self.from;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

/// 8-bit RGBA color, straight (non-premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE_SMOKE: Rgba = Rgba::rgb(245, 245, 245);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Alpha first, matching how overlay colors are usually written down
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channel from a float, saturating to 0..=255 (truncating like a byte cast)
    pub fn channel(v: f32) -> u8 {
        v.clamp(0.0, 255.0) as u8
    }
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(c: Rgba) -> Self {
        image::Rgba([c.r, c.g, c.b, c.a])
    }
}

/// Head pose as reported by the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadPose {
    /// x, y, z in millimetres
    pub translation_mm: [f32; 3],
    /// Pitch, Yaw, Roll in radians
    pub rotation_rad: [f32; 3],
}

/// Raw output of one detection pass, as delivered by the detection producer
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub confidence: f32,
    pub face_scale: f32,
    pub box_lines: Vec<Segment>,
    pub landmarks: Vec<Point>,
    pub landmark_visibility: Vec<bool>,
    pub eye_landmarks: Vec<Point>,
    pub gaze_lines: Vec<Segment>,
    pub pose: Option<HeadPose>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);
        assert_eq!(b - a, Point::new(3.0, 4.0));
        assert_eq!(a + b, Point::new(5.0, 8.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(Segment::new(a, b).length(), 5.0);
    }

    #[test]
    fn test_channel_saturates() {
        assert_eq!(Rgba::channel(-3.0), 0);
        assert_eq!(Rgba::channel(300.0), 255);
        assert_eq!(Rgba::channel(127.9), 127);
    }
}
