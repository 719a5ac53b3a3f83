use serde::{Deserialize, Serialize};

use crate::eye_topology::{ContourKind, EyeTopology};
use crate::pose::PoseReadout;
use crate::rates::RateSnapshot;
use crate::store::OverlayGeometry;
use crate::types::{Point, Rgba};

// =========================================================================
// Visual constants
// =========================================================================
// Stroke scale and alpha confidence are floored at these values.
pub const MIN_STROKE_SCALE: f32 = 0.6;
pub const MIN_DISPLAY_CONFIDENCE: f32 = 0.4;
const FACE_SCALE_FACTOR: f32 = 0.88;

const GAZE_EXTENSION: f32 = 2.0;
const GAZE_COLOR: Rgba = Rgba::argb(200, 240, 30, 100);
const EYELID_COLOR: Rgba = Rgba::argb(200, 100, 30, 240);

const BOX_WIDTH: f32 = 2.0;
const GAZE_WIDTH: f32 = 5.0;
const IRIS_WIDTH: f32 = 1.5;
const EYELID_WIDTH: f32 = 2.5;

const LANDMARK_OUTER: (f32, f32) = (2.75, 3.0);
const LANDMARK_INNER: (f32, f32) = (1.75, 2.0);
const LANDMARK_ALPHA_VISIBLE: f32 = 230.0;
const LANDMARK_ALPHA_HIDDEN: f32 = 125.0;

/// HUD elements are laid out for a 400px wide display and scaled from there
const HUD_REFERENCE_WIDTH: f32 = 400.0;
const BADGE_SIZE: (f32, f32) = (107.0, 18.0);
const FPS_SIZE: (f32, f32) = (90.0, 40.0);
const POSE_SIZE: (f32, f32) = (90.0, 52.0);
const HUD_RADIUS: f32 = 3.0;
const HUD_BORDER: f32 = 0.5;
const BADGE_TEXT_SIZE: f32 = 12.0;
const FPS_TEXT_SIZE: f32 = 10.0;
const POSE_TEXT_SIZE: f32 = 9.0;

/// Which overlay layers to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayers {
    pub show_box: bool,
    pub show_landmarks: bool,
    pub show_eyes: bool,
    pub show_gaze: bool,
    pub show_confidence: bool,
    pub show_fps: bool,
    pub show_pose: bool,
}

impl Default for OverlayLayers {
    fn default() -> Self {
        Self {
            show_box: true,
            show_landmarks: true,
            show_eyes: true,
            show_gaze: true,
            show_confidence: true,
            show_fps: true,
            show_pose: true,
        }
    }
}

impl OverlayLayers {
    pub fn is_shown(&self, layer: Layer) -> bool {
        match layer {
            Layer::Box => self.show_box,
            Layer::Gaze => self.show_gaze,
            Layer::Landmarks => self.show_landmarks,
            Layer::Eyes => self.show_eyes,
            Layer::Confidence => self.show_confidence,
            Layer::Fps => self.show_fps,
            Layer::Pose => self.show_pose,
        }
    }

    /// Flip one layer, returning its new state
    pub fn toggle(&mut self, layer: Layer) -> bool {
        let flag = match layer {
            Layer::Box => &mut self.show_box,
            Layer::Gaze => &mut self.show_gaze,
            Layer::Landmarks => &mut self.show_landmarks,
            Layer::Eyes => &mut self.show_eyes,
            Layer::Confidence => &mut self.show_confidence,
            Layer::Fps => &mut self.show_fps,
            Layer::Pose => &mut self.show_pose,
        };
        *flag = !*flag;
        *flag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Box,
    Gaze,
    Landmarks,
    Eyes,
    Confidence,
    Fps,
    Pose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Point,
        to: Point,
        color: Rgba,
        width: f32,
    },
    Ellipse {
        center: Point,
        radius_x: f32,
        radius_y: f32,
        color: Rgba,
    },
    RoundedRect {
        origin: Point,
        width: f32,
        height: f32,
        radius: f32,
        fill: Rgba,
        stroke: Rgba,
        stroke_width: f32,
    },
    /// Top-left anchored, one entry per text line
    Text {
        origin: Point,
        lines: Vec<String>,
        size: f32,
        color: Rgba,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub layer: Layer,
    pub command: DrawCommand,
}

/// Ordered draw list in display pixel space, back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub width: f32,
    pub height: f32,
    pub items: Vec<DrawItem>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |item| item.layer == layer)
            .map(|item| &item.command)
    }

    fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.items.push(DrawItem { layer, command });
    }
}

/// Proportional stroke scale, floored at [`MIN_STROKE_SCALE`]
pub fn stroke_scale(face_scale: f32, display_width: f32, frame_width: f32) -> f32 {
    let s = FACE_SCALE_FACTOR * face_scale * display_width / frame_width;
    // NaN (zero-width frame) also lands on the floor
    if s >= MIN_STROKE_SCALE {
        s
    } else {
        MIN_STROKE_SCALE
    }
}

/// Confidence used for alpha and hue only; the badge shows the raw value
pub fn display_confidence(confidence: f32) -> f32 {
    if confidence >= MIN_DISPLAY_CONFIDENCE {
        confidence
    } else {
        MIN_DISPLAY_CONFIDENCE
    }
}

pub fn confidence_percent(confidence: f32) -> i32 {
    (confidence * 100.0).round() as i32
}

pub fn confidence_label(confidence: f32) -> String {
    format!("Confidence: {}%", confidence_percent(confidence))
}

/// Map from frame pixels to display pixels, x and y scaled independently
pub fn to_display(p: Point, frame: (f32, f32), display: (f32, f32)) -> Point {
    Point::new(display.0 * p.x / frame.0, display.1 * p.y / frame.1)
}

/// Lengthen a gaze vector from its origin so it reads at preview size
pub fn extend_gaze(from: Point, to: Point, scale: f32) -> Point {
    from + (to - from) * (scale * GAZE_EXTENSION)
}

pub fn box_color(display_confidence: f32) -> Rgba {
    Rgba::argb(
        200,
        Rgba::channel(100.0 + 155.0 * (1.0 - display_confidence)),
        Rgba::channel(100.0 + 155.0 * display_confidence),
        100,
    )
}

pub fn badge_color(confidence: f32) -> Rgba {
    Rgba::rgb(
        Rgba::channel((1.0 - confidence) * 255.0),
        Rgba::channel(confidence * 255.0),
        40,
    )
}

pub fn fps_lines(rates: &RateSnapshot) -> Vec<String> {
    vec![
        format!("Camera:{} fps", rates.camera_fps.round() as i64),
        format!("AI: {} fps", rates.landmark_fps.round() as i64),
        format!("Detected:{} fps", rates.detected_fps.round() as i64),
    ]
}

/// Build the draw list for one paint pass.
///
/// `frame_size` is the pixel size of the bitmap the geometry refers to; with
/// no (or an empty) frame nothing is drawn.
pub fn compose(
    geometry: &OverlayGeometry,
    frame_size: Option<(u32, u32)>,
    display: (f32, f32),
    rates: &RateSnapshot,
    layers: &OverlayLayers,
) -> Composition {
    let mut out = Composition {
        width: display.0,
        height: display.1,
        items: Vec::new(),
    };

    let frame = match frame_size {
        Some((w, h)) if w > 0 && h > 0 => (w as f32, h as f32),
        _ => return out,
    };

    let scale = stroke_scale(geometry.face_scale, display.0, frame.0);
    let confidence = display_confidence(geometry.confidence);

    if layers.show_box {
        let color = box_color(confidence);
        for line in &geometry.box_lines {
            out.push(
                Layer::Box,
                DrawCommand::Line {
                    from: to_display(line.from, frame, display),
                    to: to_display(line.to, frame, display),
                    color,
                    width: BOX_WIDTH * scale,
                },
            );
        }
    }

    if layers.show_gaze {
        for line in &geometry.gaze_lines {
            let from = to_display(line.from, frame, display);
            let to = to_display(line.to, frame, display);
            out.push(
                Layer::Gaze,
                DrawCommand::Line {
                    from,
                    to: extend_gaze(from, to, scale),
                    color: GAZE_COLOR,
                    width: GAZE_WIDTH * scale,
                },
            );
        }
    }

    if layers.show_landmarks {
        push_landmarks(&mut out, geometry, frame, display, scale, confidence);
    }

    if layers.show_eyes {
        push_eye_contours(&mut out, geometry, frame, display, scale);
    }

    let ui = display.0 / HUD_REFERENCE_WIDTH;

    if layers.show_confidence {
        let w = (BADGE_SIZE.0 * ui).trunc();
        let h = (BADGE_SIZE.1 * ui).trunc();
        out.push(
            Layer::Confidence,
            DrawCommand::RoundedRect {
                origin: Point::new(display.0 - w - 1.0, 0.0),
                width: w,
                height: h,
                radius: HUD_RADIUS * ui,
                fill: badge_color(geometry.confidence),
                stroke: Rgba::BLACK,
                stroke_width: HUD_BORDER * ui,
            },
        );
        out.push(
            Layer::Confidence,
            DrawCommand::Text {
                origin: Point::new(display.0 - w + 2.0, 2.0),
                lines: vec![confidence_label(geometry.confidence)],
                size: BADGE_TEXT_SIZE * ui,
                color: Rgba::BLACK,
            },
        );
    }

    if layers.show_fps {
        push_panel(
            &mut out,
            Layer::Fps,
            Point::new(0.0, 0.0),
            FPS_SIZE,
            ui,
            fps_lines(rates),
            FPS_TEXT_SIZE,
        );
    }

    if layers.show_pose {
        if let Some(pose) = &geometry.pose {
            let top = if layers.show_fps {
                (FPS_SIZE.1 * ui).trunc() + 2.0 * ui
            } else {
                0.0
            };
            push_panel(
                &mut out,
                Layer::Pose,
                Point::new(0.0, top),
                POSE_SIZE,
                ui,
                PoseReadout::from(pose).lines(),
                POSE_TEXT_SIZE,
            );
        }
    }

    out
}

fn push_landmarks(
    out: &mut Composition,
    geometry: &OverlayGeometry,
    frame: (f32, f32),
    display: (f32, f32),
    scale: f32,
    confidence: f32,
) {
    for (j, p) in geometry.landmark_points.iter().enumerate() {
        let center = to_display(*p, frame, display);
        // Missing entries (short or empty list) count as visible
        let visible = geometry.landmark_visibility.get(j).copied().unwrap_or(true);
        let alpha = if visible {
            LANDMARK_ALPHA_VISIBLE
        } else {
            LANDMARK_ALPHA_HIDDEN
        };
        let a = Rgba::channel(alpha * confidence);

        out.push(
            Layer::Landmarks,
            DrawCommand::Ellipse {
                center,
                radius_x: LANDMARK_OUTER.0 * scale,
                radius_y: LANDMARK_OUTER.1 * scale,
                color: Rgba::argb(a, 255, 50, 50),
            },
        );
        out.push(
            Layer::Landmarks,
            DrawCommand::Ellipse {
                center,
                radius_x: LANDMARK_INNER.0 * scale,
                radius_y: LANDMARK_INNER.1 * scale,
                color: Rgba::argb(a, 255, 255, 100),
            },
        );
    }
}

fn push_eye_contours(
    out: &mut Composition,
    geometry: &OverlayGeometry,
    frame: (f32, f32),
    display: (f32, f32),
    scale: f32,
) {
    let points = &geometry.eye_points;
    for pair in EyeTopology::default().pairs(points.len()) {
        let (color, width) = match pair.kind {
            ContourKind::IrisPupil => (GAZE_COLOR, IRIS_WIDTH),
            ContourKind::Eyelid => (EYELID_COLOR, EYELID_WIDTH),
        };
        out.push(
            Layer::Eyes,
            DrawCommand::Line {
                from: to_display(points[pair.from], frame, display),
                to: to_display(points[pair.to], frame, display),
                color,
                width: width * scale,
            },
        );
    }
}

fn push_panel(
    out: &mut Composition,
    layer: Layer,
    origin: Point,
    size: (f32, f32),
    ui: f32,
    lines: Vec<String>,
    text_size: f32,
) {
    out.push(
        layer,
        DrawCommand::RoundedRect {
            origin,
            width: (size.0 * ui).trunc(),
            height: (size.1 * ui).trunc(),
            radius: HUD_RADIUS * ui,
            fill: Rgba::WHITE_SMOKE,
            stroke: Rgba::BLACK,
            stroke_width: HUD_BORDER * ui,
        },
    );
    out.push(
        layer,
        DrawCommand::Text {
            origin: Point::new(origin.x + 2.0 * ui, origin.y),
            lines,
            size: text_size * ui,
            color: Rgba::BLACK,
        },
    );
}
