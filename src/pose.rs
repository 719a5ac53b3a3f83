use crate::types::HeadPose;

/// Human readable head pose, one entry per axis
#[derive(Debug, Clone, PartialEq)]
pub struct PoseReadout {
    pub yaw: AngleLabel,
    pub pitch: AngleLabel,
    pub roll: AngleLabel,
    /// x, y, z, e.g. "12 mm"
    pub translation: [String; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct AngleLabel {
    /// Absolute whole degrees, e.g. "14°"
    pub degrees: String,
    pub direction: &'static str,
}

fn to_degrees(rad: f32) -> f32 {
    rad * 180.0 / std::f32::consts::PI + 0.5
}

fn angle(rad: f32, positive: &'static str, negative: &'static str) -> AngleLabel {
    let deg = to_degrees(rad);
    let direction = if deg > 0.0 {
        positive
    } else if deg < 0.0 {
        negative
    } else {
        "Straight"
    };
    AngleLabel {
        degrees: format!("{:.0}°", deg.abs()),
        direction,
    }
}

impl From<&HeadPose> for PoseReadout {
    fn from(pose: &HeadPose) -> Self {
        let [pitch, yaw, roll] = pose.rotation_rad;
        let [x, y, z] = pose.translation_mm;
        Self {
            yaw: angle(yaw, "Right", "Left"),
            pitch: angle(pitch, "Down", "Up"),
            roll: angle(roll, "Left", "Right"),
            translation: [
                format!("{:.0} mm", x),
                format!("{:.0} mm", y),
                format!("{:.0} mm", z),
            ],
        }
    }
}

impl PoseReadout {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Yaw: {} {}", self.yaw.degrees, self.yaw.direction),
            format!("Pitch: {} {}", self.pitch.degrees, self.pitch.direction),
            format!("Roll: {} {}", self.roll.degrees, self.roll.direction),
            format!(
                "X: {} Y: {} Z: {}",
                self.translation[0], self.translation[1], self.translation[2]
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions() {
        let pose = HeadPose {
            translation_mm: [12.4, -3.6, 480.0],
            rotation_rad: [0.2, -0.3, 0.1],
        };
        let readout = PoseReadout::from(&pose);
        assert_eq!(readout.pitch.direction, "Down");
        assert_eq!(readout.yaw.direction, "Left");
        assert_eq!(readout.roll.direction, "Left");
        assert_eq!(readout.yaw.degrees, "17°");
        assert_eq!(readout.translation[0], "12 mm");
        assert_eq!(readout.translation[1], "-4 mm");
        assert_eq!(readout.translation[2], "480 mm");
    }

    #[test]
    fn test_zero_rotation_leans_positive() {
        // The half-degree offset means an exact zero reads as the positive direction
        let readout = PoseReadout::from(&HeadPose::default());
        assert_eq!(readout.yaw.direction, "Right");
    }

    #[test]
    fn test_sign_picks_direction() {
        assert_eq!(angle(0.0, "Right", "Left").direction, "Right");
        assert_eq!(angle(-1.0, "Right", "Left").direction, "Left");
    }

    #[test]
    fn test_lines() {
        let lines = PoseReadout::from(&HeadPose::default()).lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Yaw: "));
        assert_eq!(lines[3], "X: 0 mm Y: 0 mm Z: 0 mm");
    }
}
