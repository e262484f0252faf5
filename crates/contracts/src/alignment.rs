//! Alignment - Sync Engine output
//!
//! Transform mapping AR-local coordinates into the world frame.

use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// Clockwise (seen from above) rotation of `degrees` around the vertical axis
pub fn yaw_rotation(degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&nalgebra::Vector3::y_axis(), degrees.to_radians())
}

/// AR-to-world alignment
///
/// Emitted by value; listeners that need a different alignment derive a copy
/// (see [`Alignment::with_height`]) instead of mutating the emitted one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Position of the AR origin in world coordinates
    pub position: Vector3,

    /// Yaw of the AR frame relative to the world frame (degrees, around `y`)
    #[serde(default)]
    pub rotation: f64,

    /// Blend factor that produced this alignment
    #[serde(default)]
    pub bias: f64,

    /// Number of accepted nodes that contributed (1-based)
    #[serde(default)]
    pub sequence: u64,
}

impl Alignment {
    /// Pure translation alignment
    pub fn from_offset(position: Vector3) -> Self {
        Self {
            position,
            rotation: 0.0,
            bias: 1.0,
            sequence: 0,
        }
    }

    /// Copy with the vertical axis replaced by `height`
    pub fn with_height(&self, height: f64) -> Self {
        let mut aligned = *self;
        aligned.position.y = height;
        aligned
    }

    /// Map an AR-local point into world coordinates
    ///
    /// `world = R(rotation) * ar + position`, with `R` rotating clockwise
    /// (seen from above) around the vertical axis.
    pub fn transform_point(&self, ar: Vector3) -> Vector3 {
        let rotated = yaw_rotation(self.rotation) * nalgebra::Vector3::from(ar);
        Vector3::from(rotated + nalgebra::Vector3::from(self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_height_copies() {
        let emitted = Alignment::from_offset(Vector3::new(1.0, 2.0, 3.0));
        let adjusted = emitted.with_height(7.5);
        assert_eq!(adjusted.position, Vector3::new(1.0, 7.5, 3.0));
        assert_eq!(emitted.position.y, 2.0);
    }

    #[test]
    fn test_transform_point_translation() {
        let alignment = Alignment::from_offset(Vector3::new(10.0, 0.0, -5.0));
        let world = alignment.transform_point(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(world, Vector3::new(11.0, 1.0, -4.0));
    }

    #[test]
    fn test_transform_point_rotation() {
        let alignment = Alignment {
            position: Vector3::zero(),
            rotation: 90.0,
            bias: 1.0,
            sequence: 1,
        };
        // North in AR becomes east in the world
        let world = alignment.transform_point(Vector3::new(0.0, 0.0, 1.0));
        assert!((world.x - 1.0).abs() < 1e-9);
        assert!(world.z.abs() < 1e-9);
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{ "position": { "x": 1.0, "y": 0.0, "z": 2.0 } }"#;
        let alignment: Alignment = serde_json::from_str(json).unwrap();
        assert_eq!(alignment.rotation, 0.0);
        assert_eq!(alignment.sequence, 0);
    }
}
