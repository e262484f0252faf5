//! Yaw estimation between the AR and world frames.
//!
//! Angles are in degrees, clockwise from north (`+z`) when seen from above.

use nalgebra::Vector3;

/// Horizontal displacements shorter than this carry no usable direction
const MIN_BASELINE_M: f64 = 1e-3;

/// Normalize an angle into (-180, 180]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Shortest-arc interpolation from `from` towards `to`
pub fn lerp_degrees(from: f64, to: f64, t: f64) -> f64 {
    normalize_degrees(from + normalize_degrees(to - from) * t)
}

fn bearing(delta: &Vector3<f64>) -> Option<f64> {
    let horizontal = delta.x.hypot(delta.z);
    if horizontal < MIN_BASELINE_M {
        return None;
    }
    Some(delta.x.atan2(delta.z).to_degrees())
}

/// Yaw that rotates the AR displacement onto the world displacement
///
/// Returns `None` when either displacement is too short horizontally.
pub fn estimate_yaw(world_delta: &Vector3<f64>, ar_delta: &Vector3<f64>) -> Option<f64> {
    let world = bearing(world_delta)?;
    let ar = bearing(ar_delta)?;
    Some(normalize_degrees(world - ar))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-450.0), -90.0);
    }

    #[test]
    fn test_lerp_takes_shortest_arc() {
        let mid = lerp_degrees(170.0, -170.0, 0.5);
        assert!((mid.abs() - 180.0).abs() < 1e-9, "got {mid}");
        assert!((lerp_degrees(10.0, 30.0, 0.5) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_yaw_quarter_turn() {
        // AR walks north, world says east
        let yaw = estimate_yaw(&Vector3::new(5.0, 0.0, 0.0), &Vector3::new(0.0, 0.0, 5.0));
        assert!((yaw.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_yaw_ignores_vertical_motion() {
        assert!(estimate_yaw(&Vector3::new(0.0, 3.0, 0.0), &Vector3::new(1.0, 0.0, 0.0)).is_none());
    }
}
