//! Spherical Web Mercator projection (EPSG:3857).
//!
//! World frame: `x` east, `z` north, `y` up. The projection is flat, so every
//! projected point sits at `y = 0`.

use std::f64::consts::PI;

use contracts::{GeoCoordinate, MapAnchor, Vector3};

/// Equatorial radius used by Web Mercator (metres)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the projected circumference (metres)
pub const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

/// Project a geodetic coordinate to Web Mercator metres `(x, y)`
pub fn lat_lon_to_meters(coord: GeoCoordinate) -> (f64, f64) {
    let x = coord.longitude * ORIGIN_SHIFT / 180.0;
    let y = ((90.0 + coord.latitude) * PI / 360.0).tan().ln() / (PI / 180.0);
    (x, y * ORIGIN_SHIFT / 180.0)
}

/// Project `coord` relative to a Mercator-space center, scaled
pub fn geo_to_world(coord: GeoCoordinate, center_meters: (f64, f64), scale: f64) -> Vector3 {
    let (mx, my) = lat_lon_to_meters(coord);
    Vector3::new(
        (mx - center_meters.0) * scale,
        0.0,
        (my - center_meters.1) * scale,
    )
}

/// Projection bound to one map anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProjection {
    anchor: MapAnchor,
    center_meters: (f64, f64),
}

impl MapProjection {
    pub fn new(anchor: MapAnchor) -> Self {
        Self {
            anchor,
            center_meters: lat_lon_to_meters(anchor.center),
        }
    }

    pub fn anchor(&self) -> &MapAnchor {
        &self.anchor
    }

    /// World position of `coord` for this anchor
    pub fn to_world(&self, coord: GeoCoordinate) -> Vector3 {
        geo_to_world(coord, self.center_meters, self.anchor.scale)
    }
}
