//! Location samples and synchronization nodes - Ingestion output

use serde::{Deserialize, Serialize};

use crate::{GeoCoordinate, Vector3};

/// Location sample from an external location provider
///
/// Immutable per sample, consumed once per update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Geodetic position
    pub coordinate: GeoCoordinate,

    /// Compass heading (degrees, clockwise from north)
    #[serde(default)]
    pub heading: f64,

    /// Horizontal accuracy (metres, smaller is better)
    #[serde(default)]
    pub accuracy: f64,

    /// Whether this sample is a fresh fix
    #[serde(default = "default_true")]
    pub is_location_updated: bool,

    /// Provider timestamp (seconds)
    #[serde(default)]
    pub timestamp: f64,
}

fn default_true() -> bool {
    true
}

/// One (world position, AR-local position) observation pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationNode {
    /// Metric world position projected from geodetic coordinates
    pub world_position: Vector3,

    /// Position in the AR tracking frame at the same instant
    pub ar_local_position: Vector3,

    /// Declared horizontal accuracy of the world position (metres), if known
    #[serde(default)]
    pub accuracy: Option<f64>,

    /// Compass heading reported with the fix (degrees, clockwise from north)
    #[serde(default)]
    pub heading: Option<f64>,
}

impl SynchronizationNode {
    /// Create a node without accuracy information
    pub fn new(world_position: Vector3, ar_local_position: Vector3) -> Self {
        Self {
            world_position,
            ar_local_position,
            accuracy: None,
            heading: None,
        }
    }

    /// Attach a declared accuracy
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Attach a compass heading
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// True when both positions are finite
    pub fn is_finite(&self) -> bool {
        self.world_position.is_finite() && self.ar_local_position.is_finite()
    }
}
