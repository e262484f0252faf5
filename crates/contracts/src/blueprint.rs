//! SessionBlueprint - Config Loader output
//!
//! Describes a complete tracking session: map anchor, synchronization tuning, output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{GeoCoordinate, SynchronizationConfig};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Session name (used for logging)
    #[serde(default = "default_session_name")]
    pub name: String,

    /// Map projection anchor; absent means the map is initialised later at runtime
    #[serde(default)]
    pub map: Option<MapAnchor>,

    /// Synchronization context tuning
    #[serde(default)]
    pub synchronization: SynchronizationConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

fn default_session_name() -> String {
    "session".to_string()
}

impl SessionBlueprint {
    /// Blueprint with default tuning, no map and no sinks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: ConfigVersion::V1,
            name: name.into(),
            map: None,
            synchronization: SynchronizationConfig::default(),
            sinks: Vec::new(),
        }
    }
}

/// Map projection anchor: Web Mercator center and world-relative scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapAnchor {
    /// Geodetic center of the map
    pub center: GeoCoordinate,

    /// World units per projected metre
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl MapAnchor {
    pub fn new(center: GeoCoordinate, scale: f64) -> Self {
        Self { center, scale }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON-lines file output
    File,
}
