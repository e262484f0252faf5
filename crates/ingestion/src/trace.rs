//! JSON-lines session traces.
//!
//! One event per line, tagged by `"event"`:
//!
//! ```text
//! {"event":"map_initialized","timestamp":0.0,"center":{"latitude":37.7749,"longitude":-122.4194}}
//! {"event":"location","timestamp":1.0,"latitude":37.7749,"longitude":-122.4194,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
//! {"event":"plane","timestamp":1.5,"height":-1.4}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use contracts::{GeoCoordinate, Location, MapAnchor, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, Result};

fn default_true() -> bool {
    true
}

/// One recorded session input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Map finished loading; anchor fields fall back to the configured `[map]`
    MapInitialized {
        #[serde(default)]
        timestamp: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<GeoCoordinate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<f64>,
        /// AR position at initialisation, used to replay a pending location
        #[serde(default)]
        ar_position: Vector3,
    },
    /// Location fix plus the AR position sampled with it
    Location {
        #[serde(default)]
        timestamp: f64,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        heading: f64,
        #[serde(default)]
        accuracy: f64,
        #[serde(default = "default_true")]
        is_location_updated: bool,
        ar_position: Vector3,
    },
    /// Plane detected at the given height
    Plane {
        #[serde(default)]
        timestamp: f64,
        height: f64,
    },
}

impl TraceEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            Self::MapInitialized { timestamp, .. }
            | Self::Location { timestamp, .. }
            | Self::Plane { timestamp, .. } => *timestamp,
        }
    }

    /// Event name as written in the trace
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MapInitialized { .. } => "map_initialized",
            Self::Location { .. } => "location",
            Self::Plane { .. } => "plane",
        }
    }

    /// Location sample carried by a `location` event
    pub fn location(&self) -> Option<Location> {
        match *self {
            Self::Location {
                timestamp,
                latitude,
                longitude,
                heading,
                accuracy,
                is_location_updated,
                ..
            } => Some(Location {
                coordinate: GeoCoordinate::new(latitude, longitude),
                heading,
                accuracy,
                is_location_updated,
                timestamp,
            }),
            _ => None,
        }
    }

    /// Resolve the anchor of a `map_initialized` event
    ///
    /// Missing fields come from `configured`; a missing scale defaults to 1.
    pub fn anchor(&self, configured: Option<&MapAnchor>) -> Result<Option<MapAnchor>> {
        let Self::MapInitialized { center, scale, .. } = self else {
            return Ok(None);
        };
        let center = center
            .or_else(|| configured.map(|anchor| anchor.center))
            .ok_or(IngestionError::MissingMapAnchor)?;
        let scale = scale
            .or_else(|| configured.map(|anchor| anchor.scale))
            .unwrap_or(1.0);
        Ok(Some(MapAnchor::new(center, scale)))
    }
}

/// Streaming trace decoder
pub struct TraceReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl TraceReader<BufReader<File>> {
    /// Open a trace file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Line number of the last event read
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|e| {
                IngestionError::TraceParse {
                    line: self.line,
                    message: e.to_string(),
                }
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const TRACE: &str = r#"
# recorded walk
{"event":"location","timestamp":0.5,"latitude":0.0,"longitude":0.0,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
{"event":"map_initialized","timestamp":1.0}

{"event":"plane","timestamp":1.5,"height":-1.4}
{"event":"location","timestamp":2.0,"latitude":0.0001,"longitude":0.0,"accuracy":4.0,"is_location_updated":false,"ar_position":{"x":0.0,"y":0.0,"z":11.0}}
"#;

    #[test]
    fn test_reads_events_and_skips_comments() {
        let events: Vec<_> = TraceReader::from_reader(Cursor::new(TRACE))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].kind(), "location");
        assert_eq!(events[1].kind(), "map_initialized");
        assert_eq!(events[2], TraceEvent::Plane { timestamp: 1.5, height: -1.4 });
        assert_eq!(events[3].timestamp(), 2.0);

        let location = events[3].location().unwrap();
        assert!(!location.is_location_updated);
        assert_eq!(location.accuracy, 4.0);
        assert!(events[0].location().unwrap().is_location_updated);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let trace = "{\"event\":\"plane\",\"height\":0.0}\n\n{\"event\":\"teleport\"}\n";
        let mut reader = TraceReader::from_reader(Cursor::new(trace));
        assert!(reader.next().unwrap().is_ok());

        let err = reader.next().unwrap().unwrap_err();
        match err {
            IngestionError::TraceParse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_anchor_falls_back_to_configured() {
        let configured = MapAnchor::new(GeoCoordinate::new(10.0, 20.0), 2.0);
        let event = TraceEvent::MapInitialized {
            timestamp: 0.0,
            center: None,
            scale: Some(0.5),
            ar_position: Vector3::zero(),
        };
        let anchor = event.anchor(Some(&configured)).unwrap().unwrap();
        assert_eq!(anchor.center, configured.center);
        assert_eq!(anchor.scale, 0.5);

        assert!(matches!(
            event.anchor(None),
            Err(IngestionError::MissingMapAnchor)
        ));
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();

        let reader = TraceReader::open(file.path()).unwrap();
        assert_eq!(reader.filter(|event| event.is_ok()).count(), 4);
    }
}
