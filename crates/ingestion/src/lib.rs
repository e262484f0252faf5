//! # Ingestion
//!
//! Turns raw session inputs into synchronization nodes.
//!
//! Responsibilities:
//! - Project geodetic fixes into the metric world frame (Web Mercator)
//! - Join location, map and plane events in a [`SynchronizationSession`]
//! - Decode recorded JSON-lines traces for replay
//!
//! ## Usage Example
//!
//! ```
//! use contracts::{GeoCoordinate, Location, MapAnchor, SynchronizationConfig, Vector3};
//! use ingestion::SynchronizationSession;
//!
//! let mut session = SynchronizationSession::new(SynchronizationConfig::default()).unwrap();
//! session.subscribe(|alignment| println!("aligned at {}", alignment.position));
//!
//! let anchor = MapAnchor::new(GeoCoordinate::new(37.7749, -122.4194), 1.0);
//! session.on_map_initialized(anchor, Vector3::zero());
//!
//! let fix = Location {
//!     coordinate: GeoCoordinate::new(37.7749, -122.4194),
//!     heading: 0.0,
//!     accuracy: 5.0,
//!     is_location_updated: true,
//!     timestamp: 0.0,
//! };
//! let outcome = session.on_location_updated(&fix, Vector3::zero());
//! assert!(outcome.is_accepted());
//! ```

mod error;
pub mod projection;
mod session;
mod trace;

// Re-exports
pub use error::{IngestionError, Result};
pub use projection::{geo_to_world, lat_lon_to_meters, MapProjection};
pub use session::{SessionOutcome, SynchronizationSession};
pub use trace::{TraceEvent, TraceReader};
