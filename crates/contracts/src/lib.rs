//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Frame Model
//! - World frame: metric, projected from geodetic coordinates around a map anchor.
//!   `x` points east, `z` points north, `y` is height (informational).
//! - AR frame: local frame of the visual tracker, same axis convention.
//! - An [`Alignment`] maps AR-local points into the world frame.

mod alignment;
mod blueprint;
mod error;
mod geometry;
mod location;
mod sink;
mod synchronization_config;

pub use alignment::*;
pub use blueprint::*;
pub use error::*;
pub use geometry::*;
pub use location::*;
pub use sink::*;
pub use synchronization_config::*;
