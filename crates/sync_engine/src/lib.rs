//! # Sync Engine
//!
//! AR-to-world alignment engine.
//!
//! Responsibilities:
//! - Gate incoming (world, AR-local) observation pairs by movement and AR drift
//! - Blend accepted observations into a running alignment (manual or automatic bias)
//! - Optional yaw estimation between the two frames
//! - Notify every subscribed listener with each new `Alignment`
//!
//! ## Usage Example
//!
//! ```
//! use sync_engine::{SynchronizationConfig, SynchronizationContext, Vector3};
//!
//! let mut context = SynchronizationContext::new(SynchronizationConfig::default()).unwrap();
//! context.subscribe(|alignment| println!("alignment: {}", alignment.position));
//!
//! let outcome = context.add_synchronization_node(
//!     Vector3::new(5.0, 0.0, 3.0),
//!     Vector3::new(1.0, 0.0, 1.0),
//! );
//! assert!(outcome.is_accepted());
//! ```

mod bias;
mod context;
mod heading;
mod listeners;
mod outcome;

pub use bias::{accuracy_confidence, drift_confidence, effective_bias};
pub use context::SynchronizationContext;
pub use heading::{estimate_yaw, lerp_degrees, normalize_degrees};
pub use listeners::{AlignmentListener, ListenerRegistry, SubscriptionId};
pub use outcome::{ContextState, NodeOutcome, RejectionReason, SynchronizationStats};

// Re-export contracts types
pub use contracts::{Alignment, SynchronizationConfig, SynchronizationNode, Vector3};
