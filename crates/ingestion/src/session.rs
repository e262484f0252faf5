//! Session orchestration around one synchronization context.
//!
//! Joins the three asynchronous inputs of a tracked session: location fixes,
//! map initialisation and AR plane detection.

use contracts::{
    Alignment, ContractError, Location, MapAnchor, SynchronizationConfig, SynchronizationNode,
    Vector3,
};
use metrics::counter;
use sync_engine::{
    ListenerRegistry, NodeOutcome, SubscriptionId, SynchronizationContext, SynchronizationStats,
};
use tracing::{debug, info};

use crate::projection::MapProjection;

/// What happened to one location update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionOutcome {
    /// Map not initialised yet; the location is kept for replay
    Deferred,
    /// Location was not a fresh fix
    Ignored,
    /// Location was projected and fed to the context
    Node(NodeOutcome),
}

impl SessionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Node(outcome) if outcome.is_accepted())
    }
}

/// One tracked session: context, projection, pending location, plane height
#[derive(Debug)]
pub struct SynchronizationSession {
    context: SynchronizationContext,
    projection: Option<MapProjection>,
    pending: Option<Location>,
    plane_height: f64,
    listeners: ListenerRegistry,
}

impl SynchronizationSession {
    pub fn new(config: SynchronizationConfig) -> Result<Self, ContractError> {
        Ok(Self {
            context: SynchronizationContext::new(config)?,
            projection: None,
            pending: None,
            plane_height: 0.0,
            listeners: ListenerRegistry::new(),
        })
    }

    /// Register a listener for height-adjusted alignments
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Alignment) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Handle a location update with the AR position sampled at the same time
    pub fn on_location_updated(
        &mut self,
        location: &Location,
        ar_position: Vector3,
    ) -> SessionOutcome {
        let Some(projection) = self.projection else {
            debug!(coordinate = %location.coordinate, "map not initialised, location deferred");
            self.pending = Some(*location);
            counter!("ar_session_locations_total", "outcome" => "deferred").increment(1);
            return SessionOutcome::Deferred;
        };

        if !location.is_location_updated {
            counter!("ar_session_locations_total", "outcome" => "ignored").increment(1);
            return SessionOutcome::Ignored;
        }

        let world = projection.to_world(location.coordinate);
        let mut node = SynchronizationNode::new(world, ar_position);
        if location.accuracy > 0.0 {
            node = node.with_accuracy(location.accuracy);
        }
        if location.heading.is_finite() {
            node = node.with_heading(location.heading);
        }

        let outcome = self.context.add_node(node);
        counter!("ar_session_locations_total", "outcome" => "fed").increment(1);
        if let NodeOutcome::Accepted(alignment) = outcome {
            let adjusted = alignment.with_height(self.plane_height);
            self.listeners.notify(&adjusted);
        }
        SessionOutcome::Node(outcome)
    }

    /// Mark the map initialised and replay the pending location, if any
    pub fn on_map_initialized(
        &mut self,
        anchor: MapAnchor,
        ar_position: Vector3,
    ) -> Option<SessionOutcome> {
        if self.projection.is_some() {
            info!(center = %anchor.center, "map re-initialised");
        } else {
            info!(center = %anchor.center, scale = anchor.scale, "map initialised");
        }
        self.projection = Some(MapProjection::new(anchor));

        self.pending
            .take()
            .map(|location| self.on_location_updated(&location, ar_position))
    }

    /// Remember the latest detected plane height
    pub fn on_plane_detected(&mut self, height: f64) {
        if height.is_finite() {
            self.plane_height = height;
        }
    }

    /// Current alignment with the plane height applied
    pub fn alignment(&self) -> Option<Alignment> {
        self.context
            .alignment()
            .map(|alignment| alignment.with_height(self.plane_height))
    }

    pub fn is_map_initialized(&self) -> bool {
        self.projection.is_some()
    }

    pub fn has_pending_location(&self) -> bool {
        self.pending.is_some()
    }

    pub fn plane_height(&self) -> f64 {
        self.plane_height
    }

    pub fn context(&self) -> &SynchronizationContext {
        &self.context
    }

    pub fn stats(&self) -> SynchronizationStats {
        self.context.stats()
    }
}
