//! Synchronization context: the alignment state machine.

use contracts::{
    yaw_rotation, Alignment, ContractError, SynchronizationConfig, SynchronizationNode, Vector3,
};
use nalgebra::Vector3 as NaVector3;
use tracing::{debug, info, instrument, warn};

use crate::bias::effective_bias;
use crate::heading::{estimate_yaw, lerp_degrees, normalize_degrees};
use crate::listeners::{ListenerRegistry, SubscriptionId};
use crate::outcome::{ContextState, NodeOutcome, RejectionReason, SynchronizationStats};

/// Last accepted pair plus the alignment it produced
#[derive(Debug, Clone, Copy)]
struct TrackingState {
    last_world: NaVector3<f64>,
    last_ar: NaVector3<f64>,
    alignment: Alignment,
}

#[derive(Debug, Clone, Copy)]
enum SyncState {
    Uninitialized,
    Tracking(TrackingState),
}

/// Running AR-to-world alignment estimate
///
/// Single writer: every mutating call takes `&mut self`, and listeners run
/// synchronously inside [`SynchronizationContext::add_node`].
#[derive(Debug)]
pub struct SynchronizationContext {
    /// Validated configuration
    config: SynchronizationConfig,
    /// Current state
    state: SyncState,
    /// Subscribed alignment consumers
    listeners: ListenerRegistry,
    /// Accepted / rejected counters
    stats: SynchronizationStats,
}

impl SynchronizationContext {
    /// Create a context, rejecting out-of-range configuration
    pub fn new(config: SynchronizationConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self {
            config,
            state: SyncState::Uninitialized,
            listeners: ListenerRegistry::new(),
            stats: SynchronizationStats::default(),
        })
    }

    /// Replace the configuration; the current alignment is kept
    pub fn reconfigure(&mut self, config: SynchronizationConfig) -> Result<(), ContractError> {
        config.validate()?;
        info!(?config, "synchronization context reconfigured");
        self.config = config;
        Ok(())
    }

    /// Register an alignment listener
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Alignment) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove an alignment listener
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Feed a (world, AR-local) pair without accuracy information
    pub fn add_synchronization_node(
        &mut self,
        world_position: Vector3,
        ar_local_position: Vector3,
    ) -> NodeOutcome {
        self.add_node(SynchronizationNode::new(world_position, ar_local_position))
    }

    /// Feed a synchronization node
    ///
    /// Accepted nodes update the alignment and notify every listener before
    /// this returns. Rejected nodes leave the context untouched.
    #[instrument(
        level = "trace",
        name = "sync_context_add_node",
        skip(self, node),
        fields(world = %node.world_position, ar = %node.ar_local_position)
    )]
    pub fn add_node(&mut self, node: SynchronizationNode) -> NodeOutcome {
        if !node.is_finite() {
            warn!(
                world = ?node.world_position,
                ar = ?node.ar_local_position,
                "non-finite synchronization node rejected"
            );
            return self.reject(RejectionReason::NonFinitePosition);
        }

        let world = NaVector3::from(node.world_position);
        let ar = NaVector3::from(node.ar_local_position);

        let evaluated = match &self.state {
            SyncState::Uninitialized => Ok((self.bootstrap(&world, &ar, node.heading), 0.0)),
            SyncState::Tracking(tracking) => self
                .blend(tracking, &world, &ar, node.accuracy)
                .map(|alignment| {
                    let correction = alignment
                        .position
                        .distance(&tracking.alignment.position);
                    (alignment, correction)
                }),
        };

        let (alignment, correction) = match evaluated {
            Ok(accepted) => accepted,
            Err(reason) => return self.reject(reason),
        };

        if matches!(self.state, SyncState::Uninitialized) {
            info!(alignment = %alignment.position, "synchronization context tracking");
        }

        self.state = SyncState::Tracking(TrackingState {
            last_world: world,
            last_ar: ar,
            alignment,
        });
        self.stats.accepted += 1;
        record_accepted(&alignment, correction);

        self.listeners.notify(&alignment);
        NodeOutcome::Accepted(alignment)
    }

    /// Current alignment, if any node has been accepted
    pub fn alignment(&self) -> Option<Alignment> {
        match &self.state {
            SyncState::Uninitialized => None,
            SyncState::Tracking(tracking) => Some(tracking.alignment),
        }
    }

    /// Last accepted (world, AR-local) pair
    pub fn last_accepted(&self) -> Option<(Vector3, Vector3)> {
        match &self.state {
            SyncState::Uninitialized => None,
            SyncState::Tracking(tracking) => {
                Some((tracking.last_world.into(), tracking.last_ar.into()))
            }
        }
    }

    pub fn state(&self) -> ContextState {
        match self.state {
            SyncState::Uninitialized => ContextState::Uninitialized,
            SyncState::Tracking(_) => ContextState::Tracking,
        }
    }

    pub fn config(&self) -> &SynchronizationConfig {
        &self.config
    }

    pub fn stats(&self) -> SynchronizationStats {
        self.stats
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// First alignment; with heading estimation on, a finite compass
    /// heading seeds the yaw
    fn bootstrap(
        &self,
        world: &NaVector3<f64>,
        ar: &NaVector3<f64>,
        heading: Option<f64>,
    ) -> Alignment {
        let rotation = heading
            .filter(|h| self.config.estimate_heading && h.is_finite())
            .map(normalize_degrees)
            .unwrap_or(0.0);
        Alignment {
            position: (world - yaw_rotation(rotation) * ar).into(),
            rotation,
            bias: 1.0,
            sequence: 1,
        }
    }

    fn blend(
        &self,
        tracking: &TrackingState,
        world: &NaVector3<f64>,
        ar: &NaVector3<f64>,
        accuracy: Option<f64>,
    ) -> Result<Alignment, RejectionReason> {
        let world_delta = world - tracking.last_world;
        let movement = world_delta.norm();
        if movement < self.config.minimum_delta_distance {
            return Err(RejectionReason::InsufficientMovement {
                distance: movement,
                minimum: self.config.minimum_delta_distance,
            });
        }

        let ar_delta = ar - tracking.last_ar;
        let displacement = ar_delta.norm();
        if displacement > self.config.ar_trust_range {
            return Err(RejectionReason::ArDriftExceeded {
                displacement,
                trust_range: self.config.ar_trust_range,
            });
        }

        let bias = effective_bias(&self.config, displacement, accuracy);
        let previous = &tracking.alignment;

        let candidate_yaw = if self.config.estimate_heading {
            estimate_yaw(&world_delta, &ar_delta).unwrap_or(previous.rotation)
        } else {
            previous.rotation
        };
        let rotation = lerp_degrees(previous.rotation, candidate_yaw, bias);

        let candidate = world - yaw_rotation(rotation) * ar;
        let position = NaVector3::from(previous.position).lerp(&candidate, bias);

        Ok(Alignment {
            position: position.into(),
            rotation,
            bias,
            sequence: previous.sequence + 1,
        })
    }

    fn reject(&mut self, reason: RejectionReason) -> NodeOutcome {
        debug!(reason = reason.label(), details = ?reason, "synchronization node rejected");
        self.stats.record_rejection(&reason);
        metrics::counter!("ar_sync_nodes_total", "outcome" => "rejected").increment(1);
        metrics::counter!("ar_sync_nodes_rejected_total", "reason" => reason.label())
            .increment(1);
        NodeOutcome::Rejected(reason)
    }
}

fn record_accepted(alignment: &Alignment, correction: f64) {
    metrics::counter!("ar_sync_nodes_total", "outcome" => "accepted").increment(1);
    metrics::histogram!("ar_sync_bias").record(alignment.bias);
    metrics::histogram!("ar_sync_alignment_correction_m").record(correction);
}
