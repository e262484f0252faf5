//! Node outcomes and context counters.

use serde::Serialize;

use contracts::Alignment;

/// Lifecycle phase of a synchronization context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    /// No node accepted yet; the next finite node bootstraps the alignment
    Uninitialized,
    /// A last-accepted pair exists; nodes pass through the gates
    Tracking,
}

/// Why a node was discarded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A position component was NaN or infinite
    NonFinitePosition,
    /// World movement since the last accepted node was below the minimum
    InsufficientMovement { distance: f64, minimum: f64 },
    /// AR displacement since the last accepted node exceeded the trust range
    ArDriftExceeded { displacement: f64, trust_range: f64 },
}

impl RejectionReason {
    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::NonFinitePosition => "non_finite",
            Self::InsufficientMovement { .. } => "insufficient_movement",
            Self::ArDriftExceeded { .. } => "ar_drift_exceeded",
        }
    }
}

/// Result of feeding one node into the context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeOutcome {
    /// Node accepted; carries the alignment that was emitted
    Accepted(Alignment),
    /// Node discarded; no state change, no event
    Rejected(RejectionReason),
}

impl NodeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        match self {
            Self::Accepted(alignment) => Some(alignment),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Accepted / rejected node counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SynchronizationStats {
    pub accepted: u64,
    pub rejected_non_finite: u64,
    pub rejected_movement: u64,
    pub rejected_drift: u64,
}

impl SynchronizationStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_non_finite + self.rejected_movement + self.rejected_drift
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected()
    }

    pub(crate) fn record_rejection(&mut self, reason: &RejectionReason) {
        match reason {
            RejectionReason::NonFinitePosition => self.rejected_non_finite += 1,
            RejectionReason::InsufficientMovement { .. } => self.rejected_movement += 1,
            RejectionReason::ArDriftExceeded { .. } => self.rejected_drift += 1,
        }
    }
}
