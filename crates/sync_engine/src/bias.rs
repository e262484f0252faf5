//! Synchronization bias calculation.

use contracts::SynchronizationConfig;

/// Confidence derived from AR displacement since the last accepted node
///
/// Returns 1.0 for no displacement, falling linearly to 0.0 at the trust range.
pub fn drift_confidence(ar_displacement: f64, ar_trust_range: f64) -> f64 {
    if ar_trust_range <= 0.0 {
        return 0.0;
    }
    (1.0 - ar_displacement / ar_trust_range).clamp(0.0, 1.0)
}

/// Confidence derived from the declared location accuracy
///
/// `trust_range / (trust_range + accuracy)`: 1.0 for a perfect fix, 0.5 when the
/// fix is as uncertain as the trust range itself. Unknown accuracy counts as perfect.
pub fn accuracy_confidence(accuracy: Option<f64>, ar_trust_range: f64) -> f64 {
    match accuracy {
        Some(a) if a.is_nan() => 1.0,
        Some(a) if a.is_infinite() => 0.0,
        Some(a) if a > 0.0 => (ar_trust_range / (ar_trust_range + a)).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Blend factor applied to a new candidate alignment
///
/// Manual mode uses `synchronization_bias` verbatim. Automatic mode scales it
/// by drift and accuracy confidence, so the result never increases with AR
/// displacement or with location inaccuracy.
pub fn effective_bias(
    config: &SynchronizationConfig,
    ar_displacement: f64,
    accuracy: Option<f64>,
) -> f64 {
    let baseline = config.synchronization_bias.clamp(0.0, 1.0);
    if !config.use_automatic_synchronization_bias {
        return baseline;
    }

    let drift = drift_confidence(ar_displacement, config.ar_trust_range);
    let fix = accuracy_confidence(accuracy, config.ar_trust_range);
    (baseline * drift * fix).clamp(0.0, 1.0)
}
