//! Synchronization context configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Synchronization context configuration
///
/// Set once at construction; the context validates it before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationConfig {
    /// Minimum world movement (metres) since the last accepted node
    #[serde(default = "default_minimum_delta_distance")]
    pub minimum_delta_distance: f64,

    /// Maximum AR-local displacement (metres) since the last accepted node
    #[serde(default = "default_ar_trust_range")]
    pub ar_trust_range: f64,

    /// Derive the blend factor from a confidence signal instead of using it verbatim
    #[serde(default)]
    pub use_automatic_synchronization_bias: bool,

    /// Blend factor in [0, 1]: 0 ignores new samples, 1 replaces the alignment
    #[serde(default = "default_synchronization_bias")]
    pub synchronization_bias: f64,

    /// Estimate the yaw between frames from consecutive accepted displacements
    #[serde(default)]
    pub estimate_heading: bool,
}

fn default_minimum_delta_distance() -> f64 {
    2.0
}

fn default_ar_trust_range() -> f64 {
    10.0
}

fn default_synchronization_bias() -> f64 {
    1.0
}

impl Default for SynchronizationConfig {
    fn default() -> Self {
        Self {
            minimum_delta_distance: default_minimum_delta_distance(),
            ar_trust_range: default_ar_trust_range(),
            use_automatic_synchronization_bias: false,
            synchronization_bias: default_synchronization_bias(),
            estimate_heading: false,
        }
    }
}

impl SynchronizationConfig {
    /// Check value ranges
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ContractError> {
        if !self.minimum_delta_distance.is_finite() || self.minimum_delta_distance < 0.0 {
            return Err(ContractError::out_of_range(
                "synchronization.minimum_delta_distance",
                self.minimum_delta_distance,
                "a finite distance >= 0",
            ));
        }

        if !self.ar_trust_range.is_finite() || self.ar_trust_range <= 0.0 {
            return Err(ContractError::out_of_range(
                "synchronization.ar_trust_range",
                self.ar_trust_range,
                "a finite distance > 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.synchronization_bias) {
            return Err(ContractError::out_of_range(
                "synchronization.synchronization_bias",
                self.synchronization_bias,
                "[0, 1]",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SynchronizationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.minimum_delta_distance, 2.0);
        assert_eq!(config.ar_trust_range, 10.0);
        assert_eq!(config.synchronization_bias, 1.0);
    }

    #[test]
    fn test_bias_out_of_range() {
        let config = SynchronizationConfig {
            synchronization_bias: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("synchronization_bias"), "got: {err}");
    }

    #[test]
    fn test_nan_bias_rejected() {
        let config = SynchronizationConfig {
            synchronization_bias: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let config = SynchronizationConfig {
            minimum_delta_distance: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("minimum_delta_distance"), "got: {err}");
    }

    #[test]
    fn test_zero_trust_range_rejected() {
        let config = SynchronizationConfig {
            ar_trust_range: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("ar_trust_range"), "got: {err}");
    }

    #[test]
    fn test_serde_defaults() {
        let config: SynchronizationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SynchronizationConfig::default());
    }
}
