//! Configuration validation
//!
//! Rules:
//! - synchronization ranges (bias in [0, 1], non-negative distances, positive trust range)
//! - map anchor inside Web Mercator bounds, scale > 0
//! - sink names non-empty and unique
//! - file sinks declare a `path`, queue capacity > 0

use std::collections::HashSet;

use contracts::{ContractError, MapAnchor, SessionBlueprint, SinkType};

/// Latitude limit of the spherical Web Mercator projection
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_6;

/// Validate a SessionBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    blueprint.synchronization.validate()?;
    if let Some(anchor) = &blueprint.map {
        validate_map_anchor(anchor)?;
    }
    validate_sinks(blueprint)?;
    Ok(())
}

/// Validate the projection anchor
pub fn validate_map_anchor(anchor: &MapAnchor) -> Result<(), ContractError> {
    let center = &anchor.center;

    if !center.latitude.is_finite() || center.latitude.abs() > MAX_MERCATOR_LATITUDE {
        return Err(ContractError::out_of_range(
            "map.center.latitude",
            center.latitude,
            "a latitude within ±85.0511 degrees",
        ));
    }

    if !center.longitude.is_finite() || center.longitude.abs() > 180.0 {
        return Err(ContractError::out_of_range(
            "map.center.longitude",
            center.longitude,
            "a longitude within ±180 degrees",
        ));
    }

    if !anchor.scale.is_finite() || anchor.scale <= 0.0 {
        return Err(ContractError::out_of_range(
            "map.scale",
            anchor.scale,
            "a finite scale > 0",
        ));
    }

    Ok(())
}

/// Sinks are addressed by name in logs and per-sink metrics
fn validate_sinks(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::invalid_sink(
                format!("#{idx}"),
                "name cannot be empty",
            ));
        }

        if !seen.insert(&sink.name) {
            return Err(ContractError::invalid_sink(&sink.name, "duplicate sink name"));
        }

        if sink.queue_capacity == 0 {
            return Err(ContractError::invalid_sink(
                &sink.name,
                "queue_capacity must be > 0",
            ));
        }

        if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
            return Err(ContractError::invalid_sink(
                &sink.name,
                "file sink requires a 'path' parameter",
            ));
        }
    }
    Ok(())
}
