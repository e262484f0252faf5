//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{SessionBlueprint, SynchronizationConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    version: String,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<MapInfo>,
    synchronization: &'a SynchronizationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo<'a>>,
}

#[derive(Serialize)]
struct MapInfo {
    latitude: f64,
    longitude: f64,
    scale: f64,
    mercator_x: f64,
    mercator_y: f64,
}

#[derive(Serialize)]
struct SinkInfo<'a> {
    name: &'a str,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &SessionBlueprint) -> ConfigInfo<'_> {
    let map = blueprint.map.map(|anchor| {
        let (mercator_x, mercator_y) = ingestion::lat_lon_to_meters(anchor.center);
        MapInfo {
            latitude: anchor.center.latitude,
            longitude: anchor.center.longitude,
            scale: anchor.scale,
            mercator_x,
            mercator_y,
        }
    });

    let sinks = blueprint
        .sinks
        .iter()
        .map(|s| SinkInfo {
            name: &s.name,
            sink_type: format!("{:?}", s.sink_type),
            queue_capacity: s.queue_capacity,
            path: s.params.get("path").map(String::as_str),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        name: &blueprint.name,
        map,
        synchronization: &blueprint.synchronization,
        sinks,
    }
}

fn print_config_info(blueprint: &SessionBlueprint) {
    println!("=== AR Syncer Configuration ===\n");

    println!("Session");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   └─ Name: {}", blueprint.name);

    println!("\nMap");
    match &blueprint.map {
        Some(anchor) => {
            let (mx, my) = ingestion::lat_lon_to_meters(anchor.center);
            println!("   ├─ Center: {}", anchor.center);
            println!("   ├─ Mercator: ({:.2}, {:.2}) m", mx, my);
            println!("   └─ Scale: {}", anchor.scale);
        }
        None => println!("   └─ (initialised from trace)"),
    }

    let sync = &blueprint.synchronization;
    println!("\nSynchronization");
    println!("   ├─ Minimum delta distance: {} m", sync.minimum_delta_distance);
    println!("   ├─ AR trust range: {} m", sync.ar_trust_range);
    println!(
        "   ├─ Automatic bias: {}",
        sync.use_automatic_synchronization_bias
    );
    println!("   ├─ Synchronization bias: {}", sync.synchronization_bias);
    println!("   └─ Estimate heading: {}", sync.estimate_heading);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeoCoordinate, MapAnchor, SinkConfig, SinkType};
    use std::collections::HashMap;

    #[test]
    fn test_build_config_info_json() {
        let mut blueprint = SessionBlueprint::new("walk");
        blueprint.map = Some(MapAnchor::new(GeoCoordinate::new(0.0, 0.0), 1.0));
        blueprint.sinks.push(SinkConfig {
            name: "out".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 8,
            params: HashMap::from([("path".to_string(), "out.jsonl".to_string())]),
        });

        let value = serde_json::to_value(build_config_info(&blueprint)).unwrap();
        assert_eq!(value["name"], "walk");
        assert_eq!(value["map"]["mercator_x"], 0.0);
        assert_eq!(value["synchronization"]["ar_trust_range"], 10.0);
        assert_eq!(value["sinks"][0]["path"], "out.jsonl");
    }
}
