//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SessionBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// `invalid` for bad settings, `unreadable` for missing or unreadable files
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    name: String,
    map_configured: bool,
    automatic_bias: bool,
    estimate_heading: bool,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            error_kind: Some("unreadable"),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                error_kind: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    name: blueprint.name.clone(),
                    map_configured: blueprint.map.is_some(),
                    automatic_bias: blueprint.synchronization.use_automatic_synchronization_bias,
                    estimate_heading: blueprint.synchronization.estimate_heading,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            error_kind: Some(if e.is_config() { "invalid" } else { "unreadable" }),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let sync = &blueprint.synchronization;

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - alignments will not be recorded".to_string());
    }

    if blueprint.map.is_none() {
        warnings.push(
            "No [map] section - traces must carry the anchor in map_initialized".to_string(),
        );
    }

    if sync.synchronization_bias == 0.0 {
        warnings.push(
            "synchronization_bias is 0 - the alignment never moves after the first node"
                .to_string(),
        );
    }

    if sync.minimum_delta_distance > sync.ar_trust_range {
        warnings.push(format!(
            "minimum_delta_distance ({}) exceeds ar_trust_range ({}) - consistent walks \
             will be rejected by one gate or the other",
            sync.minimum_delta_distance, sync.ar_trust_range
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Session: {}", summary.name);
            println!("  Map configured: {}", summary.map_configured);
            println!("  Automatic bias: {}", summary.automatic_bias);
            println!("  Estimate heading: {}", summary.estimate_heading);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
