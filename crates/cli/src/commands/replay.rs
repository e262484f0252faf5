//! `replay` command implementation.

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }
    if !args.trace.exists() {
        return Err(CliError::trace_not_found(&args.trace).into());
    }
    if !args.speed.is_finite() || args.speed < 0.0 {
        return Err(CliError::InvalidSpeed { speed: args.speed }.into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        session = %blueprint.name,
        map = ?blueprint.map.map(|anchor| anchor.center.to_string()),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        trace_path: args.trace.clone(),
        speed: (args.speed > 0.0).then_some(args.speed),
        max_alignments: (args.max_alignments > 0).then_some(args.max_alignments),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping replay...");
        let _ = shutdown_tx.send(true);
    });

    info!("Starting replay...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_rx)
        .await
        .context("Replay failed")?;

    info!(
        events = stats.events,
        accepted = stats.context.accepted,
        rejected = stats.context.rejected(),
        duration_secs = stats.duration.as_secs_f64(),
        "Replay finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::SessionBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Session: {}", blueprint.name);
    match &blueprint.map {
        Some(anchor) => println!("Map: {} (scale {})", anchor.center, anchor.scale),
        None => println!("Map: from trace"),
    }

    let sync = &blueprint.synchronization;
    println!("\nSynchronization:");
    println!("  Minimum delta distance: {} m", sync.minimum_delta_distance);
    println!("  AR trust range: {} m", sync.ar_trust_range);
    println!(
        "  Bias: {} ({})",
        sync.synchronization_bias,
        if sync.use_automatic_synchronization_bias {
            "automatic"
        } else {
            "manual"
        }
    );
    println!("  Estimate heading: {}", sync.estimate_heading);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
