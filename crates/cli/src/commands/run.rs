//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_match(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading blueprint");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Blueprint file not found: {}", args.config.display());
    }

    // Load and parse blueprint
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load blueprint from {}", args.config.display()))?;

    info!(
        sport = ?blueprint.sport,
        sources = blueprint.sources.len(),
        effects = blueprint.effects.len(),
        "Blueprint loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - blueprint is valid, exiting");
        print_blueprint_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        speed_mps: if args.speed > 0.0 {
            Some(args.speed)
        } else {
            None
        },
        output: args.output.clone(),
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting match...");

    // Run match with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        score = stats.legitimacy_score,
                        elapsed_ms = stats.elapsed_ms,
                        distance_m = format!("{:.1}", stats.total_distance_m),
                        path_points = stats.path_points,
                        "Match completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Match execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping match...");
        }
    }

    info!("Race Engine finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print blueprint summary for dry-run mode
fn print_blueprint_summary(blueprint: &contracts::MatchBlueprint) {
    println!("\n=== Blueprint Summary ===\n");
    println!("Sport: {:?}", blueprint.sport);

    println!("\nSources ({} wearables + phone):", blueprint.sources.len());
    for position in &blueprint.sources {
        println!("  - {}", position.label());
    }

    println!("\nSampling:");
    println!("  Tick: {} ms", blueprint.sampling.tick_ms);
    println!(
        "  Elapsed publication: every {} ticks",
        blueprint.sampling.elapsed_every_ticks
    );
    println!(
        "  Path-point cycle: every {} ticks",
        blueprint.sampling.cycle_every_ticks
    );

    println!("\nFusion:");
    println!("  Slot: {} ms", blueprint.fusion.step_ms);
    println!(
        "  Window: {} slots (+{} delay tolerance)",
        blueprint.fusion.max_prediction_window, blueprint.fusion.delay_tolerance_slots
    );

    let start = &blueprint.geofence.start;
    let end = &blueprint.geofence.end;
    println!("\nGeofence:");
    println!(
        "  Start: ({:.5}, {:.5}) r={} m",
        start.center.latitude, start.center.longitude, start.radius_m
    );
    println!(
        "  End:   ({:.5}, {:.5}) r={} m",
        end.center.latitude, end.center.longitude, end.radius_m
    );

    if !blueprint.effects.is_empty() {
        println!("\nEffects ({}):", blueprint.effects.len());
        for effect in &blueprint.effects {
            println!("  - {}", effect.id);
        }
    }

    println!();
}
