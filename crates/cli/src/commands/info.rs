//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::EffectParams;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Blueprint info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    sport: String,
    sources: Vec<String>,
    sampling: SamplingInfo,
    fusion: FusionInfo,
    geofence: GeofenceInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    effects: Vec<EffectInfo>,
}

#[derive(Serialize)]
struct SamplingInfo {
    tick_ms: i64,
    elapsed_every_ticks: u64,
    cycle_every_ticks: u64,
}

#[derive(Serialize)]
struct FusionInfo {
    step_ms: i64,
    max_prediction_window: usize,
    delay_tolerance_slots: usize,
}

#[derive(Serialize)]
struct GeofenceInfo {
    start: ZoneInfo,
    end: ZoneInfo,
}

#[derive(Serialize)]
struct ZoneInfo {
    latitude: f64,
    longitude: f64,
    radius_m: f64,
}

#[derive(Serialize)]
struct EffectInfo {
    id: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading blueprint info");

    if !args.config.exists() {
        anyhow::bail!("Blueprint file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load blueprint from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize blueprint info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::MatchBlueprint) -> ConfigInfo {
    let effects = blueprint
        .effects
        .iter()
        .map(|e| match &e.params {
            EffectParams::ThresholdBonus(params) => EffectInfo {
                id: e.id.to_string(),
                kind: "threshold_bonus".to_string(),
                metric: Some(format!("{:?}", params.metric)),
                min: params.min,
                max: params.max,
            },
        })
        .collect();

    ConfigInfo {
        sport: format!("{:?}", blueprint.sport),
        sources: blueprint
            .sources
            .iter()
            .map(|p| p.label().to_string())
            .collect(),
        sampling: SamplingInfo {
            tick_ms: blueprint.sampling.tick_ms,
            elapsed_every_ticks: blueprint.sampling.elapsed_every_ticks,
            cycle_every_ticks: blueprint.sampling.cycle_every_ticks,
        },
        fusion: FusionInfo {
            step_ms: blueprint.fusion.step_ms,
            max_prediction_window: blueprint.fusion.max_prediction_window,
            delay_tolerance_slots: blueprint.fusion.delay_tolerance_slots,
        },
        geofence: GeofenceInfo {
            start: ZoneInfo {
                latitude: blueprint.geofence.start.center.latitude,
                longitude: blueprint.geofence.start.center.longitude,
                radius_m: blueprint.geofence.start.radius_m,
            },
            end: ZoneInfo {
                latitude: blueprint.geofence.end.center.latitude,
                longitude: blueprint.geofence.end.center.longitude,
                radius_m: blueprint.geofence.end.radius_m,
            },
        },
        effects,
    }
}

fn print_config_info(blueprint: &contracts::MatchBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Race Engine Blueprint                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Match info
    println!("🏁 Match");
    println!("   ├─ Sport: {:?}", blueprint.sport);
    println!(
        "   ├─ Tick: {} ms ({} ms cycle)",
        blueprint.sampling.tick_ms,
        blueprint.sampling.tick_ms * blueprint.sampling.cycle_every_ticks as i64
    );
    println!(
        "   └─ Fusion window: {} slots of {} ms (+{} tolerance)",
        blueprint.fusion.max_prediction_window,
        blueprint.fusion.step_ms,
        blueprint.fusion.delay_tolerance_slots
    );

    // Sources
    println!("\n📡 Sources ({} wearables + phone)", blueprint.sources.len());
    println!("   ├─ phone (always active)");
    for (i, position) in blueprint.sources.iter().enumerate() {
        let is_last = i == blueprint.sources.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!("   {} {}", prefix, position.label());
    }

    // Geofence
    let start = &blueprint.geofence.start;
    let end = &blueprint.geofence.end;
    println!("\n📍 Geofence");
    println!(
        "   ├─ Start: ({:.5}, {:.5}) r={} m",
        start.center.latitude, start.center.longitude, start.radius_m
    );
    println!(
        "   └─ End:   ({:.5}, {:.5}) r={} m (candidates buffered within {} m)",
        end.center.latitude,
        end.center.longitude,
        end.radius_m,
        end.radius_m * 2.0
    );

    // Effects
    if !blueprint.effects.is_empty() {
        println!("\n✨ Effects ({})", blueprint.effects.len());
        for (i, effect) in blueprint.effects.iter().enumerate() {
            let is_last = i == blueprint.effects.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };

            if args.effects {
                let EffectParams::ThresholdBonus(params) = &effect.params;
                println!(
                    "   {} {} ({:?} in [{}, {}], +{} s/cycle, +{} s at end)",
                    prefix,
                    effect.id,
                    params.metric,
                    params.min.map_or("-∞".to_string(), |v| v.to_string()),
                    params.max.map_or("∞".to_string(), |v| v.to_string()),
                    params.bonus_seconds_per_cycle,
                    params.end_bonus_seconds
                );
            } else {
                println!("   {} {}", prefix, effect.id);
            }
        }
    }

    println!();
}
