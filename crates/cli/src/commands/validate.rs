//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{Sport, SourcePosition};
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
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    sport: String,
    wearable_count: usize,
    effect_count: usize,
    start_radius_m: f64,
    end_radius_m: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating blueprint");

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
        anyhow::bail!("Blueprint validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    sport: format!("{:?}", blueprint.sport),
                    wearable_count: blueprint.sources.len(),
                    effect_count: blueprint.effects.len(),
                    start_radius_m: blueprint.geofence.start.radius_m,
                    end_radius_m: blueprint.geofence.end.radius_m,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect blueprint warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::MatchBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Check for missing wearables
    if blueprint.sources.is_empty() {
        warnings
            .push("No wearable sources configured - the match runs on phone data only".to_string());
    }

    // Check that the sport's cadence estimator has its preferred source
    match blueprint.sport {
        Sport::Cycling => {
            let has_ankle = blueprint.sources.iter().any(|p| {
                matches!(p, SourcePosition::LeftAnkle | SourcePosition::RightAnkle)
            });
            if !has_ankle {
                warnings.push(
                    "No ankle wearable configured - the pedal-stroke estimator will report 0 rpm"
                        .to_string(),
                );
            }
        }
        Sport::Running => {
            let has_wrist = blueprint.sources.iter().any(|p| {
                matches!(p, SourcePosition::LeftWrist | SourcePosition::RightWrist)
            });
            if !has_wrist {
                warnings.push(
                    "No wrist wearable configured - the step-cadence estimator will report 0 spm"
                        .to_string(),
                );
            }
        }
    }

    // Check scoring switches
    if blueprint.scoring.debug_force_pass {
        warnings.push(format!(
            "scoring.debug_force_pass is enabled - every match will score {}",
            blueprint.scoring.forced_score
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Blueprint is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Sport: {}", summary.sport);
            println!("  Wearables: {}", summary.wearable_count);
            println!("  Effects: {}", summary.effect_count);
            println!(
                "  Geofence radii: start {} m / end {} m",
                summary.start_radius_m, summary.end_radius_m
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Blueprint is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
