//! `score` command implementation.

use anyhow::{Context, Result};
use contracts::MatchSummary;
use serde::Serialize;
use tracing::info;

use crate::cli::ScoreArgs;

/// Offline scoring result for JSON output
#[derive(Serialize)]
struct ScoreResult {
    input: String,
    sport: String,
    recorded_score: f64,
    recomputed_score: f64,
    path_points: usize,
    total_distance_m: f64,
    reached_finish: bool,
}

/// Execute the `score` command: re-run the validation scorer over a recorded
/// match summary (as written by `run --output`).
pub fn run_score(args: &ScoreArgs) -> Result<()> {
    info!(input = %args.input.display(), "Scoring recorded match");

    if !args.input.exists() {
        anyhow::bail!("Summary file not found: {}", args.input.display());
    }

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let summary: MatchSummary = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse match summary from {}", args.input.display()))?;

    // The recorded sentinel is the only trace of whether the finish-candidate
    // buffer was ever reached; the raw path cannot tell a stop from a finish.
    let reached_finish = summary.legitimacy_score != scoring::DID_NOT_FINISH;
    let recomputed = scoring::score(
        summary.sport,
        &summary.path,
        &summary.sport_samples,
        reached_finish,
    );

    let result = ScoreResult {
        input: args.input.display().to_string(),
        sport: format!("{:?}", summary.sport),
        recorded_score: summary.legitimacy_score,
        recomputed_score: recomputed,
        path_points: summary.path.len(),
        total_distance_m: summary.total_distance_m,
        reached_finish,
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize score result")?;
        println!("{}", json);
    } else {
        print_score_result(&result);
    }

    Ok(())
}

fn score_label(score: f64) -> String {
    if score == scoring::COULD_NOT_EVALUATE {
        "could not evaluate".to_string()
    } else if score == scoring::DID_NOT_FINISH {
        "did not finish".to_string()
    } else {
        format!("{:.1} / 100", score)
    }
}

fn print_score_result(result: &ScoreResult) {
    println!("Scored {} ({})", result.input, result.sport);
    println!("  Path points: {}", result.path_points);
    println!("  Distance: {:.1} m", result.total_distance_m);
    println!("  Recorded score:   {}", score_label(result.recorded_score));
    println!(
        "  Recomputed score: {}",
        score_label(result.recomputed_score)
    );

    if result.recorded_score != result.recomputed_score {
        println!("\n⚠ Scores differ - the summary was recorded with different thresholds or a debug override");
    }
}
