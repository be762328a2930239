//! Match run statistics.

use std::time::Duration;

use observability::MatchMetricsAggregator;

/// Statistics from one match run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Legitimacy score from the validation scorer (0-100, or sentinels)
    pub legitimacy_score: f64,

    /// Elapsed recording time (ms)
    pub elapsed_ms: i64,

    /// Total recorded distance (m)
    pub total_distance_m: f64,

    /// Reconstructed finish-line crossing time (ms since epoch)
    pub finish_time_ms: i64,

    /// Path points recorded (~3 s cadence)
    pub path_points: usize,

    /// Effects that earned bonus credit
    pub bonus_count: usize,

    /// Total bonus seconds across all effects
    pub bonus_seconds: f64,

    /// Wearable samples delivered through the fan-in channel
    pub samples_received: u64,

    /// Wearable samples dropped on channel backpressure
    pub samples_dropped: u64,

    /// Number of wearable sources that were active
    pub active_wearables: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Fusion window metrics aggregator
    pub fusion_metrics: MatchMetricsAggregator,
}

impl PipelineStats {
    /// Wearable sample throughput in samples per second
    pub fn sample_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Channel drop rate as percentage
    #[allow(dead_code)]
    pub fn drop_rate(&self) -> f64 {
        let total = self.samples_received + self.samples_dropped;
        if total > 0 {
            (self.samples_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Human-readable score label, resolving the sentinel values
    pub fn score_label(&self) -> String {
        if self.legitimacy_score == scoring::COULD_NOT_EVALUATE {
            "could not evaluate".to_string()
        } else if self.legitimacy_score == scoring::DID_NOT_FINISH {
            "did not finish".to_string()
        } else {
            format!("{:.1} / 100", self.legitimacy_score)
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Match Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Recorded: {:.2}s", self.elapsed_ms as f64 / 1_000.0);
        println!("   ├─ Distance: {:.1} m", self.total_distance_m);
        println!("   ├─ Path points: {}", self.path_points);
        println!("   ├─ Score: {}", self.score_label());
        println!("   └─ Finish time: {} ms", self.finish_time_ms);

        if self.bonus_count > 0 {
            println!("\n✨ Bonuses");
            println!("   ├─ Effects credited: {}", self.bonus_count);
            println!("   └─ Total bonus: {:.1} s", self.bonus_seconds);
        }

        println!("\n📡 Telemetry");
        println!("   ├─ Active wearables: {}", self.active_wearables);
        println!("   ├─ Samples received: {}", self.samples_received);
        println!("   ├─ Samples dropped: {}", self.samples_dropped);
        println!("   └─ Sample rate: {:.1}/s", self.sample_rate());

        let summary = self.fusion_metrics.summary();

        println!("\n📈 Fusion Metrics");
        println!("   ├─ Windows emitted: {}", summary.total_windows);
        println!("   ├─ Trigger opportunities: {}", summary.total_triggers);
        println!(
            "   └─ Multi-trigger windows: {} ({:.2}%)",
            summary.multi_trigger_windows, summary.multi_trigger_rate
        );

        if !summary.fill_ratios.is_empty() {
            println!("\n🧩 Window Fill by Source");
            for (source, stats) in &summary.fill_ratios {
                println!("   ├─ {}: {}", source, stats);
            }
        }

        println!();
    }
}
