//! Fusion-window metric collection.
//!
//! Collects and aggregates runtime metrics from emitted `WindowSnapshot`s.

use contracts::WindowSnapshot;
use metrics::{counter, gauge, histogram};

/// Record metrics from one emitted window snapshot.
///
/// Called once per snapshot the fusion coordinator emits.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_window_metrics;
///
/// if let Some(snapshot) = outcome.snapshot {
///     record_window_metrics(&snapshot);
///     // ...
/// }
/// ```
pub fn record_window_metrics(snapshot: &WindowSnapshot) {
    counter!("race_engine_windows_total").increment(1);

    // Absolute slot position (for detecting stalls)
    gauge!("race_engine_last_start_slot").set(snapshot.start_slot as f64);

    // Trigger opportunities per emission
    histogram!("race_engine_predict_time").record(snapshot.predict_time as f64);
    if snapshot.predict_time > 1 {
        counter!("race_engine_multi_trigger_windows_total").increment(1);
    }

    // Per-source fill ratio over the covered prefix
    let slots = snapshot.slot_count();
    for (position, window) in &snapshot.windows {
        let filled = window.iter().filter(|s| s.is_some()).count();
        let fill_ratio = filled as f64 / slots as f64;

        gauge!(
            "race_engine_window_fill_ratio",
            "source" => position.label()
        )
        .set(fill_ratio);

        let gaps = slots - filled;
        if gaps > 0 {
            counter!(
                "race_engine_window_gap_slots_total",
                "source" => position.label()
            )
            .increment(gaps as u64);
        }
    }
}

/// Record one received telemetry sample.
pub fn record_sample_received(source: &str) {
    counter!(
        "race_engine_samples_received_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record a summary submission attempt.
pub fn record_summary_submitted(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "race_engine_summaries_submitted_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record sampling-timer lag (scheduled tick time to actual fire time).
pub fn record_tick_lag_ms(lag_ms: f64) {
    histogram!("race_engine_tick_lag_ms").record(lag_ms);
}

/// Fusion-window metrics aggregator.
///
/// Aggregates in memory so the pipeline can print an end-of-match summary.
#[derive(Debug, Clone, Default)]
pub struct MatchMetricsAggregator {
    /// Total windows emitted
    pub total_windows: u64,

    /// Total trigger opportunities across all windows
    pub total_triggers: u64,

    /// Windows carrying more than one trigger opportunity
    pub multi_trigger_windows: u64,

    /// Fill-ratio statistics per source
    pub fill_stats: std::collections::HashMap<String, RunningStats>,

    /// Gap slots per source
    pub gap_counts: std::collections::HashMap<String, u64>,
}

impl MatchMetricsAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot into the aggregate.
    pub fn update(&mut self, snapshot: &WindowSnapshot) {
        self.total_windows += 1;
        self.total_triggers += snapshot.predict_time as u64;
        if snapshot.predict_time > 1 {
            self.multi_trigger_windows += 1;
        }

        let slots = snapshot.slot_count();
        for (position, window) in &snapshot.windows {
            let filled = window.iter().filter(|s| s.is_some()).count();
            let label = position.label().to_string();

            self.fill_stats
                .entry(label.clone())
                .or_default()
                .push(filled as f64 / slots as f64);

            let gaps = (slots - filled) as u64;
            if gaps > 0 {
                *self.gap_counts.entry(label).or_insert(0) += gaps;
            }
        }
    }

    /// Produce a summary report.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_windows: self.total_windows,
            total_triggers: self.total_triggers,
            multi_trigger_windows: self.multi_trigger_windows,
            multi_trigger_rate: if self.total_windows > 0 {
                self.multi_trigger_windows as f64 / self.total_windows as f64 * 100.0
            } else {
                0.0
            },
            fill_ratios: self
                .fill_stats
                .iter()
                .map(|(source, stats)| (source.clone(), StatsSummary::from(stats)))
                .collect(),
            gap_counts: self.gap_counts.clone(),
        }
    }

    /// Reset the aggregate.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated metrics report.
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_windows: u64,
    pub total_triggers: u64,
    pub multi_trigger_windows: u64,
    pub multi_trigger_rate: f64,
    pub fill_ratios: std::collections::HashMap<String, StatsSummary>,
    pub gap_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fusion Metrics Summary ===")?;
        writeln!(f, "Windows emitted: {}", self.total_windows)?;
        writeln!(f, "Trigger opportunities: {}", self.total_triggers)?;
        writeln!(
            f,
            "Multi-trigger windows: {} ({:.2}%)",
            self.multi_trigger_windows, self.multi_trigger_rate
        )?;

        if !self.fill_ratios.is_empty() {
            writeln!(f, "Fill ratio by source:")?;
            for (source, stats) in &self.fill_ratios {
                writeln!(f, "  {}: {}", source, stats)?;
            }
        }

        if !self.gap_counts.is_empty() {
            writeln!(f, "Gap slots by source:")?;
            for (source, count) in &self.gap_counts {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary.
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Fold in a new value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum.
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MotionData, SourcePosition, TelemetrySample};
    use std::collections::HashMap;

    fn snapshot(filled_phone: usize, predict_time: u32) -> WindowSnapshot {
        let slots = 10;
        let mut window: Vec<Option<TelemetrySample>> = vec![None; slots];
        for slot in window.iter_mut().take(filled_phone) {
            *slot = Some(TelemetrySample::motion(
                SourcePosition::Phone,
                0,
                MotionData::default(),
            ));
        }
        WindowSnapshot {
            base_time_ms: 0,
            start_slot: 0,
            window_len: slots - 1,
            predict_time,
            windows: HashMap::from([(SourcePosition::Phone, window)]),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = MatchMetricsAggregator::new();

        aggregator.update(&snapshot(8, 1));
        aggregator.update(&snapshot(10, 3));

        assert_eq!(aggregator.total_windows, 2);
        assert_eq!(aggregator.total_triggers, 4);
        assert_eq!(aggregator.multi_trigger_windows, 1);
        assert_eq!(aggregator.gap_counts.get("phone"), Some(&2));

        let fill = aggregator.fill_stats.get("phone").unwrap();
        assert_eq!(fill.count(), 2);
        assert!((fill.mean() - 0.9).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = MatchMetricsAggregator::new();
        aggregator.update(&snapshot(5, 2));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Windows emitted: 1"));
        assert!(output.contains("100.00%"));
        assert!(output.contains("phone"));
    }
}
