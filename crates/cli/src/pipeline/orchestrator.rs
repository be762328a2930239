//! Match pipeline orchestrator - wires sources, session and sinks together.
//!
//! Telemetry comes from the mock sources in the `sources` crate: the phone
//! walks the straight route from the start zone to the finish zone, each
//! configured wearable synthesizes a periodic motion signal. The rest of the
//! pipeline (fusion, effects, lifecycle, scoring) runs exactly as it would
//! with real hardware.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    ContractError, Effect, EffectId, MatchBlueprint, MatchContext, MatchEvent, MatchSummary,
    SourcePosition, Sport, SubmissionSink,
};
use effects::{
    EffectEngine, PedalStrokeConfig, PedalStrokeEstimator, StepCadenceConfig, StepCadenceEstimator,
};
use lifecycle::{MatchSession, MatchSessionConfig, SessionCommand};
use observability::{record_window_metrics, MatchMetricsAggregator};
use sources::{MockPhone, MockPhoneConfig, MockWearable, MockWearableConfig, SourceHub};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;

/// Match pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The match blueprint
    pub blueprint: MatchBlueprint,

    /// Match timeout (None = until finish geofence or command)
    pub timeout: Option<Duration>,

    /// Wearable fan-in channel capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Simulated athlete speed override (None = sport default)
    pub speed_mps: Option<f64>,

    /// Summary JSON output path (None = log only)
    pub output: Option<PathBuf>,
}

/// Main match pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run one match to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup wearable sources
        info!("Setting up telemetry sources...");
        let mut hub = SourceHub::new(self.config.buffer_size);
        for position in &blueprint.sources {
            hub.register(Box::new(MockWearable::new(wearable_config(
                blueprint.sport,
                *position,
            ))));
        }
        let wearable_rx = hub
            .take_receiver()
            .context("Failed to get wearable receiver")?;
        let source_metrics = hub.metrics();
        let active_wearables = hub.source_count();

        info!(active_wearables, "Telemetry sources configured");

        // Setup effect engine
        let aggregator = Arc::new(Mutex::new(MatchMetricsAggregator::new()));
        let engine = build_engine(blueprint, aggregator.clone())
            .context("Failed to build effect engine")?;

        info!(effects = engine.effect_count(), "Effect engine ready");

        // Simulated athlete: straight route from the start zone to the finish
        let speed_mps = self
            .config
            .speed_mps
            .unwrap_or_else(|| default_speed(blueprint.sport));
        let phone = MockPhone::new(MockPhoneConfig {
            from: blueprint.geofence.start.center,
            to: blueprint.geofence.end.center,
            speed_mps,
            altitude_m: 500.0,
        });

        info!(speed_mps, "Simulated athlete configured");

        // Setup sinks
        let mut sinks: Vec<Box<dyn SubmissionSink>> = vec![Box::new(LogSink)];
        if let Some(path) = self.config.output.clone() {
            sinks.push(Box::new(JsonFileSink { path }));
        }

        // Setup session
        let session_config = MatchSessionConfig {
            sport: blueprint.sport,
            fusion: blueprint.fusion_config(),
            sampling: blueprint.sampling.clone(),
            geofence: blueprint.geofence,
            scoring: blueprint.scoring.clone(),
        };
        let session = MatchSession::new(
            session_config,
            Box::new(phone),
            engine,
            wearable_rx,
            sinks,
        );

        // Start everything
        let (command_tx, command_rx) = mpsc::channel(4);
        hub.start_all();
        let mut session_task = tokio::spawn(session.run(command_rx));
        command_tx
            .send(SessionCommand::Start)
            .await
            .context("Session ended before the start command")?;

        info!(timeout = ?self.config.timeout, "Match recording started");

        // Run with optional timeout; on expiry the session is stopped and
        // still produces a (did-not-finish) summary.
        let joined = if let Some(timeout) = self.config.timeout {
            tokio::select! {
                joined = &mut session_task => joined,
                _ = tokio::time::sleep(timeout) => {
                    warn!(timeout_secs = timeout.as_secs(), "Match timed out, stopping");
                    let _ = command_tx.send(SessionCommand::Stop).await;
                    session_task.await
                }
            }
        } else {
            session_task.await
        };

        // Shutdown
        info!("Shutting down pipeline...");
        hub.stop_all();

        let summary: MatchSummary = joined
            .context("Session task failed")?
            .context("Match session error")?;

        let fusion_metrics = aggregator
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default();

        let stats = PipelineStats {
            legitimacy_score: summary.legitimacy_score,
            elapsed_ms: summary.elapsed_ms,
            total_distance_m: summary.total_distance_m,
            finish_time_ms: summary.finish_time_ms,
            path_points: summary.path.len(),
            bonus_count: summary.bonuses.len(),
            bonus_seconds: summary.bonuses.iter().map(|b| b.bonus_seconds).sum(),
            samples_received: source_metrics.received(),
            samples_dropped: source_metrics.dropped(),
            active_wearables,
            duration: start_time.elapsed(),
            fusion_metrics,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            samples_per_sec = format!("{:.1}", stats.sample_rate()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Build the effect engine: window metrics tap, the sport's cadence
/// estimator, then the configured effects.
fn build_engine(
    blueprint: &MatchBlueprint,
    aggregator: Arc<Mutex<MatchMetricsAggregator>>,
) -> Result<EffectEngine, ContractError> {
    let mut builder = EffectEngine::builder().with_effect(Box::new(WindowMetricsEffect {
        aggregator,
    }));

    builder = match blueprint.sport {
        Sport::Cycling => builder.with_effect(Box::new(PedalStrokeEstimator::new(
            PedalStrokeConfig {
                source: preferred_source(
                    blueprint,
                    &[SourcePosition::LeftAnkle, SourcePosition::RightAnkle],
                    SourcePosition::LeftAnkle,
                ),
                slot_s: blueprint.fusion.step_ms as f64 / 1_000.0,
                window_slots: blueprint.fusion.max_prediction_window,
                ..Default::default()
            },
        ))),
        Sport::Running => builder.with_effect(Box::new(StepCadenceEstimator::new(
            StepCadenceConfig {
                source: preferred_source(
                    blueprint,
                    &[SourcePosition::LeftWrist, SourcePosition::RightWrist],
                    SourcePosition::LeftWrist,
                ),
                slot_s: blueprint.fusion.step_ms as f64 / 1_000.0,
                window_slots: blueprint.fusion.max_prediction_window,
                ..Default::default()
            },
        ))),
    };

    builder.with_definitions(&blueprint.effects)?.build()
}

/// First configured source from `preferred`, or `fallback`.
fn preferred_source(
    blueprint: &MatchBlueprint,
    preferred: &[SourcePosition],
    fallback: SourcePosition,
) -> SourcePosition {
    preferred
        .iter()
        .find(|p| blueprint.sources.contains(p))
        .copied()
        .unwrap_or(fallback)
}

/// Sport-typical simulated speed (m/s).
fn default_speed(sport: Sport) -> f64 {
    match sport {
        Sport::Running => 4.0,
        Sport::Cycling => 9.0,
    }
}

/// Mock wearable parameters for one position.
fn wearable_config(sport: Sport, position: SourcePosition) -> MockWearableConfig {
    MockWearableConfig {
        position,
        frequency_hz: 20.0,
        batch_size: 1,
        cadence_hz: match sport {
            Sport::Cycling => 1.2,
            Sport::Running => 1.4,
        },
        heart_rate_bpm: if position == SourcePosition::Chest {
            155.0
        } else {
            0.0
        },
    }
}

/// Effect tapping every window snapshot into the metrics pipeline.
struct WindowMetricsEffect {
    aggregator: Arc<Mutex<MatchMetricsAggregator>>,
}

impl Effect for WindowMetricsEffect {
    fn id(&self) -> EffectId {
        EffectId::from("window_metrics")
    }

    fn on_event(&mut self, event: &MatchEvent, _ctx: &mut MatchContext) {
        if let MatchEvent::WindowReady(snapshot) = event {
            record_window_metrics(snapshot);
            if let Ok(mut aggregator) = self.aggregator.lock() {
                aggregator.update(snapshot);
            }
        }
    }
}

/// Sink logging the summary fields.
struct LogSink;

impl SubmissionSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn submit(&mut self, summary: &MatchSummary) -> Result<(), ContractError> {
        info!(
            sport = ?summary.sport,
            score = summary.legitimacy_score,
            finish_time_ms = summary.finish_time_ms,
            elapsed_ms = summary.elapsed_ms,
            distance_m = format!("{:.1}", summary.total_distance_m),
            bonuses = summary.bonuses.len(),
            "Match summary"
        );
        Ok(())
    }
}

/// Sink writing the summary as pretty JSON.
struct JsonFileSink {
    path: PathBuf,
}

impl SubmissionSink for JsonFileSink {
    fn name(&self) -> &str {
        "json_file"
    }

    fn submit(&mut self, summary: &MatchSummary) -> Result<(), ContractError> {
        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| ContractError::submission("json_file", e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| ContractError::submission("json_file", e.to_string()))?;
        info!(path = %self.path.display(), "Summary written");
        Ok(())
    }
}
