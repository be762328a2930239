//! Engine configuration contracts shared across crates.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::{EffectId, SourceMask, SourcePosition, Sport};

/// Complete per-match configuration.
///
/// Root document the config loader parses and validates. Everything the
/// engine needs to run one match is in here; runtime state never is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBlueprint {
    /// Competition sport; selects scoring thresholds and default effects
    pub sport: Sport,

    /// Wearable positions expected to stream. The phone is always active
    /// and does not need to be listed.
    #[serde(default)]
    pub sources: Vec<SourcePosition>,

    /// Fusion buffer geometry; `active_sources` is derived from `sources`
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Sampling-timer cadences
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Start and finish zones
    pub geofence: GeofenceConfig,

    /// Validation scorer switches
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Effects selected for this match
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
}

impl MatchBlueprint {
    /// Active-source mask: the declared wearables plus the phone.
    pub fn source_mask(&self) -> SourceMask {
        let mut mask = SourceMask::from_positions(&self.sources);
        mask.set(SourcePosition::Phone);
        mask
    }

    /// Fusion configuration with the active-source mask filled in.
    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            active_sources: self.source_mask(),
            ..self.fusion.clone()
        }
    }
}

/// Fusion coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Slot duration in milliseconds
    #[serde(default = "default_step_ms")]
    pub step_ms: i64,

    /// Extra slots retained beyond the prediction window to absorb source
    /// latency (60 slots = 3 s)
    #[serde(default = "default_delay_tolerance")]
    pub delay_tolerance_slots: usize,

    /// Largest window any consumer computes over, in slots
    #[serde(default = "default_prediction_window")]
    pub max_prediction_window: usize,

    /// Sources participating in readiness computation
    #[serde(default)]
    pub active_sources: SourceMask,
}

fn default_step_ms() -> i64 {
    50
}

fn default_delay_tolerance() -> usize {
    60
}

fn default_prediction_window() -> usize {
    60
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            delay_tolerance_slots: default_delay_tolerance(),
            max_prediction_window: default_prediction_window(),
            active_sources: SourceMask::default(),
        }
    }
}

impl FusionConfig {
    /// Total buffer capacity in slots.
    pub fn capacity(&self) -> usize {
        self.max_prediction_window + self.delay_tolerance_slots
    }
}

/// Sampling-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Timer tick period in milliseconds
    #[serde(default = "default_step_ms")]
    pub tick_ms: i64,

    /// Elapsed-time publication period, in ticks (20 ticks = 1 s)
    #[serde(default = "default_elapsed_ticks")]
    pub elapsed_every_ticks: u64,

    /// Path-point / cycle-event period, in ticks (60 ticks = 3 s)
    #[serde(default = "default_cycle_ticks")]
    pub cycle_every_ticks: u64,
}

fn default_elapsed_ticks() -> u64 {
    20
}

fn default_cycle_ticks() -> u64 {
    60
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_step_ms(),
            elapsed_every_ticks: default_elapsed_ticks(),
            cycle_every_ticks: default_cycle_ticks(),
        }
    }
}

/// One geofenced zone: a center point and radius.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoZone {
    /// Zone center
    pub center: GeoPoint,

    /// Zone radius (m)
    pub radius_m: f64,
}

/// Start/end geofence configuration for a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Start zone; positions inside set the "in valid area" flag pre-start
    pub start: GeoZone,

    /// End zone; 1x radius triggers stop, 2x radius buffers finish candidates
    pub end: GeoZone,
}

/// Validation scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// When set, the computed score is discarded and a fixed passing value
    /// substituted. The computation still runs for observability.
    #[serde(default)]
    pub debug_force_pass: bool,

    /// Score substituted under `debug_force_pass`
    #[serde(default = "default_forced_score")]
    pub forced_score: f64,
}

fn default_forced_score() -> f64 {
    80.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            debug_force_pass: false,
            forced_score: default_forced_score(),
        }
    }
}

/// One selected effect for a match: identifier plus typed parameters.
///
/// Parameters are parsed and validated once at load time with explicit
/// required/optional fields and typed defaults; malformed definitions fail
/// fast instead of silently defaulting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Effect identifier, unique within a match
    pub id: EffectId,

    /// Typed effect parameters
    pub params: EffectParams,
}

/// Typed effect parameter variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectParams {
    /// Bonus while a live metric stays inside a band
    ThresholdBonus(ThresholdBonusParams),
}

/// Live metric a threshold effect compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMetric {
    SpeedMps,
    AltitudeM,
    HeartRateBpm,
    PedalRpm,
    StepCadenceSpm,
}

/// Threshold-bonus effect parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdBonusParams {
    /// Metric to compare
    pub metric: BonusMetric,

    /// Inclusive lower band edge (None = unbounded)
    #[serde(default)]
    pub min: Option<f64>,

    /// Inclusive upper band edge (None = unbounded)
    #[serde(default)]
    pub max: Option<f64>,

    /// Bonus seconds credited per ~3 s cycle spent inside the band
    pub bonus_seconds_per_cycle: f64,

    /// Flat bonus seconds applied once at match end (0 = none)
    #[serde(default)]
    pub end_bonus_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_defaults() {
        let config = FusionConfig::default();
        assert_eq!(config.step_ms, 50);
        assert_eq!(config.capacity(), 120);
    }

    #[test]
    fn blueprint_mask_always_includes_phone() {
        let zone = GeoZone {
            center: GeoPoint {
                latitude: 48.0,
                longitude: 11.0,
            },
            radius_m: 50.0,
        };
        let blueprint = MatchBlueprint {
            sport: Sport::Running,
            sources: vec![SourcePosition::Chest],
            fusion: FusionConfig::default(),
            sampling: SamplingConfig::default(),
            geofence: GeofenceConfig {
                start: zone,
                end: zone,
            },
            scoring: ScoringConfig::default(),
            effects: Vec::new(),
        };
        let mask = blueprint.source_mask();
        assert!(mask.contains(SourcePosition::Phone));
        assert!(mask.contains(SourcePosition::Chest));
        assert_eq!(mask.len(), 2);
        assert_eq!(blueprint.fusion_config().active_sources, mask);
    }

    #[test]
    fn sampling_defaults_match_cadence() {
        let config = SamplingConfig::default();
        // 20 ticks of 50 ms = 1 s, 60 ticks = 3 s
        assert_eq!(config.tick_ms * config.elapsed_every_ticks as i64, 1_000);
        assert_eq!(config.tick_ms * config.cycle_every_ticks as i64, 3_000);
    }
}
