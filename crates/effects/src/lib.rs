//! # Effects
//!
//! Pluggable scoring effects and the engine dispatching match events to them.
//!
//! Two built-in effects run signal processing over fused windows: the
//! pedal-stroke estimator (cycling) and the step-cadence estimator (running).
//! Configured threshold-bonus effects compare live context metrics against a
//! band and accumulate bonus seconds. The inference gate wraps an externally
//! supplied predictor and honors the snapshot's trigger-opportunity count.

mod engine;
mod inference;
mod pedal;
pub mod signal;
mod steps;
mod threshold;

pub use engine::{EffectEngine, EffectEngineBuilder};
pub use inference::{InferenceGate, InferenceGateConfig};
pub use pedal::{PedalStrokeConfig, PedalStrokeEstimator};
pub use steps::{StepCadenceConfig, StepCadenceEstimator, StepEstimate};
pub use threshold::ThresholdBonusEffect;

pub use contracts::{Effect, EffectId, MatchContext, MatchEvent};
