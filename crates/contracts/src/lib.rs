//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are milliseconds since the Unix epoch (`i64`), as delivered by
//!   the phone and the companion-device channel
//! - The fusion layer discretizes them into 50 ms slots relative to the first
//!   sample of the match (`base_time_ms`)

mod config;
mod effect;
mod error;
pub mod geo;
mod inference;
mod match_state;
mod path;
mod sample;
mod sample_source;
mod snapshot;
mod source;
mod submission;

pub use config::*;
pub use effect::{Effect, EffectId};
pub use error::*;
pub use inference::{InferenceOutput, InferencePredictor};
pub use match_state::*;
pub use path::*;
pub use sample::*;
pub use sample_source::{PhoneSensorSuite, SampleCallback, SampleSource};
pub use snapshot::*;
pub use source::{SourceMask, SourcePosition};
pub use submission::SubmissionSink;
