//! InferencePredictor trait - opaque model capability
//!
//! The engine calls an externally supplied predictor with a fixed-size
//! numeric window and receives a typed output. Loading and versioning of the
//! underlying model artifact is fully external.

use crate::ContractError;

/// Typed output of one prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferenceOutput {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Black-box inference capability.
pub trait InferencePredictor: Send {
    /// Number of input values one prediction consumes.
    fn input_len(&self) -> usize;

    /// Run one prediction over a window of exactly `input_len()` values.
    ///
    /// # Errors
    /// Returns an inference error for malformed input or internal failure;
    /// callers treat this as a skipped trigger opportunity, not a match abort.
    fn predict(&mut self, window: &[f32]) -> Result<InferenceOutput, ContractError>;
}
