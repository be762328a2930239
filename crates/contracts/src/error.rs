//! Layered error definitions
//!
//! Categorized by source: config / source / fusion / effect / scoring / submission

use thiserror::Error;

use crate::SourcePosition;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// A required telemetry source is unavailable
    #[error("source '{position:?}' unavailable: {message}")]
    SourceUnavailable {
        position: SourcePosition,
        message: String,
    },

    /// Source channel closed while a match was recording
    #[error("source channel closed: {message}")]
    SourceChannel { message: String },

    // ===== Fusion Errors =====
    /// A sample could not be placed (e.g. before the match base time)
    #[error("fusion rejected sample from '{position:?}': {message}")]
    FusionReject {
        position: SourcePosition,
        message: String,
    },

    // ===== Effect Errors =====
    /// Effect failed to load at match setup; fatal to starting that match
    #[error("effect '{effect_id}' failed to load: {message}")]
    EffectLoad { effect_id: String, message: String },

    /// Unknown effect definition kind
    #[error("unknown effect definition: {kind}")]
    UnknownEffect { kind: String },

    // ===== Inference Errors =====
    /// Inference call failure (treated as a skipped trigger opportunity)
    #[error("inference error: {message}")]
    Inference { message: String },

    // ===== Lifecycle Errors =====
    /// Invalid lifecycle transition
    #[error("invalid match state: {message}")]
    InvalidState { message: String },

    // ===== Submission Errors =====
    /// Submission failure (best-effort, never retried)
    #[error("submission '{sink_name}' failed: {message}")]
    Submission { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source-unavailable error
    pub fn source_unavailable(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            position,
            message: message.into(),
        }
    }

    /// Create effect-load error
    pub fn effect_load(effect_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EffectLoad {
            effect_id: effect_id.into(),
            message: message.into(),
        }
    }

    /// Create inference error
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create submission error
    pub fn submission(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Submission {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
