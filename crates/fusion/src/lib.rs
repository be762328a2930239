//! # Fusion
//!
//! Multi-source telemetry fusion on a shared 50 ms slot timeline.
//!
//! Responsibilities:
//! - Per-source slotted window buffers with a global start slot
//! - Cross-source readiness computation (`window_len`)
//! - Single-fire synchronized snapshot emission with exact `predict_time`
//!   trigger accounting
//!
//! ## Usage
//!
//! ```ignore
//! use fusion::FusionCoordinator;
//! use contracts::FusionConfig;
//!
//! let mut coordinator = FusionCoordinator::new(FusionConfig::default());
//!
//! // Push samples as they arrive
//! let outcome = coordinator.ingest(sample);
//! if let Some(snapshot) = outcome.snapshot {
//!     // Handle synchronized window
//! }
//! ```

mod buffer;
mod coordinator;

pub use buffer::SlottedWindowBuffer;
pub use coordinator::{FusionCoordinator, IngestOutcome};

// Re-export contract types
pub use contracts::{FusionConfig, FusionStats, SourceCoverage, WindowSnapshot};
