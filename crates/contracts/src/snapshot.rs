//! WindowSnapshot - FusionCoordinator output
//!
//! Immutable copy of the synchronized window across all active sources,
//! handed to consumers for one round of computation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{SourcePosition, TelemetrySample};

/// Synchronized snapshot of the fused window.
///
/// For each active source, `windows` holds the slot prefix `[0..=window_len]`
/// of that source's buffer (relative to `start_slot`). Empty slots are `None`
/// and are gap-filled by consumers, never by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Timestamp of the first sample of the match (slot 0 origin)
    pub base_time_ms: i64,

    /// Absolute slot index of buffer position 0 at emission time
    pub start_slot: i64,

    /// Last slot index (relative to `start_slot`) covered by every active source
    pub window_len: usize,

    /// Number of new trigger opportunities this snapshot represents.
    /// Consumers must process exactly this many, not just one.
    pub predict_time: u32,

    /// Per-source slot prefix, `windows[p].len() == window_len + 1`
    pub windows: HashMap<SourcePosition, Vec<Option<TelemetrySample>>>,
}

impl WindowSnapshot {
    /// Slot prefix for one source, if that source is active.
    pub fn window(&self, source: SourcePosition) -> Option<&[Option<TelemetrySample>]> {
        self.windows.get(&source).map(|w| w.as_slice())
    }

    /// Number of slots in the covered prefix.
    pub fn slot_count(&self) -> usize {
        self.window_len + 1
    }
}

/// Per-source coverage diagnostic.
///
/// `sparsity` is the fraction of the retained window holding real
/// (non-interpolated) samples: `filled / (last_filled + 1)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCoverage {
    /// Last slot index holding a sample, if any
    pub last_filled: Option<usize>,

    /// Number of filled slots
    pub filled: usize,

    /// Fraction of the retained window holding real data (0-1)
    pub sparsity: f64,
}

/// Coordinator-wide diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionStats {
    /// Per-source coverage
    pub coverage: HashMap<SourcePosition, SourceCoverage>,

    /// Samples dropped for arriving below the window floor
    pub late_drops: u64,

    /// Total slots the global window has shifted
    pub shifted_slots: u64,

    /// Snapshots emitted so far
    pub snapshots_emitted: u64,
}
