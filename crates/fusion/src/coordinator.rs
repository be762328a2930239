//! Fusion coordinator implementation.

use std::collections::HashMap;

use contracts::{
    FusionConfig, FusionStats, SourceCoverage, SourcePosition, TelemetrySample, WindowSnapshot,
};
use tracing::{instrument, trace, warn};

use crate::buffer::SlottedWindowBuffer;

/// Result of one ingestion call (single sample or batch).
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// How many slots the global window shifted (0 if none)
    pub shifted_slots: usize,

    /// Synchronized snapshot, when this ingestion hit a readiness milestone
    pub snapshot: Option<WindowSnapshot>,
}

/// Multi-source fusion coordinator.
///
/// Owns one slotted buffer per active source. All buffers share one
/// `base_time_ms`, one `start_slot` and one capacity; window shifts are
/// global, never per-source.
#[derive(Debug)]
pub struct FusionCoordinator {
    /// Configuration
    config: FusionConfig,
    /// Per-source buffers (active sources only)
    buffers: HashMap<SourcePosition, SlottedWindowBuffer<TelemetrySample>>,
    /// Timestamp of the first sample, origin of the slot index space
    base_time_ms: Option<i64>,
    /// Absolute slot index of buffer position 0
    start_slot: i64,
    /// Samples dropped for arriving below the window floor
    late_drops: u64,
    /// Total slots shifted
    total_shifted: u64,
    /// Snapshots emitted
    snapshots_emitted: u64,
}

impl FusionCoordinator {
    /// Create a coordinator with one buffer per active source.
    pub fn new(config: FusionConfig) -> Self {
        let capacity = config.capacity();
        let buffers = config
            .active_sources
            .iter()
            .map(|position| (position, SlottedWindowBuffer::new(capacity)))
            .collect();

        Self {
            config,
            buffers,
            base_time_ms: None,
            start_slot: 0,
            late_drops: 0,
            total_shifted: 0,
            snapshots_emitted: 0,
        }
    }

    /// Reset for a new match, keeping the configuration.
    pub fn reset(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.clear();
        }
        self.base_time_ms = None;
        self.start_slot = 0;
        self.late_drops = 0;
        self.total_shifted = 0;
        self.snapshots_emitted = 0;
    }

    /// Ingest a single timestamped sample.
    #[instrument(
        level = "trace",
        name = "fusion_ingest",
        skip(self, sample),
        fields(source = sample.source.label(), timestamp_ms = sample.timestamp_ms)
    )]
    pub fn ingest(&mut self, sample: TelemetrySample) -> IngestOutcome {
        let source = sample.source;
        let window_before = self.window_len();
        let bottleneck = self.is_unique_bottleneck(source);

        let shifted = self.place(sample);

        self.finish_ingestion(source, window_before, shifted, bottleneck)
    }

    /// Ingest several samples from one source, emitting at most one snapshot
    /// after the whole batch is processed.
    #[instrument(
        level = "trace",
        name = "fusion_ingest_batch",
        skip(self, samples),
        fields(source = source.label(), count = samples.len())
    )]
    pub fn ingest_batch(
        &mut self,
        source: SourcePosition,
        samples: Vec<TelemetrySample>,
    ) -> IngestOutcome {
        let window_before = self.window_len();
        let bottleneck = self.is_unique_bottleneck(source);

        let mut shifted = 0usize;
        for sample in samples {
            if sample.source != source {
                warn!(
                    expected = source.label(),
                    got = sample.source.label(),
                    "batch sample from wrong source, skipping"
                );
                continue;
            }
            shifted += self.place(sample);
        }

        self.finish_ingestion(source, window_before, shifted, bottleneck)
    }

    /// Readiness: last slot index covered by every active source, or -1.
    ///
    /// The minimum over all active sources of the last filled slot; -1 when
    /// any active source has no data at all, so a snapshot never claims
    /// coverage a source cannot back.
    pub fn window_len(&self) -> i64 {
        let mut min: Option<i64> = None;
        for buffer in self.buffers.values() {
            let last = match buffer.last_filled() {
                Some(index) => index as i64,
                None => return -1,
            };
            min = Some(min.map_or(last, |m: i64| m.min(last)));
        }
        min.unwrap_or(-1)
    }

    /// Current diagnostics.
    pub fn stats(&self) -> FusionStats {
        let coverage = self
            .buffers
            .iter()
            .map(|(position, buffer)| {
                (
                    *position,
                    SourceCoverage {
                        last_filled: buffer.last_filled(),
                        filled: buffer.filled_count(),
                        sparsity: buffer.sparsity(),
                    },
                )
            })
            .collect();

        FusionStats {
            coverage,
            late_drops: self.late_drops,
            shifted_slots: self.total_shifted,
            snapshots_emitted: self.snapshots_emitted,
        }
    }

    /// Origin timestamp of the slot index space, once the first sample landed.
    pub fn base_time_ms(&self) -> Option<i64> {
        self.base_time_ms
    }

    /// Place one sample, returning how many slots the global window shifted.
    fn place(&mut self, sample: TelemetrySample) -> usize {
        let source = sample.source;
        if !self.buffers.contains_key(&source) {
            trace!(source = source.label(), "sample from inactive source dropped");
            return 0;
        }

        let base = *self.base_time_ms.get_or_insert(sample.timestamp_ms);
        let slot = (sample.timestamp_ms - base).div_euclid(self.config.step_ms);

        if slot < self.start_slot {
            // Arrived too late to be useful.
            self.late_drops += 1;
            metrics::counter!("fusion_late_drops_total", "source" => source.label()).increment(1);
            trace!(
                source = source.label(),
                slot,
                start_slot = self.start_slot,
                "late sample dropped"
            );
            return 0;
        }

        let capacity = self.config.capacity();
        let mut relative = (slot - self.start_slot) as usize;

        let shifted = if relative >= capacity {
            let amount = relative - (capacity - 1);
            self.shift_all(amount);
            relative = (slot - self.start_slot) as usize;
            amount
        } else {
            0
        };

        if let Some(buffer) = self.buffers.get_mut(&source) {
            buffer.store(relative, sample);
        }
        metrics::counter!("fusion_ingest_total", "source" => source.label()).increment(1);

        shifted
    }

    /// Shift every buffer left by the same amount and advance the start slot.
    fn shift_all(&mut self, amount: usize) {
        for buffer in self.buffers.values_mut() {
            buffer.shift_left(amount);
        }
        self.start_slot += amount as i64;
        self.total_shifted += amount as u64;
        metrics::counter!("fusion_shift_slots_total").increment(amount as u64);
    }

    /// Whether `source` is the strict minimum of all active sources' last
    /// filled indices, evaluated before its new data lands.
    ///
    /// Only the unique bottleneck source firing prevents every source's
    /// ingestion from re-triggering the same window. A tie (two sources
    /// simultaneously co-minimal) suppresses emission until a later
    /// ingestion breaks it; if none ever arrives, that milestone's snapshot
    /// is deferred indefinitely.
    fn is_unique_bottleneck(&self, source: SourcePosition) -> bool {
        let own = self
            .buffers
            .get(&source)
            .and_then(|b| b.last_filled())
            .map_or(-1i64, |i| i as i64);

        self.buffers.iter().all(|(position, buffer)| {
            if *position == source {
                return true;
            }
            let other = buffer.last_filled().map_or(-1i64, |i| i as i64);
            own < other
        })
    }

    /// Common emission tail for single and batch ingestion.
    fn finish_ingestion(
        &mut self,
        source: SourcePosition,
        window_before: i64,
        shifted: usize,
        was_bottleneck: bool,
    ) -> IngestOutcome {
        let window_after = self.window_len();
        // Net new fully-covered slots, accounting for any mid-ingestion shift.
        let predict_time = window_after + shifted as i64 - window_before;

        let snapshot = if was_bottleneck && window_after >= 0 && predict_time >= 1 {
            Some(self.emit_snapshot(source, window_after as usize, predict_time as u32))
        } else {
            None
        };

        IngestOutcome {
            shifted_slots: shifted,
            snapshot,
        }
    }

    #[instrument(
        level = "debug",
        name = "fusion_emit_snapshot",
        skip(self),
        fields(source = source.label(), window_len, predict_time)
    )]
    fn emit_snapshot(
        &mut self,
        source: SourcePosition,
        window_len: usize,
        predict_time: u32,
    ) -> WindowSnapshot {
        let windows = self
            .buffers
            .iter()
            .map(|(position, buffer)| (*position, buffer.prefix(window_len + 1)))
            .collect();

        self.snapshots_emitted += 1;
        metrics::counter!("fusion_snapshots_total").increment(1);
        metrics::histogram!("fusion_window_len").record(window_len as f64);
        metrics::histogram!("fusion_predict_time").record(predict_time as f64);

        WindowSnapshot {
            base_time_ms: self.base_time_ms.unwrap_or(0),
            start_slot: self.start_slot,
            window_len,
            predict_time,
            windows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MotionData, PositionData, SourceMask};

    const STEP: i64 = 50;

    fn config(positions: &[SourcePosition]) -> FusionConfig {
        FusionConfig {
            active_sources: SourceMask::from_positions(positions),
            ..Default::default()
        }
    }

    fn phone_sample(slot: i64) -> TelemetrySample {
        TelemetrySample::phone(slot * STEP, PositionData::default(), MotionData::default())
    }

    fn wearable_sample(position: SourcePosition, slot: i64) -> TelemetrySample {
        TelemetrySample::motion(position, slot * STEP, MotionData::default())
    }

    #[test]
    fn not_ready_until_all_sources_have_data() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        let outcome = coordinator.ingest(phone_sample(0));
        assert!(outcome.snapshot.is_none());
        assert_eq!(coordinator.window_len(), -1);
    }

    #[test]
    fn phone_sample_then_wearable_batch_fires_once() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        coordinator.ingest(phone_sample(0));
        let outcome = coordinator.ingest_batch(
            SourcePosition::LeftWrist,
            vec![wearable_sample(SourcePosition::LeftWrist, 0)],
        );

        let snapshot = outcome.snapshot.expect("wearable batch completes slot 0");
        assert_eq!(snapshot.predict_time, 1);
        assert_eq!(snapshot.window_len, 0);
        assert_eq!(snapshot.slot_count(), 1);
    }

    #[test]
    fn one_snapshot_per_milestone_alternating_sources() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        let mut emitted = Vec::new();
        for slot in 0..10 {
            if let Some(s) = coordinator.ingest(phone_sample(slot)).snapshot {
                emitted.push(s.window_len);
            }
            if let Some(s) = coordinator
                .ingest(wearable_sample(SourcePosition::LeftWrist, slot))
                .snapshot
            {
                emitted.push(s.window_len);
            }
        }

        // No duplicates, no gaps: exactly one snapshot per slot 0..=9.
        assert_eq!(emitted, (0..10).collect::<Vec<usize>>());
    }

    #[test]
    fn window_len_never_exceeds_any_source() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
            SourcePosition::Chest,
        ]));

        // Out-of-order, uneven arrivals.
        coordinator.ingest(phone_sample(5));
        coordinator.ingest(wearable_sample(SourcePosition::LeftWrist, 3));
        coordinator.ingest(wearable_sample(SourcePosition::Chest, 8));
        coordinator.ingest(phone_sample(2));

        let stats = coordinator.stats();
        let window = coordinator.window_len();
        for coverage in stats.coverage.values() {
            let last = coverage.last_filled.map_or(-1i64, |i| i as i64);
            assert!(window <= last);
        }
        assert_eq!(window, 3);
    }

    #[test]
    fn late_sample_below_window_floor_is_dropped() {
        let mut coordinator = FusionCoordinator::new(config(&[SourcePosition::Phone]));
        let capacity = FusionConfig::default().capacity() as i64;

        coordinator.ingest(phone_sample(0));
        // Jump far enough ahead to force a shift.
        let outcome = coordinator.ingest(phone_sample(capacity + 10));
        assert_eq!(outcome.shifted_slots, 11);

        // Slot 1 is now below the window floor.
        coordinator.ingest(phone_sample(1));
        assert_eq!(coordinator.stats().late_drops, 1);
    }

    #[test]
    fn shift_is_global_across_sources() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));
        let capacity = FusionConfig::default().capacity() as i64;

        coordinator.ingest(phone_sample(0));
        coordinator.ingest(wearable_sample(SourcePosition::LeftWrist, 0));
        coordinator.ingest(phone_sample(capacity)); // shifts both buffers by 1

        let stats = coordinator.stats();
        // The wearable's slot-0 sample moved off the front together with the
        // phone's; both buffers share the new start slot.
        assert_eq!(
            stats.coverage[&SourcePosition::LeftWrist].last_filled,
            None
        );
        assert_eq!(stats.shifted_slots, 1);
    }

    #[test]
    fn tie_defers_emission_until_broken() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        coordinator.ingest(phone_sample(0));
        coordinator.ingest(wearable_sample(SourcePosition::LeftWrist, 0)); // emits slot 0

        // Both sources now co-minimal at slot 0; the phone advancing does not
        // fire (window cannot move), and the wearable advancing fires once.
        let phone = coordinator.ingest(phone_sample(1));
        assert!(phone.snapshot.is_none());

        let wearable = coordinator.ingest(wearable_sample(SourcePosition::LeftWrist, 1));
        let snapshot = wearable.snapshot.expect("tie broken by wearable");
        assert_eq!(snapshot.window_len, 1);
        assert_eq!(snapshot.predict_time, 1);
    }

    #[test]
    fn batch_covering_multiple_slots_reports_predict_time() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        for slot in 0..5 {
            coordinator.ingest(phone_sample(slot));
        }

        let batch = (0..5)
            .map(|slot| wearable_sample(SourcePosition::LeftWrist, slot))
            .collect();
        let outcome = coordinator.ingest_batch(SourcePosition::LeftWrist, batch);

        let snapshot = outcome.snapshot.expect("batch covers five new slots");
        assert_eq!(snapshot.window_len, 4);
        assert_eq!(snapshot.predict_time, 5);
        assert_eq!(snapshot.slot_count(), 5);
    }

    #[test]
    fn snapshot_prefix_contains_stored_samples() {
        let mut coordinator = FusionCoordinator::new(config(&[
            SourcePosition::Phone,
            SourcePosition::LeftWrist,
        ]));

        coordinator.ingest(phone_sample(0));
        coordinator.ingest(phone_sample(2));
        let outcome = coordinator.ingest_batch(
            SourcePosition::LeftWrist,
            vec![
                wearable_sample(SourcePosition::LeftWrist, 0),
                wearable_sample(SourcePosition::LeftWrist, 1),
                wearable_sample(SourcePosition::LeftWrist, 2),
            ],
        );

        let snapshot = outcome.snapshot.unwrap();
        assert_eq!(snapshot.window_len, 2);

        let phone = snapshot.window(SourcePosition::Phone).unwrap();
        assert!(phone[0].is_some());
        assert!(phone[1].is_none()); // gap left for consumers to fill
        assert!(phone[2].is_some());

        let wrist = snapshot.window(SourcePosition::LeftWrist).unwrap();
        assert!(wrist.iter().all(|slot| slot.is_some()));
    }

    #[test]
    fn reset_clears_base_time_and_counters() {
        let mut coordinator = FusionCoordinator::new(config(&[SourcePosition::Phone]));
        coordinator.ingest(phone_sample(0));
        assert!(coordinator.base_time_ms().is_some());

        coordinator.reset();
        assert!(coordinator.base_time_ms().is_none());
        assert_eq!(coordinator.window_len(), -1);
        assert_eq!(coordinator.stats().snapshots_emitted, 0);
    }

    #[test]
    fn single_source_emits_every_new_slot() {
        let mut coordinator = FusionCoordinator::new(config(&[SourcePosition::Phone]));

        let first = coordinator.ingest(phone_sample(0));
        let snapshot = first.snapshot.expect("sole source is its own bottleneck");
        assert_eq!(snapshot.window_len, 0);
        assert_eq!(snapshot.predict_time, 1);

        let second = coordinator.ingest(phone_sample(3));
        let snapshot = second.snapshot.unwrap();
        assert_eq!(snapshot.window_len, 3);
        assert_eq!(snapshot.predict_time, 3);
    }
}
