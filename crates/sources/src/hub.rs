//! SourceHub - fan-in of wearable sources
//!
//! Manages the registered sources for a match and merges their callbacks
//! into one bounded channel consumed by the match session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{SampleSource, SourcePosition, TelemetrySample};
use tracing::{debug, info, instrument, warn};

/// Shared delivery counters.
#[derive(Debug, Default)]
pub struct SourceMetrics {
    received: AtomicU64,
    dropped: AtomicU64,
}

impl SourceMetrics {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Source registry and fan-in channel.
///
/// All registered sources deliver into one bounded channel; when the channel
/// is full the sample is dropped and counted rather than blocking the
/// source's delivery thread.
pub struct SourceHub {
    sources: HashMap<SourcePosition, Box<dyn SampleSource>>,
    metrics: Arc<SourceMetrics>,
    tx: Sender<TelemetrySample>,
    rx: Option<Receiver<TelemetrySample>>,
}

impl SourceHub {
    /// Create a hub with the given channel capacity.
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);
        Self {
            sources: HashMap::new(),
            metrics: Arc::new(SourceMetrics::default()),
            tx,
            rx: Some(rx),
        }
    }

    /// Register a source for its position, replacing any previous one.
    #[instrument(
        name = "source_hub_register",
        skip(self, source),
        fields(position = source.position().label())
    )]
    pub fn register(&mut self, source: Box<dyn SampleSource>) {
        let position = source.position();
        debug!(position = position.label(), "registered source");
        self.sources.insert(position, source);
    }

    /// Start every registered source.
    #[instrument(name = "source_hub_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.sources.len(), "starting all sources");
        for (position, source) in &self.sources {
            if source.is_listening() {
                continue;
            }
            debug!(position = position.label(), "starting source");
            let tx = self.tx.clone();
            let metrics = self.metrics.clone();
            source.listen(Arc::new(move |sample| {
                metrics.received.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(
                    "source_samples_total",
                    "source" => sample.source.label()
                )
                .increment(1);
                match tx.try_send(sample) {
                    Ok(()) => {}
                    Err(TrySendError::Full(sample)) => {
                        metrics.dropped.fetch_add(1, Ordering::Relaxed);
                        metrics::counter!(
                            "source_channel_drops_total",
                            "source" => sample.source.label()
                        )
                        .increment(1);
                        warn!(source = sample.source.label(), "source channel full, sample dropped");
                    }
                    Err(TrySendError::Closed(_)) => {}
                }
            }));
        }
    }

    /// Stop every registered source.
    #[instrument(name = "source_hub_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.sources.len(), "stopping all sources");
        for (position, source) in &self.sources {
            if source.is_listening() {
                debug!(position = position.label(), "stopping source");
                source.stop();
            }
        }
    }

    /// Take the merged receiver.
    ///
    /// Can only be called once; subsequent calls return `None`.
    pub fn take_receiver(&mut self) -> Option<Receiver<TelemetrySample>> {
        self.rx.take()
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<SourceMetrics> {
        self.metrics.clone()
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether the source at a position is currently producing.
    pub fn is_listening(&self, position: SourcePosition) -> bool {
        self.sources
            .get(&position)
            .map(|s| s.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for SourceHub {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockWearable, MockWearableConfig};

    #[test]
    fn hub_creation() {
        let hub = SourceHub::new(64);
        assert_eq!(hub.source_count(), 0);
    }

    #[test]
    fn take_receiver_once() {
        let mut hub = SourceHub::new(64);
        assert!(hub.take_receiver().is_some());
        assert!(hub.take_receiver().is_none());
    }

    #[test]
    fn register_replaces_position() {
        let mut hub = SourceHub::new(64);
        hub.register(Box::new(MockWearable::new(MockWearableConfig {
            position: SourcePosition::LeftWrist,
            ..Default::default()
        })));
        hub.register(Box::new(MockWearable::new(MockWearableConfig {
            position: SourcePosition::LeftWrist,
            ..Default::default()
        })));
        assert_eq!(hub.source_count(), 1);
    }

    #[test]
    fn start_and_stop_mock_source() {
        let mut hub = SourceHub::new(64);
        hub.register(Box::new(MockWearable::new(MockWearableConfig {
            position: SourcePosition::Chest,
            frequency_hz: 100.0,
            ..Default::default()
        })));
        let rx = hub.take_receiver().unwrap();

        hub.start_all();
        assert!(hub.is_listening(SourcePosition::Chest));

        // At 100 Hz a sample arrives well within a second.
        let sample = rx.recv_blocking().expect("mock source delivers");
        assert_eq!(sample.source, SourcePosition::Chest);

        hub.stop_all();
        assert!(!hub.is_listening(SourcePosition::Chest));
    }
}
