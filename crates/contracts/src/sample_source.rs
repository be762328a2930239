//! SampleSource trait - telemetry source abstraction
//!
//! Defines a unified interface for wearable/phone data sources, decoupling
//! the session from the physical transport. Mock and replay sources implement
//! the same API.

use std::sync::Arc;

use crate::{SourcePosition, TelemetrySample};

/// Sample delivery callback type.
///
/// When a source produces data it sends `TelemetrySample`s through this
/// callback. Uses `Arc` to allow callback sharing across multiple contexts.
pub type SampleCallback = Arc<dyn Fn(TelemetrySample) + Send + Sync>;

/// Telemetry data source.
///
/// Abstracts the companion-device channel delivering wearable samples. The
/// engine never sees the physical transport, only this trait.
pub trait SampleSource: Send + Sync {
    /// Wearable position (or phone) this source feeds.
    fn position(&self) -> SourcePosition;

    /// Register the delivery callback and begin producing.
    ///
    /// Repeated calls while already listening are idempotent.
    fn listen(&self, callback: SampleCallback);

    /// Stop producing.
    fn stop(&self);

    /// Whether the source is currently producing.
    fn is_listening(&self) -> bool;
}

/// The phone's own sensor suite, polled synchronously by the sampling timer.
///
/// Unlike wearables, the phone is read on the lifecycle's 50 ms tick rather
/// than pushing batches asynchronously.
pub trait PhoneSensorSuite: Send {
    /// Capture one phone reading at the given time.
    fn sample(&mut self, now_ms: i64) -> TelemetrySample;
}
