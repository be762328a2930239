//! # Sources
//!
//! Telemetry source collection: registration of per-position sources, fan-in
//! of their callbacks into one bounded channel, and the mock/replay sources
//! used without real hardware.
//!
//! The physical transport delivering wearable samples (Bluetooth/companion
//! device) is out of scope; anything implementing `contracts::SampleSource`
//! can be registered.

mod hub;
mod mock;
mod replay;

pub use hub::{SourceHub, SourceMetrics};
pub use mock::{MockPhone, MockPhoneConfig, MockWearable, MockWearableConfig};
pub use replay::ReplaySource;

pub use contracts::{SampleCallback, SampleSource, TelemetrySample};
