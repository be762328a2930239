//! Mock telemetry sources
//!
//! Used for tests and for running the engine without real hardware. The
//! wearable synthesizes a periodic motion signal at a configurable cadence;
//! the phone walks a straight route between two coordinates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::geo::GeoPoint;
use contracts::{
    MotionData, PhoneSensorSuite, PositionData, SampleCallback, SampleSource, SourcePosition,
    TelemetrySample, Vector3, VitalsData,
};
use rand::Rng;
use tracing::{debug, trace};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Mock wearable configuration.
#[derive(Debug, Clone)]
pub struct MockWearableConfig {
    /// Wearable position
    pub position: SourcePosition,

    /// Sample production rate (Hz)
    pub frequency_hz: f64,

    /// Samples accumulated before delivery (1 = immediate); simulates the
    /// companion-device channel delivering in batches
    pub batch_size: usize,

    /// Cadence of the synthesized motion signal (Hz), e.g. 1.5 for steps
    pub cadence_hz: f64,

    /// Base heart rate reported in vitals (beats/min); 0 disables vitals
    pub heart_rate_bpm: f64,
}

impl Default for MockWearableConfig {
    fn default() -> Self {
        Self {
            position: SourcePosition::LeftWrist,
            frequency_hz: 20.0,
            batch_size: 1,
            cadence_hz: 1.5,
            heart_rate_bpm: 0.0,
        }
    }
}

/// Mock wearable source.
///
/// Produces a noisy sinusoidal accelerometer/gyroscope/magnetometer signal on
/// a background thread.
pub struct MockWearable {
    config: MockWearableConfig,
    running: Arc<AtomicBool>,
}

impl MockWearable {
    /// Create a new mock wearable.
    pub fn new(config: MockWearableConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn synthesize(config: &MockWearableConfig, timestamp_ms: i64, phase: f64) -> TelemetrySample {
        let mut rng = rand::rng();
        let omega = 2.0 * std::f64::consts::PI * config.cadence_hz;
        let t = phase;

        let mut jitter = || rng.random_range(-0.15..0.15);

        let motion = MotionData {
            accel: Vector3::new(
                2.5 * (omega * t).sin() + jitter(),
                0.8 * (omega * t).cos() + jitter(),
                9.81 + 1.2 * (omega * t).sin() + jitter(),
            ),
            gyro: Vector3::new(
                0.9 * (omega * t + 0.4).sin() + jitter(),
                0.3 * (omega * t).cos() + jitter(),
                0.1 * jitter(),
            ),
            mag: Vector3::new(
                22.0 + 6.0 * (omega * t).sin() + jitter(),
                4.0 * (omega * t + 1.0).cos() + jitter(),
                -38.0 + jitter(),
            ),
        };

        let mut sample = TelemetrySample::motion(config.position, timestamp_ms, motion);
        if config.heart_rate_bpm > 0.0 {
            sample.vitals = Some(VitalsData {
                heart_rate_bpm: config.heart_rate_bpm + rng.random_range(-4.0..4.0),
                power_watts: 0.0,
            });
        }
        sample
    }
}

impl SampleSource for MockWearable {
    fn position(&self) -> SourcePosition {
        self.config.position
    }

    fn listen(&self, callback: SampleCallback) {
        if self.running.swap(true, Ordering::SeqCst) {
            return; // already listening
        }

        let config = self.config.clone();
        let running = self.running.clone();
        debug!(position = config.position.label(), "mock wearable starting");

        std::thread::spawn(move || {
            let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(0.1));
            let batch_size = config.batch_size.max(1);
            let mut pending: Vec<TelemetrySample> = Vec::with_capacity(batch_size);
            let started = now_ms();

            while running.load(Ordering::SeqCst) {
                std::thread::sleep(interval);
                let timestamp = now_ms();
                let phase = (timestamp - started) as f64 / 1_000.0;
                pending.push(Self::synthesize(&config, timestamp, phase));

                if pending.len() >= batch_size {
                    for sample in pending.drain(..) {
                        trace!(
                            position = config.position.label(),
                            timestamp_ms = sample.timestamp_ms,
                            "mock sample delivered"
                        );
                        callback(sample);
                    }
                }
            }
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Mock phone configuration: a straight route at constant speed.
#[derive(Debug, Clone)]
pub struct MockPhoneConfig {
    /// Route start
    pub from: GeoPoint,

    /// Route end
    pub to: GeoPoint,

    /// Ground speed (m/s)
    pub speed_mps: f64,

    /// Base altitude (m)
    pub altitude_m: f64,
}

impl Default for MockPhoneConfig {
    fn default() -> Self {
        Self {
            from: GeoPoint {
                latitude: 48.0,
                longitude: 11.0,
            },
            to: GeoPoint {
                latitude: 48.01,
                longitude: 11.0,
            },
            speed_mps: 4.0,
            altitude_m: 500.0,
        }
    }
}

/// Mock phone sensor suite walking a straight route.
pub struct MockPhone {
    config: MockPhoneConfig,
    route_length_m: f64,
    started_ms: Option<i64>,
}

impl MockPhone {
    pub fn new(config: MockPhoneConfig) -> Self {
        let route_length_m = contracts::geo::haversine_m(config.from, config.to);
        Self {
            config,
            route_length_m,
            started_ms: None,
        }
    }
}

impl PhoneSensorSuite for MockPhone {
    fn sample(&mut self, now_ms: i64) -> TelemetrySample {
        let started = *self.started_ms.get_or_insert(now_ms);
        let elapsed_s = (now_ms - started) as f64 / 1_000.0;
        let traveled = self.config.speed_mps * elapsed_s;
        let fraction = if self.route_length_m > 0.0 {
            (traveled / self.route_length_m).min(1.0)
        } else {
            0.0
        };

        let from = self.config.from;
        let to = self.config.to;
        let position = PositionData {
            latitude: from.latitude + (to.latitude - from.latitude) * fraction,
            longitude: from.longitude + (to.longitude - from.longitude) * fraction,
            speed_mps: if fraction < 1.0 { self.config.speed_mps } else { 0.0 },
            altitude_m: self.config.altitude_m,
        };

        TelemetrySample::phone(now_ms, position, MotionData::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn wearable_listen_is_idempotent() {
        let wearable = MockWearable::new(MockWearableConfig::default());
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let sink = delivered.clone();
        wearable.listen(Arc::new(move |s| sink.lock().unwrap().push(s)));
        assert!(wearable.is_listening());

        // Second listen is a no-op rather than a second producer thread.
        wearable.listen(Arc::new(|_| {}));
        wearable.stop();
        assert!(!wearable.is_listening());
    }

    #[test]
    fn phone_moves_along_route() {
        let mut phone = MockPhone::new(MockPhoneConfig {
            speed_mps: 10.0,
            ..Default::default()
        });

        let first = phone.sample(1_000);
        let later = phone.sample(61_000);

        let a = first.position.unwrap();
        let b = later.position.unwrap();
        assert!(b.latitude > a.latitude);
        assert_eq!(a.speed_mps, 10.0);
    }

    #[test]
    fn phone_stops_at_route_end() {
        let mut phone = MockPhone::new(MockPhoneConfig {
            speed_mps: 1_000.0, // covers the route almost immediately
            ..Default::default()
        });

        phone.sample(0);
        let done = phone.sample(10_000_000);
        let p = done.position.unwrap();
        assert_eq!(p.speed_mps, 0.0);
        assert!((p.latitude - 48.01).abs() < 1e-9);
    }

    #[test]
    fn synthesized_sample_carries_motion() {
        let sample = MockWearable::synthesize(&MockWearableConfig::default(), 0, 0.0);
        let motion = sample.motion.unwrap();
        assert!(motion.accel.magnitude() > 0.0);
        assert!(sample.vitals.is_none());
    }
}
