//! TelemetrySample - raw per-source reading
//!
//! One timestamped reading from the phone or a wearable position. Fields are
//! optional because sources differ in what they report: the phone carries
//! position plus its own motion, wearables carry motion and vitals.

use serde::{Deserialize, Serialize};

use crate::SourcePosition;

/// One timestamped telemetry reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Producing source
    pub source: SourcePosition,

    /// Milliseconds since the Unix epoch, from the source's own clock
    pub timestamp_ms: i64,

    /// 3-axis motion reading, if the source has motion sensors
    pub motion: Option<MotionData>,

    /// Geographic fix, if the source has one (phone)
    pub position: Option<PositionData>,

    /// Physiological reading, if the source has one (chest strap, wrist)
    pub vitals: Option<VitalsData>,
}

impl TelemetrySample {
    /// Phone reading: position fix plus the phone's own motion sensors.
    pub fn phone(timestamp_ms: i64, position: PositionData, motion: MotionData) -> Self {
        Self {
            source: SourcePosition::Phone,
            timestamp_ms,
            motion: Some(motion),
            position: Some(position),
            vitals: None,
        }
    }

    /// Wearable motion reading.
    pub fn motion(source: SourcePosition, timestamp_ms: i64, motion: MotionData) -> Self {
        Self {
            source,
            timestamp_ms,
            motion: Some(motion),
            position: None,
            vitals: None,
        }
    }
}

/// 3-axis motion reading (accelerometer, gyroscope, magnetometer).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MotionData {
    /// Accelerometer (m/s²)
    pub accel: Vector3,

    /// Gyroscope (rad/s)
    pub gyro: Vector3,

    /// Magnetometer (µT)
    pub mag: Vector3,
}

impl MotionData {
    /// Component-wise linear interpolation between two readings.
    pub fn lerp(a: &MotionData, b: &MotionData, t: f64) -> MotionData {
        MotionData {
            accel: Vector3::lerp(a.accel, b.accel, t),
            gyro: Vector3::lerp(a.gyro, b.gyro, t),
            mag: Vector3::lerp(a.mag, b.mag, t),
        }
    }
}

/// Geographic fix with derived speed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PositionData {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Ground speed (m/s)
    pub speed_mps: f64,

    /// Altitude above sea level (m)
    pub altitude_m: f64,
}

/// Physiological reading.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VitalsData {
    /// Heart rate (beats/min); 0 when the sensor reports nothing
    pub heart_rate_bpm: f64,

    /// Instantaneous power (watts); cycling only
    pub power_watts: f64,
}

/// 3D vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude.
    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise linear interpolation.
    pub fn lerp(a: Vector3, b: Vector3, t: f64) -> Vector3 {
        Vector3 {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            z: a.z + (b.z - a.z) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert!((v.magnitude() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn motion_lerp_midpoint() {
        let a = MotionData {
            accel: Vector3::new(0.0, 0.0, 0.0),
            gyro: Vector3::new(2.0, 0.0, 0.0),
            mag: Vector3::default(),
        };
        let b = MotionData {
            accel: Vector3::new(4.0, 0.0, 0.0),
            gyro: Vector3::new(0.0, 0.0, 0.0),
            mag: Vector3::default(),
        };
        let mid = MotionData::lerp(&a, &b, 0.5);
        assert!((mid.accel.x - 2.0).abs() < 1e-12);
        assert!((mid.gyro.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sample_serde_roundtrip() {
        let sample = TelemetrySample::motion(
            SourcePosition::LeftWrist,
            1_000,
            MotionData::default(),
        );
        let json = serde_json::to_string(&sample).unwrap();
        let parsed: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source, SourcePosition::LeftWrist);
        assert_eq!(parsed.timestamp_ms, 1_000);
        assert!(parsed.position.is_none());
    }
}
