//! Telemetry source identification.
//!
//! A match has exactly one phone stream plus up to five wearable positions.
//! The active set for a match is carried as a 6-bit mask (bit 0 = phone).

use serde::{Deserialize, Serialize};

/// One independent telemetry producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePosition {
    /// The handheld device (GPS + own motion sensors)
    Phone,
    LeftWrist,
    RightWrist,
    LeftAnkle,
    RightAnkle,
    Chest,
}

impl SourcePosition {
    /// All positions in bit order.
    pub const ALL: [SourcePosition; 6] = [
        SourcePosition::Phone,
        SourcePosition::LeftWrist,
        SourcePosition::RightWrist,
        SourcePosition::LeftAnkle,
        SourcePosition::RightAnkle,
        SourcePosition::Chest,
    ];

    /// Bit index in the source mask (0..=5).
    pub fn bit(self) -> u8 {
        match self {
            SourcePosition::Phone => 0,
            SourcePosition::LeftWrist => 1,
            SourcePosition::RightWrist => 2,
            SourcePosition::LeftAnkle => 3,
            SourcePosition::RightAnkle => 4,
            SourcePosition::Chest => 5,
        }
    }

    /// Position for a bit index, if valid.
    pub fn from_bit(bit: u8) -> Option<SourcePosition> {
        Self::ALL.get(bit as usize).copied()
    }

    /// Short label used for logging and metrics.
    pub fn label(self) -> &'static str {
        match self {
            SourcePosition::Phone => "phone",
            SourcePosition::LeftWrist => "left_wrist",
            SourcePosition::RightWrist => "right_wrist",
            SourcePosition::LeftAnkle => "left_ankle",
            SourcePosition::RightAnkle => "right_ankle",
            SourcePosition::Chest => "chest",
        }
    }
}

/// Active-source bitmask (bit 0 = phone, bits 1-5 = wearable positions).
///
/// Selects which sources participate in readiness computation and which
/// physical sources should be collecting for a given match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMask(u8);

impl SourceMask {
    /// Mask with only the phone active.
    pub const PHONE_ONLY: SourceMask = SourceMask(1);

    /// Empty mask.
    pub fn empty() -> Self {
        SourceMask(0)
    }

    /// Build a mask from an explicit list of positions.
    pub fn from_positions(positions: &[SourcePosition]) -> Self {
        let mut mask = SourceMask(0);
        for p in positions {
            mask.set(*p);
        }
        mask
    }

    /// Raw 6-bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Mark a position active.
    pub fn set(&mut self, position: SourcePosition) {
        self.0 |= 1 << position.bit();
    }

    /// Whether a position is active.
    pub fn contains(self, position: SourcePosition) -> bool {
        self.0 & (1 << position.bit()) != 0
    }

    /// Number of active positions.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether no positions are active.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate active positions in bit order.
    pub fn iter(self) -> impl Iterator<Item = SourcePosition> {
        SourcePosition::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl Default for SourceMask {
    fn default() -> Self {
        SourceMask::PHONE_ONLY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_roundtrip() {
        for p in SourcePosition::ALL {
            assert_eq!(SourcePosition::from_bit(p.bit()), Some(p));
        }
        assert_eq!(SourcePosition::from_bit(6), None);
    }

    #[test]
    fn mask_set_and_iter() {
        let mask =
            SourceMask::from_positions(&[SourcePosition::Phone, SourcePosition::LeftAnkle]);
        assert_eq!(mask.len(), 2);
        assert!(mask.contains(SourcePosition::Phone));
        assert!(mask.contains(SourcePosition::LeftAnkle));
        assert!(!mask.contains(SourcePosition::Chest));

        let positions: Vec<_> = mask.iter().collect();
        assert_eq!(
            positions,
            vec![SourcePosition::Phone, SourcePosition::LeftAnkle]
        );
    }

    #[test]
    fn phone_only_is_bit_zero() {
        assert_eq!(SourceMask::PHONE_ONLY.bits(), 0b000001);
    }
}
