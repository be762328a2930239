//! Match context, lifecycle events and end-of-match summary.

use serde::{Deserialize, Serialize};

use crate::{EffectId, PathPoint, Sport, SportSample, WindowSnapshot};

/// Event kinds delivered to registered effects, in registration order.
///
/// Dispatch is synchronous with no cancellation or priority.
#[derive(Debug, Clone)]
pub enum MatchEvent {
    /// Recording has started; context has been reset
    Started,

    /// The ~3 s recording cycle ticked and a path point was appended
    Cycle,

    /// The fusion coordinator published a synchronized window
    WindowReady(WindowSnapshot),

    /// Recording has ended; last chance to apply end-of-match bonuses
    Ended,
}

/// Mutable per-match aggregate.
///
/// Owned exclusively by the match session for the duration of one match and
/// reset to empty between matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchContext {
    /// Cumulative distance over the recorded path (m)
    pub total_distance_m: f64,

    /// Latest instantaneous speed (m/s)
    pub speed_mps: f64,

    /// Latest altitude (m)
    pub altitude_m: f64,

    /// Latest heart rate (beats/min)
    pub heart_rate_bpm: f64,

    /// Running average heart rate (beats/min)
    pub avg_heart_rate_bpm: f64,

    /// Number of heart-rate samples folded into the average
    pub heart_rate_samples: u64,

    /// Latest power (watts)
    pub power_watts: f64,

    /// Latest pedal-stroke rate estimate (rev/min)
    pub pedal_rpm: f64,

    /// Latest step cadence estimate (steps/min)
    pub step_cadence_spm: f64,

    /// Latest per-window stroke/step count estimate
    pub step_count: u32,

    /// Per-effect accumulated bonus-time records
    pub bonuses: Vec<BonusRecord>,

    /// Optional team bonus
    pub team_bonus: Option<TeamBonus>,
}

impl MatchContext {
    /// Reset to the empty state between matches.
    pub fn reset(&mut self) {
        *self = MatchContext::default();
    }

    /// Fold a heart-rate sample into latest + running average.
    pub fn record_heart_rate(&mut self, bpm: f64) {
        if bpm <= 0.0 {
            return;
        }
        self.heart_rate_bpm = bpm;
        let n = self.heart_rate_samples as f64;
        self.avg_heart_rate_bpm = (self.avg_heart_rate_bpm * n + bpm) / (n + 1.0);
        self.heart_rate_samples += 1;
    }

    /// Add bonus seconds for an effect.
    ///
    /// Re-applying the same identifier updates its running total, never
    /// duplicates the record.
    pub fn add_bonus(&mut self, effect_id: &EffectId, seconds: f64) {
        if let Some(record) = self.bonuses.iter_mut().find(|r| &r.effect_id == effect_id) {
            record.bonus_seconds += seconds;
            record.applications += 1;
        } else {
            self.bonuses.push(BonusRecord {
                effect_id: effect_id.clone(),
                bonus_seconds: seconds,
                applications: 1,
            });
        }
    }
}

/// Accumulated bonus credit for one effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusRecord {
    /// Identifier of the effect that earned the bonus
    pub effect_id: EffectId,

    /// Total accumulated bonus time (s)
    pub bonus_seconds: f64,

    /// How many times the bonus was applied
    pub applications: u64,
}

/// Team-level bonus record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamBonus {
    /// Team identifier
    pub team_id: String,

    /// Total team bonus time (s)
    pub bonus_seconds: f64,
}

/// End-of-match summary handed to the external submission step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Sport of the match
    pub sport: Sport,

    /// Legitimacy score in [0, 100], or -1.0 / -2.0 sentinels
    pub legitimacy_score: f64,

    /// Reconstructed finish-line crossing time (ms since epoch)
    pub finish_time_ms: i64,

    /// Elapsed recording time (ms)
    pub elapsed_ms: i64,

    /// Total recorded distance (m)
    pub total_distance_m: f64,

    /// Per-effect bonus records
    pub bonuses: Vec<BonusRecord>,

    /// Optional team bonus
    pub team_bonus: Option<TeamBonus>,

    /// Full recorded path
    pub path: Vec<PathPoint>,

    /// Sport-specific samples, parallel to `path`
    pub sport_samples: Vec<SportSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_accumulation_is_keyed() {
        let mut ctx = MatchContext::default();
        let id = EffectId::from("climb_bonus");
        ctx.add_bonus(&id, 2.0);
        ctx.add_bonus(&id, 3.0);
        ctx.add_bonus(&EffectId::from("sprint_bonus"), 1.0);

        assert_eq!(ctx.bonuses.len(), 2);
        let climb = ctx.bonuses.iter().find(|r| r.effect_id == id).unwrap();
        assert!((climb.bonus_seconds - 5.0).abs() < 1e-12);
        assert_eq!(climb.applications, 2);
    }

    #[test]
    fn heart_rate_average() {
        let mut ctx = MatchContext::default();
        ctx.record_heart_rate(100.0);
        ctx.record_heart_rate(140.0);
        ctx.record_heart_rate(0.0); // ignored
        assert_eq!(ctx.heart_rate_bpm, 140.0);
        assert!((ctx.avg_heart_rate_bpm - 120.0).abs() < 1e-12);
        assert_eq!(ctx.heart_rate_samples, 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut ctx = MatchContext::default();
        ctx.total_distance_m = 1234.0;
        ctx.add_bonus(&EffectId::from("x"), 1.0);
        ctx.reset();
        assert_eq!(ctx.total_distance_m, 0.0);
        assert!(ctx.bonuses.is_empty());
    }
}
