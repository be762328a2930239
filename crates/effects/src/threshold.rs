//! Configured threshold-bonus effects.
//!
//! Compares one live context metric against a band on every ~3 s cycle and
//! accumulates bonus seconds while the value stays inside it.

use contracts::{
    BonusMetric, ContractError, Effect, EffectId, MatchContext, MatchEvent, ThresholdBonusParams,
};
use tracing::debug;

/// Band-comparison bonus effect.
pub struct ThresholdBonusEffect {
    id: EffectId,
    params: ThresholdBonusParams,
}

impl ThresholdBonusEffect {
    /// Validate the parameters and build the effect.
    ///
    /// # Errors
    /// Returns an effect-load error for an empty band or negative bonus
    /// amounts; fatal to match setup.
    pub fn new(id: EffectId, params: ThresholdBonusParams) -> Result<Self, ContractError> {
        if let (Some(min), Some(max)) = (params.min, params.max) {
            if min >= max {
                return Err(ContractError::effect_load(
                    id.as_str(),
                    format!("empty band: min {min} >= max {max}"),
                ));
            }
        }
        if params.min.is_none() && params.max.is_none() {
            return Err(ContractError::effect_load(id.as_str(), "band has no edges"));
        }
        if params.bonus_seconds_per_cycle < 0.0 || params.end_bonus_seconds < 0.0 {
            return Err(ContractError::effect_load(
                id.as_str(),
                "bonus amounts must be non-negative",
            ));
        }
        Ok(Self { id, params })
    }

    fn metric_value(&self, ctx: &MatchContext) -> f64 {
        match self.params.metric {
            BonusMetric::SpeedMps => ctx.speed_mps,
            BonusMetric::AltitudeM => ctx.altitude_m,
            BonusMetric::HeartRateBpm => ctx.heart_rate_bpm,
            BonusMetric::PedalRpm => ctx.pedal_rpm,
            BonusMetric::StepCadenceSpm => ctx.step_cadence_spm,
        }
    }

    fn in_band(&self, value: f64) -> bool {
        self.params.min.map_or(true, |min| value >= min)
            && self.params.max.map_or(true, |max| value <= max)
    }
}

impl Effect for ThresholdBonusEffect {
    fn id(&self) -> EffectId {
        self.id.clone()
    }

    fn on_event(&mut self, event: &MatchEvent, ctx: &mut MatchContext) {
        match event {
            MatchEvent::Cycle => {
                let value = self.metric_value(ctx);
                if self.in_band(value) {
                    debug!(effect = %self.id, value, "threshold bonus applied");
                    metrics::counter!(
                        "effect_bonus_applications_total",
                        "effect" => self.id.to_string()
                    )
                    .increment(1);
                    ctx.add_bonus(&self.id, self.params.bonus_seconds_per_cycle);
                }
            }
            MatchEvent::Ended if self.params.end_bonus_seconds > 0.0 => {
                ctx.add_bonus(&self.id, self.params.end_bonus_seconds);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed_band(min: Option<f64>, max: Option<f64>) -> ThresholdBonusParams {
        ThresholdBonusParams {
            metric: BonusMetric::SpeedMps,
            min,
            max,
            bonus_seconds_per_cycle: 2.0,
            end_bonus_seconds: 0.0,
        }
    }

    #[test]
    fn accumulates_while_in_band() {
        let mut effect =
            ThresholdBonusEffect::new("sprint".into(), speed_band(Some(5.0), None)).unwrap();
        let mut ctx = MatchContext::default();

        ctx.speed_mps = 6.0;
        effect.on_event(&MatchEvent::Cycle, &mut ctx);
        effect.on_event(&MatchEvent::Cycle, &mut ctx);
        ctx.speed_mps = 3.0;
        effect.on_event(&MatchEvent::Cycle, &mut ctx);

        assert_eq!(ctx.bonuses.len(), 1);
        assert!((ctx.bonuses[0].bonus_seconds - 4.0).abs() < 1e-12);
        assert_eq!(ctx.bonuses[0].applications, 2);
    }

    #[test]
    fn end_bonus_applied_once() {
        let mut params = speed_band(Some(0.0), None);
        params.end_bonus_seconds = 10.0;
        let mut effect = ThresholdBonusEffect::new("finisher".into(), params).unwrap();
        let mut ctx = MatchContext::default();

        effect.on_event(&MatchEvent::Ended, &mut ctx);
        assert!((ctx.bonuses[0].bonus_seconds - 10.0).abs() < 1e-12);
    }

    #[test]
    fn empty_band_is_rejected() {
        assert!(ThresholdBonusEffect::new("bad".into(), speed_band(Some(5.0), Some(5.0))).is_err());
        assert!(ThresholdBonusEffect::new("bad".into(), speed_band(None, None)).is_err());
    }

    #[test]
    fn negative_bonus_is_rejected() {
        let mut params = speed_band(Some(1.0), None);
        params.bonus_seconds_per_cycle = -1.0;
        assert!(ThresholdBonusEffect::new("bad".into(), params).is_err());
    }
}
