//! EffectEngine - effect registry and event dispatch.
//!
//! Effects are registered once at match setup, loaded in order (any load
//! failure aborts the match start), then receive every event synchronously
//! in registration order. No cancellation, no priorities.

use contracts::{
    ContractError, Effect, EffectDefinition, EffectParams, MatchContext, MatchEvent,
};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::threshold::ThresholdBonusEffect;

/// Effect registry builder.
#[derive(Default)]
pub struct EffectEngineBuilder {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-constructed effect.
    pub fn with_effect(mut self, effect: Box<dyn Effect>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Construct and register effects from configuration.
    ///
    /// # Errors
    /// Returns the first construction error; duplicate identifiers within
    /// the definitions are rejected.
    pub fn with_definitions(
        mut self,
        definitions: &[EffectDefinition],
    ) -> Result<Self, ContractError> {
        let mut seen = HashSet::new();
        for definition in definitions {
            if !seen.insert(definition.id.clone()) {
                return Err(ContractError::config_validation(
                    "effects",
                    format!("duplicate effect id '{}'", definition.id),
                ));
            }
            let effect: Box<dyn Effect> = match &definition.params {
                EffectParams::ThresholdBonus(params) => Box::new(ThresholdBonusEffect::new(
                    definition.id.clone(),
                    params.clone(),
                )?),
            };
            self.effects.push(effect);
        }
        Ok(self)
    }

    /// Load every effect and seal the registry.
    ///
    /// # Errors
    /// The first load failure aborts; the match must not start.
    pub fn build(mut self) -> Result<EffectEngine, ContractError> {
        for effect in &mut self.effects {
            debug!(effect = %effect.id(), "loading effect");
            effect.load()?;
        }
        info!(count = self.effects.len(), "effect engine ready");
        Ok(EffectEngine {
            effects: self.effects,
        })
    }
}

/// Sealed effect registry.
pub struct EffectEngine {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectEngine {
    pub fn builder() -> EffectEngineBuilder {
        EffectEngineBuilder::new()
    }

    /// Dispatch one event to every effect in registration order.
    #[instrument(name = "effect_dispatch", skip(self, event, ctx))]
    pub fn dispatch(&mut self, event: &MatchEvent, ctx: &mut MatchContext) {
        metrics::counter!("effect_events_total", "kind" => event_kind(event)).increment(1);
        for effect in &mut self.effects {
            effect.on_event(event, ctx);
        }
    }

    /// Number of registered effects.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }
}

fn event_kind(event: &MatchEvent) -> &'static str {
    match event {
        MatchEvent::Started => "started",
        MatchEvent::Cycle => "cycle",
        MatchEvent::WindowReady(_) => "window_ready",
        MatchEvent::Ended => "ended",
    }
}
