//! Blueprint validation.
//!
//! Rules:
//! - source positions unique
//! - fusion slot geometry positive
//! - sampling cadences positive
//! - geofence coordinates in range, radii > 0
//! - effect ids non-empty and unique
//! - threshold bands non-empty, bonuses non-negative

use std::collections::HashSet;

use contracts::{
    ContractError, EffectId, EffectParams, GeoZone, MatchBlueprint, ThresholdBonusParams,
};

/// Validate a MatchBlueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    validate_sources(blueprint)?;
    validate_fusion(blueprint)?;
    validate_sampling(blueprint)?;
    validate_geofence(blueprint)?;
    validate_effects(blueprint)?;
    Ok(())
}

fn validate_sources(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for position in &blueprint.sources {
        if !seen.insert(position) {
            return Err(ContractError::config_validation(
                format!("sources[{}]", position.label()),
                "duplicate source position",
            ));
        }
    }
    Ok(())
}

fn validate_fusion(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    let fusion = &blueprint.fusion;
    if fusion.step_ms <= 0 {
        return Err(ContractError::config_validation(
            "fusion.step_ms",
            format!("step_ms must be > 0, got {}", fusion.step_ms),
        ));
    }
    if fusion.max_prediction_window == 0 {
        return Err(ContractError::config_validation(
            "fusion.max_prediction_window",
            "max_prediction_window must be > 0",
        ));
    }
    Ok(())
}

fn validate_sampling(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    let sampling = &blueprint.sampling;
    if sampling.tick_ms <= 0 {
        return Err(ContractError::config_validation(
            "sampling.tick_ms",
            format!("tick_ms must be > 0, got {}", sampling.tick_ms),
        ));
    }
    if sampling.elapsed_every_ticks == 0 {
        return Err(ContractError::config_validation(
            "sampling.elapsed_every_ticks",
            "elapsed_every_ticks must be > 0",
        ));
    }
    if sampling.cycle_every_ticks == 0 {
        return Err(ContractError::config_validation(
            "sampling.cycle_every_ticks",
            "cycle_every_ticks must be > 0",
        ));
    }
    Ok(())
}

fn validate_geofence(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    validate_zone("geofence.start", &blueprint.geofence.start)?;
    validate_zone("geofence.end", &blueprint.geofence.end)?;
    Ok(())
}

fn validate_zone(field: &str, zone: &GeoZone) -> Result<(), ContractError> {
    if zone.radius_m <= 0.0 {
        return Err(ContractError::config_validation(
            format!("{field}.radius_m"),
            format!("radius_m must be > 0, got {}", zone.radius_m),
        ));
    }
    if !(-90.0..=90.0).contains(&zone.center.latitude) {
        return Err(ContractError::config_validation(
            format!("{field}.center.latitude"),
            format!("latitude out of range: {}", zone.center.latitude),
        ));
    }
    if !(-180.0..=180.0).contains(&zone.center.longitude) {
        return Err(ContractError::config_validation(
            format!("{field}.center.longitude"),
            format!("longitude out of range: {}", zone.center.longitude),
        ));
    }
    Ok(())
}

fn validate_effects(blueprint: &MatchBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, effect) in blueprint.effects.iter().enumerate() {
        if effect.id.as_str().is_empty() {
            return Err(ContractError::config_validation(
                format!("effects[{idx}].id"),
                "effect id cannot be empty",
            ));
        }
        if !seen.insert(effect.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("effects[id={}]", effect.id),
                "duplicate effect id",
            ));
        }
        match &effect.params {
            EffectParams::ThresholdBonus(params) => {
                validate_threshold_params(&effect.id, params)?;
            }
        }
    }
    Ok(())
}

fn validate_threshold_params(
    id: &EffectId,
    params: &ThresholdBonusParams,
) -> Result<(), ContractError> {
    if params.min.is_none() && params.max.is_none() {
        return Err(ContractError::config_validation(
            format!("effects[id={id}].params"),
            "threshold band needs at least one of min/max",
        ));
    }
    if let (Some(min), Some(max)) = (params.min, params.max) {
        if min >= max {
            return Err(ContractError::config_validation(
                format!("effects[id={id}].params"),
                format!("band is empty: min ({min}) must be < max ({max})"),
            ));
        }
    }
    if params.bonus_seconds_per_cycle < 0.0 {
        return Err(ContractError::config_validation(
            format!("effects[id={id}].params.bonus_seconds_per_cycle"),
            format!("must be >= 0, got {}", params.bonus_seconds_per_cycle),
        ));
    }
    if params.end_bonus_seconds < 0.0 {
        return Err(ContractError::config_validation(
            format!("effects[id={id}].params.end_bonus_seconds"),
            format!("must be >= 0, got {}", params.end_bonus_seconds),
        ));
    }
    Ok(())
}
