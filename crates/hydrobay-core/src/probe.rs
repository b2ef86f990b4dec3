//! Pure environment probes used by the growth model.
//!
//! None of these touch bay state; they turn an [`Environment`] snapshot into
//! the readings the growth integration needs.

use crate::config::EnvironmentChecks;
use crate::env::{CellReading, Environment};
use crate::fixed::{Fixed64, clamp01};

/// Why growth made no progress this interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GrowthBlock {
    NoCrop,
    NoPower,
    Temperature,
    Daylight,
    Vacuum,
}

/// Mean ground light across the footprint. An empty footprint reads as
/// fully lit.
pub fn average_light(cells: &[CellReading]) -> Fixed64 {
    if cells.is_empty() {
        return Fixed64::ONE;
    }
    let total: Fixed64 = cells.iter().map(|c| c.light).sum();
    total / Fixed64::from_num(cells.len() as u32)
}

/// Growth rate in [0, 1] from average light: 0 at or below `min`, 1 at or
/// above `optimal`, linear in between.
pub fn light_rate(average: Fixed64, min: Fixed64, optimal: Fixed64) -> Fixed64 {
    if average <= min {
        return Fixed64::ZERO;
    }
    if average >= optimal {
        return Fixed64::ONE;
    }
    // min < average < optimal, so the span is positive.
    clamp01((average - min) / (optimal - min))
}

pub fn temperature_ok(env: &Environment, checks: &EnvironmentChecks) -> bool {
    checks
        .temperature
        .is_none_or(|band| band.contains(env.temperature))
}

pub fn daylight_ok(env: &Environment, checks: &EnvironmentChecks) -> bool {
    checks
        .daylight
        .is_none_or(|window| window.contains(env.day_fraction))
}

pub fn vacuum_ok(env: &Environment, checks: &EnvironmentChecks) -> bool {
    checks.max_vacuum.is_none_or(|max| env.vacuum <= max)
}

/// First environmental precondition that blocks growth, checked in the
/// order power, temperature, daylight, vacuum.
pub fn blocking_condition(env: &Environment, checks: &EnvironmentChecks) -> Option<GrowthBlock> {
    if checks.power && !env.powered {
        return Some(GrowthBlock::NoPower);
    }
    if !temperature_ok(env, checks) {
        return Some(GrowthBlock::Temperature);
    }
    if !daylight_ok(env, checks) {
        return Some(GrowthBlock::Daylight);
    }
    if !vacuum_ok(env, checks) {
        return Some(GrowthBlock::Vacuum);
    }
    None
}
