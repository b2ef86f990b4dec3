//! Shared test helpers for integration tests and downstream crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, in other
//! crates' tests.

use crate::bay::GrowthBay;
use crate::config::{BayConfig, EngineConfig};
use crate::crop::{CropRegistry, CropRegistryBuilder, CropSpec};
use crate::effect::AdvanceOutcome;
use crate::engine::StageEngine;
use crate::env::{Environment, Occupant, UnitStage};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{CellPos, CropId, UnitId};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Crops
// ===========================================================================

/// Single-harvest grain, 10 grow days, ageless.
pub fn rice_spec() -> CropSpec {
    CropSpec {
        name: "rice".into(),
        grow_days: fixed(10.0),
        min_light: fixed(0.5),
        optimal_light: fixed(1.0),
        lifespan: 0,
        repeat_threshold: Fixed64::ZERO,
        max_units_per_cell: 1,
    }
}

/// Repeat-harvestable berry, reverting to half growth, ageless.
pub fn strawberry_spec() -> CropSpec {
    CropSpec {
        name: "strawberry".into(),
        grow_days: fixed(10.0),
        min_light: fixed(0.5),
        optimal_light: fixed(1.0),
        lifespan: 0,
        repeat_threshold: fixed(0.5),
        max_units_per_cell: 2,
    }
}

/// Short-lived crop that rots after 100 ticks.
pub fn mayfly_spec() -> CropSpec {
    CropSpec {
        name: "mayfly".into(),
        grow_days: fixed(10.0),
        min_light: fixed(0.5),
        optimal_light: fixed(1.0),
        lifespan: 100,
        repeat_threshold: Fixed64::ZERO,
        max_units_per_cell: 1,
    }
}

pub fn rice() -> CropId {
    CropId(0)
}
pub fn strawberry() -> CropId {
    CropId(1)
}
pub fn mayfly() -> CropId {
    CropId(2)
}

/// Registry holding rice, strawberry and mayfly, in that order.
pub fn crop_registry() -> CropRegistry {
    let mut b = CropRegistryBuilder::new();
    b.register(rice_spec()).unwrap();
    b.register(strawberry_spec()).unwrap();
    b.register(mayfly_spec()).unwrap();
    b.build().unwrap()
}

// ===========================================================================
// Config
// ===========================================================================

/// Light off, coarse interval of one simulated day.
pub fn daily_config() -> EngineConfig {
    EngineConfig {
        light_requirement: false,
        coarse_interval: 60_000,
        ..EngineConfig::default()
    }
}

pub fn bay_config(capacity: u32, fertility: f64) -> BayConfig {
    BayConfig {
        capacity,
        fertility: fixed(fertility),
    }
}

pub fn make_bay(capacity: u32, fertility: f64) -> GrowthBay {
    GrowthBay::new(&bay_config(capacity, fertility)).unwrap()
}

// ===========================================================================
// Environment
// ===========================================================================

/// A row of `n` cells along x.
pub fn footprint(n: i32) -> Vec<CellPos> {
    (0..n).map(|x| CellPos::new(x, 0)).collect()
}

pub fn lit_env(n: i32, crop: CropId) -> Environment {
    Environment::temperate(&footprint(n), Some(crop))
}

pub fn seedling(unit: u64) -> Occupant {
    Occupant {
        unit: UnitId(unit),
        stage: UnitStage::Growing,
        growth: fixed(0.05),
    }
}

pub fn mature(unit: u64, growth: f64) -> Occupant {
    Occupant {
        unit: UnitId(unit),
        stage: UnitStage::Mature,
        growth: fixed(growth),
    }
}

// ===========================================================================
// Driving
// ===========================================================================

/// Fill a Sowing bay to capacity by feeding one matured seedling per call
/// on cell 0. Returns the outcome of the final call.
pub fn sow_to_full(
    engine: &StageEngine<'_>,
    bay: &mut GrowthBay,
    env: &Environment,
) -> AdvanceOutcome {
    let mut env = env.clone();
    let cell = env.cells[0].pos;
    let mut next_unit = 1000;
    loop {
        env.place(cell, seedling(next_unit));
        next_unit += 1;
        let out = engine.advance(bay, &env, 1);
        if out.transition.is_some() {
            return out;
        }
    }
}

/// Advance in coarse-interval steps until the stage changes or `max_steps`
/// is reached.
pub fn grow_until_transition(
    engine: &StageEngine<'_>,
    bay: &mut GrowthBay,
    env: &Environment,
    max_steps: usize,
) -> Option<AdvanceOutcome> {
    let step: Ticks = engine.config().coarse_interval;
    for _ in 0..max_steps {
        let out = engine.advance(bay, env, step);
        if out.transition.is_some() {
            return Some(out);
        }
    }
    None
}
