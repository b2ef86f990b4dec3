//! Property-based tests for the stage engine.
//!
//! Drives bays through random host snapshots and capacity changes, then
//! checks the invariants that must hold between advances.

use hydrobay_core::bay::{GrowthBay, Stage};
use hydrobay_core::config::EngineConfig;
use hydrobay_core::engine::StageEngine;
use hydrobay_core::env::{Environment, Occupant, UnitStage};
use hydrobay_core::fixed::Fixed64;
use hydrobay_core::id::{CropId, UnitId};
use hydrobay_core::serialize::BaySnapshot;
use hydrobay_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

const CELLS: usize = 3;

#[derive(Debug, Clone)]
enum CellOp {
    Empty,
    Seedling,
    Sprout,
    Grown(u16),
}

#[derive(Debug, Clone)]
struct HostTick {
    elapsed: u64,
    powered: bool,
    cold: bool,
    crop: Option<u32>,
    cells: Vec<CellOp>,
    capacity_delta: i8,
}

fn arb_cell() -> impl Strategy<Value = CellOp> {
    prop_oneof![
        Just(CellOp::Empty),
        Just(CellOp::Seedling),
        Just(CellOp::Sprout),
        (0u16..=1000).prop_map(CellOp::Grown),
    ]
}

fn arb_tick() -> impl Strategy<Value = HostTick> {
    (
        prop_oneof![Just(0u64), 1u64..10, 1_000u64..70_000],
        prop::bool::weighted(0.9),
        prop::bool::weighted(0.1),
        prop::option::weighted(0.9, 0u32..3),
        prop::collection::vec(arb_cell(), CELLS),
        prop_oneof![8 => Just(0i8), 1 => -3i8..=3],
    )
        .prop_map(|(elapsed, powered, cold, crop, cells, capacity_delta)| HostTick {
            elapsed,
            powered,
            cold,
            crop,
            cells,
            capacity_delta,
        })
}

fn build_env(tick: &HostTick, serial: &mut u64) -> Environment {
    let mut env = Environment::temperate(&footprint(CELLS as i32), tick.crop.map(CropId));
    env.powered = tick.powered;
    if tick.cold {
        env.temperature = fixed(-5.0);
    }
    for (cell, op) in env.cells.iter_mut().zip(&tick.cells) {
        *serial += 1;
        let unit = UnitId(*serial);
        cell.occupant = match op {
            CellOp::Empty => None,
            CellOp::Seedling => Some(Occupant {
                unit,
                stage: UnitStage::Sowing,
                growth: Fixed64::ZERO,
            }),
            CellOp::Sprout => Some(seedling(unit.0)),
            CellOp::Grown(g) => Some(mature(unit.0, f64::from(*g) / 1000.0)),
        };
    }
    env
}

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        (0u32..12).prop_map(|stored| Stage::Sowing { stored }),
        (0u32..12, 0u16..=1000, 0u64..3000).prop_map(|(stored, g, acc)| Stage::Growing {
            stored,
            growth: fixed(f64::from(g) / 1000.0),
            tick_accumulator: acc,
        }),
        (0u32..12, 0u32..6, 0u16..=1000).prop_map(|(remaining, buffered, g)| Stage::Harvest {
            remaining,
            buffered,
            harvested_growth: if buffered == 0 {
                Fixed64::ZERO
            } else {
                fixed(f64::from(g) / 1000.0) * Fixed64::from_num(buffered)
            },
        }),
    ]
}

fn arb_bay() -> impl Strategy<Value = GrowthBay> {
    (arb_stage(), 1u32..10, 0u64..200_000, prop::option::of(0u32..3), any::<bool>()).prop_map(
        |(stage, capacity, plant_age, crop, powered_last_tick)| {
            GrowthBay::restore(
                BaySnapshot {
                    stage,
                    plant_age,
                    crop: crop.map(CropId),
                    powered_last_tick,
                },
                &bay_config(capacity, 1.5),
            )
            .unwrap()
        },
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_across_random_hosts(
        capacity in 1u32..8,
        ticks in prop::collection::vec(arb_tick(), 1..80),
    ) {
        let cfg = EngineConfig::default();
        let crops = crop_registry();
        let engine = StageEngine::new(&cfg, &crops).unwrap();
        let mut bay = make_bay(capacity, 2.8);
        let mut serial = 0;

        for tick in &ticks {
            if tick.capacity_delta != 0 {
                bay.adjust_capacity(i32::from(tick.capacity_delta));
            }
            let env = build_env(tick, &mut serial);
            let before = bay.stage_kind();
            let out = engine.advance(&mut bay, &env, tick.elapsed);

            prop_assert!(bay.validate().is_ok(), "{:?}", bay.validate());
            prop_assert!(bay.stored_count() <= bay.capacity());
            prop_assert!(bay.growth() >= Fixed64::ZERO && bay.growth() <= Fixed64::ONE);
            if let Some(t) = out.transition {
                prop_assert_eq!(t.from, before);
                prop_assert_eq!(t.to, bay.stage_kind());
            } else {
                prop_assert_eq!(before, bay.stage_kind());
            }
        }
    }

    #[test]
    fn zero_elapsed_changes_nothing(bay in arb_bay(), tick in arb_tick()) {
        let cfg = EngineConfig::default();
        let crops = crop_registry();
        let engine = StageEngine::new(&cfg, &crops).unwrap();
        let mut serial = 0;
        let env = build_env(&tick, &mut serial);

        let mut after = bay.clone();
        let out = engine.advance(&mut after, &env, 0);
        prop_assert!(out.is_quiet());
        prop_assert_eq!(after, bay);
    }

    #[test]
    fn restored_bays_are_clamped(bay in arb_bay()) {
        prop_assert!(bay.stored_count() <= bay.capacity());
    }
}
