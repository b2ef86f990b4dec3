//! End-to-end lifecycle tests for the stage engine and the greenhouse.

use hydrobay_core::bay::{Stage, StageKind};
use hydrobay_core::config::EngineConfig;
use hydrobay_core::crop::{CropRegistryBuilder, CropSpec};
use hydrobay_core::effect::{DespawnCause, Effect, EffectKind, Notice, TransitionReason};
use hydrobay_core::engine::StageEngine;
use hydrobay_core::fixed::Fixed64;
use hydrobay_core::greenhouse::Greenhouse;
use hydrobay_core::id::{BayId, CellPos};
use hydrobay_core::module::{Module, ModuleContext, ModuleError};
use hydrobay_core::report::BayReport;
use hydrobay_core::serialize::BaySnapshot;
use hydrobay_core::test_utils::*;
use slotmap::SecondaryMap;

// ===========================================================================
// Sowing
// ===========================================================================

#[test]
fn fourth_maturity_event_fills_capacity_four() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(4, 1.0);
    let mut env = lit_env(2, rice());

    for unit in 0..3 {
        env.place(CellPos::new(0, 0), seedling(unit));
        let out = engine.advance(&mut bay, &env, 1);
        assert_eq!(bay.stage_kind(), StageKind::Sowing);
        assert_eq!(bay.stored_count(), unit as u32 + 1);
        assert!(out.transition.is_none());
        assert!(!out.has(EffectKind::InterruptSowing));
    }

    env.place(CellPos::new(0, 0), seedling(3));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stage_kind(), StageKind::Growing);
    assert_eq!(bay.stored_count(), 4);
    assert_eq!(out.count(EffectKind::InterruptSowing), 1);
    assert_eq!(out.count(EffectKind::DespawnAll), 1);
    assert_eq!(out.count(EffectKind::PlayCompletionCue), 1);
    assert!(!bay.can_accept_sow());
}

#[test]
fn sowing_waits_for_a_requested_crop() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(4, 1.0);
    let mut env = lit_env(1, rice());
    env.requested_crop = None;
    env.place(CellPos::new(0, 0), seedling(1));

    let out = engine.advance(&mut bay, &env, 1);
    assert!(out.is_quiet());
    assert_eq!(bay.stored_count(), 0);
    assert!(bay.crop().is_none());
}

#[test]
fn crop_switch_mid_sowing_starts_over() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(4, 1.0);
    let mut env = lit_env(1, rice());
    env.place(CellPos::new(0, 0), seedling(1));
    engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stored_count(), 1);

    env.requested_crop = Some(strawberry());
    env.clear(CellPos::new(0, 0));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(bay.crop(), Some(strawberry()));
    assert_eq!(
        out.effects,
        vec![Effect::DespawnAll {
            cause: DespawnCause::CropChanged
        }]
    );
}

#[test]
fn crop_switch_does_not_bank_old_crop_seedlings() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(4, 1.0);
    let mut env = lit_env(2, rice());
    env.place(CellPos::new(0, 0), seedling(1));
    engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stored_count(), 1);

    // A rice seedling is still on the footprint when strawberries are requested.
    env.requested_crop = Some(strawberry());
    env.place(CellPos::new(0, 0), seedling(2));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(bay.crop(), Some(strawberry()));
    assert!(!out.has(EffectKind::DespawnUnits));
}

#[test]
fn clearing_the_request_mid_sowing_goes_inert() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(4, 1.0);
    let mut env = lit_env(1, rice());
    env.place(CellPos::new(0, 0), seedling(1));
    engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stored_count(), 1);

    env.requested_crop = None;
    env.place(CellPos::new(0, 0), seedling(2));
    let out = engine.advance(&mut bay, &env, 1);
    assert!(bay.crop().is_none());
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(
        out.effects,
        vec![Effect::DespawnAll {
            cause: DespawnCause::CropChanged
        }]
    );

    let out = engine.advance(&mut bay, &env, 1);
    assert!(out.is_quiet());
    assert_eq!(bay.stored_count(), 0);
}

// ===========================================================================
// Growing
// ===========================================================================

#[test]
fn ten_daily_intervals_reach_harvest() {
    let cfg = daily_config();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(2, 1.0);
    let env = lit_env(2, rice());
    sow_to_full(&engine, &mut bay, &env);

    for _ in 0..9 {
        engine.advance(&mut bay, &env, cfg.coarse_interval);
        assert_eq!(bay.stage_kind(), StageKind::Growing);
    }
    assert!(bay.growth() < Fixed64::ONE);
    let out = engine.advance(&mut bay, &env, cfg.coarse_interval);
    assert_eq!(bay.stage_kind(), StageKind::Harvest);
    assert!(bay.growth() >= Fixed64::ONE);
    assert_eq!(
        out.transition.map(|t| t.reason),
        Some(TransitionReason::FullyGrown)
    );
}

#[test]
fn growth_is_monotonic_within_a_pass() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(1, 2.8);
    let mut env = lit_env(1, rice());
    sow_to_full(&engine, &mut bay, &env);

    let mut last = bay.growth();
    for step in 0..40 {
        // Alternate daylight and night.
        env.day_fraction = if step % 2 == 0 { fixed(0.5) } else { fixed(0.9) };
        engine.advance(&mut bay, &env, 700);
        if bay.stage_kind() != StageKind::Growing {
            break;
        }
        assert!(bay.growth() >= last);
        last = bay.growth();
    }
}

#[test]
fn lifespan_expiry_resets_regardless_of_growth() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = hydrobay_core::bay::GrowthBay::restore(
        BaySnapshot {
            stage: Stage::growing(3, fixed(0.99)),
            plant_age: 0,
            crop: Some(mayfly()),
            powered_last_tick: true,
        },
        &bay_config(3, 1.0),
    )
    .unwrap();
    let env = lit_env(1, mayfly());

    let out = engine.advance(&mut bay, &env, cfg.coarse_interval);
    assert_eq!(bay.stage_kind(), StageKind::Sowing);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(bay.growth(), Fixed64::ZERO);
    assert_eq!(bay.plant_age(), 0);
    assert_eq!(
        out.notices().collect::<Vec<_>>(),
        vec![&Notice::DiedOfAge { crop: mayfly() }]
    );
}

#[test]
fn cold_snap_halts_growth_and_clears_glow() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(1, 1.0);
    let mut env = lit_env(1, rice());
    sow_to_full(&engine, &mut bay, &env);

    engine.advance(&mut bay, &env, cfg.coarse_interval);
    let grown = bay.growth();
    assert!(bay.last_average_glow().is_some());

    env.temperature = fixed(2.0);
    engine.advance(&mut bay, &env, cfg.coarse_interval);
    assert_eq!(bay.growth(), grown);
    assert!(bay.last_average_glow().is_none());
}

// ===========================================================================
// Harvest
// ===========================================================================

#[test]
fn single_harvest_full_cycle() {
    let cfg = daily_config();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(2, 1.0);
    let mut env = lit_env(2, rice());
    sow_to_full(&engine, &mut bay, &env);
    grow_until_transition(&engine, &mut bay, &env, 20).unwrap();
    assert_eq!(bay.stage_kind(), StageKind::Harvest);

    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(out.count(EffectKind::SpawnMature), 2);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(bay.stage_kind(), StageKind::Harvest);

    // Host placed them; workers have not harvested yet.
    env.place(CellPos::new(0, 0), mature(10, 1.0));
    env.place(CellPos::new(1, 0), mature(11, 1.0));
    let out = engine.advance(&mut bay, &env, 1);
    assert!(out.is_quiet());

    // Harvested and removed by the host.
    env.clear(CellPos::new(0, 0));
    env.clear(CellPos::new(1, 0));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stage_kind(), StageKind::Sowing);
    assert_eq!(
        out.transition.map(|t| t.reason),
        Some(TransitionReason::HarvestComplete)
    );
    assert!(bay.can_accept_sow());
}

#[test]
fn ageless_repeat_crop_regrows_from_average() {
    let cfg = daily_config();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(2, 1.0);
    let mut env = lit_env(2, strawberry());
    sow_to_full(&engine, &mut bay, &env);
    grow_until_transition(&engine, &mut bay, &env, 20).unwrap();
    engine.advance(&mut bay, &env, 1);
    let age = bay.plant_age();

    // Both plants were picked and reverted to half growth.
    env.place(CellPos::new(0, 0), mature(10, 0.5));
    env.place(CellPos::new(1, 0), mature(11, 0.5));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stage_kind(), StageKind::Growing);
    assert_eq!(bay.growth(), fixed(0.5));
    assert_eq!(bay.stored_count(), 2);
    assert_eq!(bay.plant_age(), age);
    assert_eq!(
        out.transition.map(|t| t.reason),
        Some(TransitionReason::Regrow)
    );
    assert_eq!(out.count(EffectKind::DespawnUnits), 1);
}

#[test]
fn mortal_repeat_crop_resets_when_regrowth_outlives_it() {
    let cfg = daily_config();
    let mut builder = CropRegistryBuilder::new();
    let berry = builder
        .register(CropSpec {
            lifespan: 2_000_000,
            ..strawberry_spec()
        })
        .unwrap();
    let crops = builder.build().unwrap();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(2, 1.0);
    let mut env = lit_env(2, berry);
    sow_to_full(&engine, &mut bay, &env);
    grow_until_transition(&engine, &mut bay, &env, 20).unwrap();
    engine.advance(&mut bay, &env, 1);
    assert!(bay.plant_age() < 2_000_000);

    // Regrowing from half takes 0.5 * 60k * 10 * 60k * 1.05 ticks.
    env.place(CellPos::new(0, 0), mature(10, 0.5));
    env.place(CellPos::new(1, 0), mature(11, 0.5));
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stage_kind(), StageKind::Sowing);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(bay.plant_age(), 0);
    assert_eq!(
        out.transition.map(|t| t.reason),
        Some(TransitionReason::ProjectedDeath)
    );
}

// ===========================================================================
// Power
// ===========================================================================

#[test]
fn power_loss_wipes_batch_in_same_call() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(2, 1.0);
    let mut env = lit_env(1, rice());
    sow_to_full(&engine, &mut bay, &env);
    engine.advance(&mut bay, &env, cfg.coarse_interval);
    assert!(bay.growth() > Fixed64::ZERO);

    env.powered = false;
    let out = engine.advance(&mut bay, &env, 1);
    assert_eq!(bay.stage_kind(), StageKind::Sowing);
    assert_eq!(bay.growth(), Fixed64::ZERO);
    assert_eq!(bay.stored_count(), 0);
    assert_eq!(
        out.transition.map(|t| t.reason),
        Some(TransitionReason::PowerLoss)
    );
    assert!(out.effects.contains(&Effect::DespawnAll {
        cause: DespawnCause::PowerLoss
    }));
}

// ===========================================================================
// Greenhouse
// ===========================================================================

#[derive(Debug, Default)]
struct TickCounter {
    runs: u64,
}

impl Module for TickCounter {
    fn name(&self) -> &str {
        "tick_counter"
    }

    fn on_tick(&mut self, _ctx: &mut ModuleContext<'_>) {
        self.runs += 1;
    }

    fn serialize_state(&self) -> Vec<u8> {
        self.runs.to_le_bytes().to_vec()
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), ModuleError> {
        let bytes: [u8; 8] = data
            .try_into()
            .map_err(|_| ModuleError::DeserializeFailed(format!("{} bytes", data.len())))?;
        self.runs = u64::from_le_bytes(bytes);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn greenhouse_with_two_bays() -> (Greenhouse, BayId, BayId) {
    let mut gh = Greenhouse::new(daily_config(), crop_registry()).unwrap();
    let a = gh.add_bay(&bay_config(1, 1.0)).unwrap();
    let b = gh.add_bay(&bay_config(3, 2.0)).unwrap();
    gh.register_module(Box::new(TickCounter::default()));
    (gh, a, b)
}

#[test]
fn greenhouse_advances_only_bays_with_snapshots() {
    let (mut gh, a, b) = greenhouse_with_two_bays();
    let mut envs = SecondaryMap::new();
    let mut env = lit_env(1, rice());
    env.place(CellPos::new(0, 0), seedling(1));
    envs.insert(a, env);

    let outcomes = gh.advance_all(&envs, 1);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, a);
    assert_eq!(gh.bay(a).unwrap().stage_kind(), StageKind::Growing);
    assert_eq!(gh.bay(b).unwrap().stage_kind(), StageKind::Sowing);
    assert_eq!(gh.tick(), 1);
    assert_eq!(gh.find_module::<TickCounter>().unwrap().runs, 1);
    assert_eq!(gh.last_state_hash(), gh.state_hash());
}

#[test]
fn greenhouse_hash_is_deterministic() {
    let run = || {
        let (mut gh, a, b) = greenhouse_with_two_bays();
        let mut envs = SecondaryMap::new();
        envs.insert(a, lit_env(2, rice()));
        envs.insert(b, lit_env(2, strawberry()));
        for _ in 0..5 {
            gh.advance_all(&envs, 500);
        }
        gh.state_hash()
    };
    assert_eq!(run(), run());
}

#[test]
fn greenhouse_save_and_load() {
    let (mut gh, a, b) = greenhouse_with_two_bays();
    let mut envs = SecondaryMap::new();
    let mut env = lit_env(1, rice());
    env.place(CellPos::new(0, 0), seedling(1));
    envs.insert(a, env);
    gh.advance_all(&envs, 1);
    gh.advance_all(&envs, 60_000);

    let data = gh.serialize().unwrap();
    let restored = Greenhouse::deserialize(
        &data,
        daily_config(),
        crop_registry(),
        vec![Box::new(TickCounter::default())],
    )
    .unwrap();

    assert_eq!(restored.tick(), gh.tick());
    assert_eq!(restored.bay_count(), 2);
    assert_eq!(restored.bay(a).unwrap().growth(), gh.bay(a).unwrap().growth());
    assert_eq!(restored.bay(b).unwrap().capacity(), 3);
    assert_eq!(restored.find_module::<TickCounter>().unwrap().runs, 2);
}

#[test]
fn removing_a_bay_purges_it() {
    let (mut gh, a, _) = greenhouse_with_two_bays();
    let (bay, out) = gh.remove_bay(a).unwrap();
    assert_eq!(bay.stored_count(), 0);
    assert!(out.effects.contains(&Effect::DespawnAll {
        cause: DespawnCause::Removed
    }));
    assert!(gh.bay(a).is_none());
    assert!(gh.remove_bay(a).is_none());
}

#[test]
fn report_reflects_growing_bay() {
    let cfg = EngineConfig::default();
    let crops = crop_registry();
    let engine = StageEngine::new(&cfg, &crops).unwrap();
    let mut bay = make_bay(1, 1.0);
    let env = lit_env(1, rice());
    sow_to_full(&engine, &mut bay, &env);
    engine.advance(&mut bay, &env, cfg.coarse_interval);

    let text = BayReport::new(&bay, &crops, &env, &cfg).to_string();
    assert!(text.contains("Currently growing: rice"), "got: {text}");
    assert!(text.contains("Stage: Growing"), "got: {text}");
    assert!(text.contains("Stored plants: 1 / 1"), "got: {text}");
    assert!(text.contains("Light: 100%"), "got: {text}");
}
