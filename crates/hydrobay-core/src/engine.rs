//! The stage engine: power edge detection, stage dispatch, and the coarse
//! growth cadence.
//!
//! # Advance order
//!
//! 1. Zero elapsed ticks: nothing happens.
//! 2. Stale overfill is clamped to capacity.
//! 3. Power edge. A powered-to-unpowered edge with `power_loss_reset` wipes
//!    the batch and ends the call.
//! 4. Stage handler: occupancy (Sowing), growth (Growing), harvest
//!    (Harvest). Each applies at most one transition as its last step.

use crate::bay::{GrowthBay, Stage, StageKind};
use crate::config::{ConfigError, EngineConfig};
use crate::crop::CropRegistry;
use crate::effect::{AdvanceOutcome, DespawnCause, Effect, Notice, TransitionReason};
use crate::env::Environment;
use crate::fixed::{Fixed64, Ticks};
use crate::growth::GrowthModel;
use crate::harvest::HarvestAccountant;
use crate::occupancy::OccupancyTracker;

/// Drives one bay per call. Holds only shared read-only inputs, so one
/// engine can advance any number of bays.
#[derive(Debug, Clone, Copy)]
pub struct StageEngine<'a> {
    config: &'a EngineConfig,
    crops: &'a CropRegistry,
}

impl<'a> StageEngine<'a> {
    pub fn new(config: &'a EngineConfig, crops: &'a CropRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, crops })
    }

    /// For callers that already validated `config`.
    pub(crate) fn from_validated(config: &'a EngineConfig, crops: &'a CropRegistry) -> Self {
        Self { config, crops }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn crops(&self) -> &CropRegistry {
        self.crops
    }

    /// Advance `bay` by `elapsed` ticks against the snapshot `env`.
    pub fn advance(&self, bay: &mut GrowthBay, env: &Environment, elapsed: Ticks) -> AdvanceOutcome {
        let mut out = AdvanceOutcome::default();
        if elapsed == 0 {
            return out;
        }
        bay.clamp_stored();

        let was_powered = bay.powered_last_tick;
        bay.powered_last_tick = env.powered;
        if was_powered && !env.powered && self.config.power_loss_reset {
            self.power_loss(bay, &mut out);
            return out;
        }

        match bay.stage_kind() {
            StageKind::Sowing => OccupancyTracker.run(bay, env, &mut out),
            StageKind::Growing => self.grow(bay, env, elapsed, &mut out),
            StageKind::Harvest => {
                let crop = bay
                    .crop
                    .and_then(|id| self.crops.resolve(Some(id)).map(|spec| (id, spec)));
                HarvestAccountant::new(self.config).run(bay, crop, env, &mut out);
            }
        }
        out
    }

    fn power_loss(&self, bay: &mut GrowthBay, out: &mut AdvanceOutcome) {
        let from = bay.stage_kind();
        tracing::info!(?from, stored = bay.stored_count(), "bay lost power; batch reset");
        bay.reset_cycle();
        out.push(Effect::DespawnAll {
            cause: DespawnCause::PowerLoss,
        });
        out.push(Effect::Notify(Notice::PowerLost));
        if from != StageKind::Sowing {
            out.transition(from, StageKind::Sowing, TransitionReason::PowerLoss);
        }
    }

    fn grow(&self, bay: &mut GrowthBay, env: &Environment, elapsed: Ticks, out: &mut AdvanceOutcome) {
        let interval = self.config.coarse_interval;
        let (stored, growth) = match &mut bay.stage {
            Stage::Growing {
                stored,
                growth,
                tick_accumulator,
            } => {
                *tick_accumulator = tick_accumulator.saturating_add(elapsed);
                if *tick_accumulator < interval {
                    return;
                }
                *tick_accumulator = 0;
                (*stored, *growth)
            }
            _ => return,
        };

        let model = GrowthModel::new(self.config);
        let crop = self.crops.resolve(bay.crop);

        bay.plant_age = model.aged(bay.plant_age);
        if let (Some(id), Some(spec)) = (bay.crop, crop)
            && GrowthModel::expired(bay.plant_age, spec)
        {
            tracing::info!(crop = %spec.name, age = bay.plant_age, "crop died of age");
            bay.reset_cycle();
            out.push(Effect::Notify(Notice::DiedOfAge { crop: id }));
            out.transition(StageKind::Growing, StageKind::Sowing, TransitionReason::DiedOfAge);
            return;
        }

        let reading = model.compute(bay.fertility, crop, env);
        bay.last_average_glow = reading.glow;
        let next = GrowthModel::apply(growth, reading.delta);

        if next >= Fixed64::ONE {
            bay.stage = Stage::harvest(stored);
            out.transition(StageKind::Growing, StageKind::Harvest, TransitionReason::FullyGrown);
        } else if let Stage::Growing { growth, .. } = &mut bay.stage {
            *growth = next;
        }
    }
}
