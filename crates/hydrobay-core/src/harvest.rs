//! Harvest-stage accounting and the regrowth projection.
//!
//! During Harvest the bay places its stored units back onto empty cells one
//! per cell per call. For repeat-harvestable crops, units that come back
//! from a harvest (growth reverted below [`FULLY_GROWN`]) are folded into a
//! buffer whose mean growth seeds the next cycle, provided the batch is
//! projected to outlive it.

use crate::bay::{GrowthBay, Stage, StageKind};
use crate::config::EngineConfig;
use crate::crop::CropSpec;
use crate::effect::{AdvanceOutcome, DespawnCause, Effect, TransitionReason};
use crate::env::Environment;
use crate::fixed::{Fixed64, Ticks, Wide, widen};
use crate::id::CropId;

/// A unit at or above this growth is still waiting to be harvested.
pub const FULLY_GROWN: Fixed64 = Fixed64::from_bits(4_290_672_329);

/// Margin applied to the regrowth projection, as a ratio.
const PROJECTION_MARGIN: (u32, u32) = (105, 100);

/// What finishing a harvest pass decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestVerdict {
    Reset(TransitionReason),
    Regrow { stored: u32, growth: Fixed64 },
}

#[derive(Debug, Clone, Copy)]
pub struct HarvestAccountant<'a> {
    config: &'a EngineConfig,
}

impl<'a> HarvestAccountant<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// One harvest pass over the footprint.
    pub fn run(
        &self,
        bay: &mut GrowthBay,
        crop: Option<(CropId, &CropSpec)>,
        env: &Environment,
        out: &mut AdvanceOutcome,
    ) {
        let Some((crop_id, spec)) = crop else {
            return;
        };
        let Stage::Harvest {
            remaining,
            buffered,
            harvested_growth,
        } = &mut bay.stage
        else {
            return;
        };

        let mut picked = Vec::new();
        let mut pending = false;
        for cell in &env.cells {
            match cell.occupant {
                None if *remaining > 0 => {
                    out.push(Effect::SpawnMature {
                        cell: cell.pos,
                        crop: crop_id,
                    });
                    *remaining -= 1;
                    // Not observed on the footprint until the next call.
                    pending = true;
                }
                None => {}
                Some(occ) if spec.is_repeat_harvestable() && occ.growth < FULLY_GROWN => {
                    *harvested_growth = harvested_growth.saturating_add(occ.growth);
                    *buffered += 1;
                    picked.push(occ.unit);
                }
                Some(_) => pending = true,
            }
        }
        if !picked.is_empty() {
            out.push(Effect::DespawnUnits {
                units: picked,
                cause: DespawnCause::Harvested,
            });
        }
        if *remaining > 0 || pending {
            return;
        }

        let (buffered, sum) = (*buffered, *harvested_growth);
        match self.finalize(bay, spec, buffered, sum) {
            HarvestVerdict::Reset(reason) => {
                bay.reset_cycle();
                out.transition(StageKind::Harvest, StageKind::Sowing, reason);
            }
            HarvestVerdict::Regrow { stored, growth } => {
                bay.stage = Stage::growing(stored, growth);
                out.transition(StageKind::Harvest, StageKind::Growing, TransitionReason::Regrow);
            }
        }
    }

    /// Decide between another cycle and a fresh sowing once every stored
    /// unit is placed and the footprint is settled.
    pub fn finalize(
        &self,
        bay: &GrowthBay,
        spec: &CropSpec,
        buffered: u32,
        harvested_growth: Fixed64,
    ) -> HarvestVerdict {
        if !spec.is_repeat_harvestable() {
            return HarvestVerdict::Reset(TransitionReason::HarvestComplete);
        }
        if buffered == 0 {
            return HarvestVerdict::Reset(TransitionReason::NothingBuffered);
        }
        let average = harvested_growth / Fixed64::from_num(buffered);
        if !spec.is_ageless() {
            let survives = self
                .projected_ticks_to_regrow(average, spec, bay.fertility)
                .and_then(|estimate| bay.plant_age.checked_add(estimate))
                .is_some_and(|end| end <= spec.lifespan);
            if !survives {
                tracing::debug!(crop = %spec.name, age = bay.plant_age, "batch would not survive another cycle");
                return HarvestVerdict::Reset(TransitionReason::ProjectedDeath);
            }
        }
        HarvestVerdict::Regrow {
            stored: buffered.min(bay.capacity),
            growth: average,
        }
    }

    /// Regrow estimate for a batch restarting at `average`:
    ///
    /// `(1 - avg) * ticks_per_day * grow_days / (reference_fertility * fertility) * ticks_per_day * 1.05`
    ///
    /// rounded up. `ticks_per_day` is applied twice. `None` when the estimate
    /// overflows or cannot be computed; callers treat that as projected death.
    pub fn projected_ticks_to_regrow(
        &self,
        average: Fixed64,
        spec: &CropSpec,
        fertility: Fixed64,
    ) -> Option<Ticks> {
        let day = Wide::saturating_from_num(self.config.ticks_per_day);
        let remaining = widen(Fixed64::ONE - average.clamp(Fixed64::ZERO, Fixed64::ONE));
        let ticks = remaining.checked_mul(day)?.checked_mul(widen(spec.grow_days))?;
        let speed = widen(self.config.reference_fertility) * widen(fertility);
        let base = ticks.checked_div(speed)?.checked_mul(day)?;
        let (num, den) = PROJECTION_MARGIN;
        let estimate = base.checked_mul_int(i128::from(num))? / i128::from(den);
        estimate.ceil().checked_to_num::<Ticks>()
    }
}
