//! Sowing-stage occupancy bookkeeping.

use crate::bay::{GrowthBay, Stage, StageKind};
use crate::effect::{AdvanceOutcome, DespawnCause, Effect, TransitionReason};
use crate::env::Environment;
use crate::fixed::Fixed64;

/// Moves matured seedlings from the footprint into the bay's stored count
/// and flips the bay into Growing once it is full.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancyTracker;

impl OccupancyTracker {
    pub fn run(&self, bay: &mut GrowthBay, env: &Environment, out: &mut AdvanceOutcome) {
        if !self.sync_crop(bay, env, out) {
            return;
        }

        let capacity = bay.capacity;
        let Stage::Sowing { stored } = &mut bay.stage else {
            return;
        };

        let mut absorbed = Vec::new();
        for (_, occ) in env.occupants() {
            if *stored >= capacity {
                break;
            }
            if occ.is_ready_to_internalize() {
                *stored += 1;
                absorbed.push(occ.unit);
            }
        }
        if !absorbed.is_empty() {
            out.push(Effect::DespawnUnits {
                units: absorbed,
                cause: DespawnCause::Internalized,
            });
        }

        if *stored >= capacity {
            out.push(Effect::DespawnAll {
                cause: DespawnCause::BayFull,
            });
            out.push(Effect::InterruptSowing);
            out.push(Effect::PlayCompletionCue);
            bay.stage = Stage::growing(capacity, Fixed64::ZERO);
            out.transition(StageKind::Sowing, StageKind::Growing, TransitionReason::BayFilled);
        }
    }

    /// Reconcile the committed crop with the requested one. Returns false
    /// when nothing should be sown this call: no crop at all, or the
    /// request just changed and the cycle was discarded.
    fn sync_crop(&self, bay: &mut GrowthBay, env: &Environment, out: &mut AdvanceOutcome) -> bool {
        match (bay.crop, env.requested_crop) {
            (None, None) => false,
            (None, Some(requested)) => {
                bay.crop = Some(requested);
                true
            }
            (Some(committed), Some(requested)) if committed == requested => true,
            (Some(committed), requested) => {
                tracing::debug!(?committed, ?requested, "crop changed while sowing; discarding progress");
                bay.reset_cycle();
                bay.crop = requested;
                out.push(Effect::DespawnAll {
                    cause: DespawnCause::CropChanged,
                });
                // Units on the footprint belong to the old crop.
                false
            }
        }
    }
}
