//! Declarative host requests produced by the stage engine.
//!
//! The engine never touches the host world. Everything that must happen out
//! there (despawning plants, interrupting workers, playing a sound, showing
//! a message) comes back as an [`Effect`] in the [`AdvanceOutcome`], and the
//! host applies it.

use crate::bay::StageKind;
use crate::id::{CellPos, CropId, UnitId};

// ---------------------------------------------------------------------------
// Effect payloads
// ---------------------------------------------------------------------------

/// Why plant units are being removed from the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DespawnCause {
    /// Matured seedlings absorbed into the bay's stored count.
    Internalized,
    /// The bay filled up; anything left on the surface is discarded.
    BayFull,
    /// A fruiting body was picked and its plant returns to the buffer.
    Harvested,
    /// The operator switched crops mid-sowing.
    CropChanged,
    PowerLoss,
    /// The host removed or relocated the bay.
    Removed,
}

/// Informational, user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Power dropped and the batch was lost.
    PowerLost,
    /// The crop exceeded its lifespan and rotted.
    DiedOfAge { crop: CropId },
}

/// A request to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Remove these specific units.
    DespawnUnits { units: Vec<UnitId>, cause: DespawnCause },
    /// Remove every unit standing on the bay footprint.
    DespawnAll { cause: DespawnCause },
    /// Place a fully grown unit of `crop` on `cell`.
    SpawnMature { cell: CellPos, crop: CropId },
    /// End any worker action that is sowing into this bay.
    InterruptSowing,
    PlayCompletionCue,
    Notify(Notice),
}

/// Discriminant tag for effects, used for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    DespawnUnits,
    DespawnAll,
    SpawnMature,
    InterruptSowing,
    PlayCompletionCue,
    Notify,
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::DespawnUnits { .. } => EffectKind::DespawnUnits,
            Effect::DespawnAll { .. } => EffectKind::DespawnAll,
            Effect::SpawnMature { .. } => EffectKind::SpawnMature,
            Effect::InterruptSowing => EffectKind::InterruptSowing,
            Effect::PlayCompletionCue => EffectKind::PlayCompletionCue,
            Effect::Notify(_) => EffectKind::Notify,
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Why a stage transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionReason {
    BayFilled,
    FullyGrown,
    DiedOfAge,
    PowerLoss,
    /// Last unit placed for a single-harvest crop.
    HarvestComplete,
    /// Repeat-harvestable crop re-entered growth with its buffer.
    Regrow,
    /// Repeat-harvestable crop would not survive another cycle.
    ProjectedDeath,
    /// Repeat-harvestable crop finished with nothing buffered.
    NothingBuffered,
    ForcedReset,
}

/// A single stage change. At most one per advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StageKind,
    pub to: StageKind,
    pub reason: TransitionReason,
}

/// What one advance did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub effects: Vec<Effect>,
    pub transition: Option<Transition>,
}

impl AdvanceOutcome {
    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Record the stage change. A second transition in the same advance is a
    /// logic error.
    pub(crate) fn transition(&mut self, from: StageKind, to: StageKind, reason: TransitionReason) {
        debug_assert!(
            self.transition.is_none(),
            "second transition in one advance: {:?}",
            reason
        );
        tracing::debug!(?from, ?to, ?reason, "bay stage transition");
        self.transition = Some(Transition { from, to, reason });
    }

    /// Number of effects of `kind`.
    pub fn count(&self, kind: EffectKind) -> usize {
        self.effects.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind() == kind)
    }

    /// True when nothing happened: no effects and no transition.
    pub fn is_quiet(&self) -> bool {
        self.effects.is_empty() && self.transition.is_none()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_kinds_map() {
        assert_eq!(Effect::InterruptSowing.kind(), EffectKind::InterruptSowing);
        assert_eq!(
            Effect::DespawnAll {
                cause: DespawnCause::BayFull
            }
            .kind(),
            EffectKind::DespawnAll
        );
        assert_eq!(
            Effect::Notify(Notice::PowerLost).kind(),
            EffectKind::Notify
        );
    }

    #[test]
    fn outcome_counts_by_kind() {
        let mut out = AdvanceOutcome::default();
        assert!(out.is_quiet());
        out.push(Effect::PlayCompletionCue);
        out.push(Effect::InterruptSowing);
        out.push(Effect::InterruptSowing);
        assert_eq!(out.count(EffectKind::InterruptSowing), 2);
        assert!(out.has(EffectKind::PlayCompletionCue));
        assert!(!out.has(EffectKind::SpawnMature));
        assert!(!out.is_quiet());
    }

    #[test]
    fn notices_filter() {
        let mut out = AdvanceOutcome::default();
        out.push(Effect::PlayCompletionCue);
        out.push(Effect::Notify(Notice::DiedOfAge { crop: CropId(2) }));
        let notices: Vec<_> = out.notices().collect();
        assert_eq!(notices, vec![&Notice::DiedOfAge { crop: CropId(2) }]);
    }

    #[test]
    fn transition_recorded() {
        let mut out = AdvanceOutcome::default();
        out.transition(StageKind::Sowing, StageKind::Growing, TransitionReason::BayFilled);
        assert_eq!(
            out.transition,
            Some(Transition {
                from: StageKind::Sowing,
                to: StageKind::Growing,
                reason: TransitionReason::BayFilled,
            })
        );
        assert!(!out.is_quiet());
    }
}
