//! The growth bay: one batch container and its lifecycle stage.
//!
//! Stage-local counters live inside the [`Stage`] variants, so a Sowing bay
//! cannot carry a harvest buffer and a Harvest bay cannot carry a growth
//! accumulator. Shared state (capacity, fertility, age, committed crop,
//! power edge) lives on [`GrowthBay`].

use crate::config::{BayConfig, ConfigError};
use crate::effect::{AdvanceOutcome, DespawnCause, Effect, TransitionReason};
use crate::fixed::{Fixed64, Ticks};
use crate::id::CropId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Lifecycle phase with its stage-local counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Accumulating matured seedlings up to capacity.
    Sowing { stored: u32 },
    /// Integrating growth on the coarse cadence.
    Growing {
        stored: u32,
        growth: Fixed64,
        tick_accumulator: Ticks,
    },
    /// Placing stored units back into the world and collecting repeat
    /// harvests.
    Harvest {
        remaining: u32,
        buffered: u32,
        /// Sum of the growth of every buffered unit.
        harvested_growth: Fixed64,
    },
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Sowing { stored: 0 }
    }
}

/// Discriminant of [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Sowing,
    Growing,
    Harvest,
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Sowing { .. } => StageKind::Sowing,
            Stage::Growing { .. } => StageKind::Growing,
            Stage::Harvest { .. } => StageKind::Harvest,
        }
    }

    /// Fresh growth pass over `stored` units starting at `growth`.
    pub fn growing(stored: u32, growth: Fixed64) -> Self {
        Stage::Growing {
            stored,
            growth,
            tick_accumulator: 0,
        }
    }

    /// Harvest pass with `remaining` units left to place.
    pub fn harvest(remaining: u32) -> Self {
        Stage::Harvest {
            remaining,
            buffered: 0,
            harvested_growth: Fixed64::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// GrowthBay
// ---------------------------------------------------------------------------

/// One physical growth container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthBay {
    pub(crate) stage: Stage,
    pub(crate) capacity: u32,
    pub(crate) fertility: Fixed64,
    pub(crate) plant_age: Ticks,
    pub(crate) crop: Option<CropId>,
    pub(crate) last_average_glow: Option<Fixed64>,
    pub(crate) powered_last_tick: bool,
}

impl GrowthBay {
    /// Spawn an empty bay in Sowing.
    pub fn new(config: &BayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stage: Stage::default(),
            capacity: config.capacity,
            fertility: config.fertility,
            plant_age: 0,
            crop: None,
            last_average_glow: None,
            powered_last_tick: true,
        })
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_kind(&self) -> StageKind {
        self.stage.kind()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn fertility(&self) -> Fixed64 {
        self.fertility
    }

    /// Units held in Sowing and Growing, or still to place in Harvest.
    pub fn stored_count(&self) -> u32 {
        match self.stage {
            Stage::Sowing { stored } | Stage::Growing { stored, .. } => stored,
            Stage::Harvest { remaining, .. } => remaining,
        }
    }

    /// Units harvested this pass and waiting to regrow.
    pub fn buffer_count(&self) -> u32 {
        match self.stage {
            Stage::Harvest { buffered, .. } => buffered,
            _ => 0,
        }
    }

    /// Fraction of the current growth cycle completed.
    pub fn growth(&self) -> Fixed64 {
        match self.stage {
            Stage::Sowing { .. } => Fixed64::ZERO,
            Stage::Growing { growth, .. } => growth,
            Stage::Harvest { .. } => Fixed64::ONE,
        }
    }

    /// Mean growth of the units buffered so far. Zero with an empty buffer.
    pub fn average_harvest_growth(&self) -> Fixed64 {
        match self.stage {
            Stage::Harvest {
                buffered,
                harvested_growth,
                ..
            } if buffered > 0 => harvested_growth / Fixed64::from_num(buffered),
            _ => Fixed64::ZERO,
        }
    }

    pub fn plant_age(&self) -> Ticks {
        self.plant_age
    }

    /// The crop committed for the current cycle.
    pub fn crop(&self) -> Option<CropId> {
        self.crop
    }

    /// Average light seen by the last growth integration. `None` when power
    /// was off, an environment check failed, or light is not considered.
    pub fn last_average_glow(&self) -> Option<Fixed64> {
        self.last_average_glow
    }

    pub fn powered_last_tick(&self) -> bool {
        self.powered_last_tick
    }

    /// Whether a worker may sow into this bay right now.
    pub fn can_accept_sow(&self) -> bool {
        matches!(self.stage, Stage::Sowing { stored } if stored < self.capacity)
    }

    // -----------------------------------------------------------------------
    // Mutation entry points
    // -----------------------------------------------------------------------

    /// Set capacity (minimum 1). Stored units above the new capacity are
    /// dropped. Returns the applied capacity.
    pub fn set_capacity(&mut self, capacity: u32) -> u32 {
        self.capacity = capacity.max(1);
        self.clamp_stored();
        self.capacity
    }

    /// Grow or shrink capacity by `delta` units (minimum 1).
    pub fn adjust_capacity(&mut self, delta: i32) -> u32 {
        let target = i64::from(self.capacity) + i64::from(delta);
        self.set_capacity(target.clamp(1, i64::from(u32::MAX)) as u32)
    }

    pub fn set_fertility(&mut self, fertility: Fixed64) -> Result<(), ConfigError> {
        if fertility <= Fixed64::ZERO {
            return Err(ConfigError::NonPositive("fertility"));
        }
        self.fertility = fertility;
        Ok(())
    }

    /// Purge the batch because the host is removing or relocating the bay.
    pub fn force_reset(&mut self) -> AdvanceOutcome {
        let mut out = AdvanceOutcome::default();
        let from = self.stage_kind();
        self.reset_cycle();
        out.push(Effect::DespawnAll {
            cause: DespawnCause::Removed,
        });
        if from != StageKind::Sowing {
            out.transition(from, StageKind::Sowing, TransitionReason::ForcedReset);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Internal transitions
    // -----------------------------------------------------------------------

    /// Back to an empty Sowing stage with zeroed counters and age. The
    /// committed crop is kept; the sowing handler reconciles it.
    pub(crate) fn reset_cycle(&mut self) {
        self.stage = Stage::default();
        self.plant_age = 0;
        self.last_average_glow = None;
    }

    /// Clamp stored units to capacity. Returns true if anything was dropped.
    pub(crate) fn clamp_stored(&mut self) -> bool {
        let capacity = self.capacity;
        let slot = match &mut self.stage {
            Stage::Sowing { stored } | Stage::Growing { stored, .. } => stored,
            Stage::Harvest { remaining, .. } => remaining,
        };
        if *slot > capacity {
            tracing::warn!(stored = *slot, capacity, "stored units exceed capacity; clamping");
            *slot = capacity;
            true
        } else {
            false
        }
    }

    /// Check the invariants that must hold between advances.
    pub fn validate(&self) -> Result<(), BayInvariantError> {
        if self.capacity == 0 {
            return Err(BayInvariantError::ZeroCapacity);
        }
        let stored = self.stored_count();
        if stored > self.capacity {
            return Err(BayInvariantError::Overfilled {
                stored,
                capacity: self.capacity,
            });
        }
        let growth = self.growth();
        if growth < Fixed64::ZERO || growth > Fixed64::ONE {
            return Err(BayInvariantError::GrowthOutOfRange(growth));
        }
        if let Stage::Harvest {
            buffered,
            harvested_growth,
            ..
        } = self.stage
            && buffered == 0
            && harvested_growth != Fixed64::ZERO
        {
            return Err(BayInvariantError::OrphanHarvestAverage);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BayInvariantError {
    #[error("capacity is zero")]
    ZeroCapacity,
    #[error("stored {stored} exceeds capacity {capacity}")]
    Overfilled { stored: u32, capacity: u32 },
    #[error("growth {0} outside [0, 1]")]
    GrowthOutOfRange(Fixed64),
    #[error("harvest average present with an empty buffer")]
    OrphanHarvestAverage,
}
