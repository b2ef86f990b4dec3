//! Density levels: operator-driven capacity changes with a nonlinear power
//! cost per level.
//!
//! Level `n` holds `n * step` plant units, where the step is one layer of
//! the crop over the bay's footprint (see [`UnitLayout`]). Until a layout
//! is known the step falls back to `units_per_level`. Each level above the
//! first adds `base_increase * n^exponent` watts on top of `base_draw`.

use hydrobay_core::bay::GrowthBay;
use hydrobay_core::config::EngineConfig;
use hydrobay_core::crop::CropSpec;
use hydrobay_core::fixed::Fixed64;
use hydrobay_core::layout::UnitLayout;
use serde::{Deserialize, Serialize};

/// Scaling parameters. Watts are host-facing, so they stay in floating
/// point here and are converted once per result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub max_level: u32,
    /// Capacity gained per level when no footprint layout is known.
    pub units_per_level: u32,
    /// Draw at level 1, in watts.
    pub base_draw: f64,
    /// Cost multiplier for each extra level, in watts.
    pub base_increase: f64,
    pub exponent: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            max_level: 10,
            units_per_level: 52,
            base_draw: 2800.0,
            base_increase: 100.0,
            exponent: 1.5,
        }
    }
}

impl ScalingConfig {
    pub fn validate(&self) -> Result<(), ScaleError> {
        if self.max_level == 0 {
            return Err(ScaleError::InvalidConfig("max_level must be at least 1"));
        }
        if self.units_per_level == 0 {
            return Err(ScaleError::InvalidConfig("units_per_level must be at least 1"));
        }
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !finite_non_negative(self.base_draw) || !finite_non_negative(self.base_increase) {
            return Err(ScaleError::InvalidConfig("power figures must be finite and non-negative"));
        }
        if !finite_non_negative(self.exponent) {
            return Err(ScaleError::InvalidConfig("exponent must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Result of a density change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleOutcome {
    pub level: u32,
    pub capacity: u32,
    pub power_draw: Fixed64,
    /// The requested delta ran into the level bounds.
    pub clamped: bool,
    /// The step came from a best-effort layout.
    pub degraded: bool,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScaleError {
    #[error("capacity scaling is disabled")]
    Disabled,
    #[error("invalid scaling config: {0}")]
    InvalidConfig(&'static str),
}

/// Tracks one bay's density level.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityScaler {
    config: ScalingConfig,
    level: u32,
    step: u32,
    degraded: bool,
}

impl CapacityScaler {
    pub fn new(config: ScalingConfig) -> Result<Self, ScaleError> {
        config.validate()?;
        let step = config.units_per_level;
        Ok(Self {
            config,
            level: 1,
            step,
            degraded: false,
        })
    }

    /// Start at the level that covers `bay`'s current capacity.
    pub fn for_bay(config: ScalingConfig, bay: &GrowthBay) -> Result<Self, ScaleError> {
        let mut scaler = Self::new(config)?;
        scaler.sync_level(bay);
        Ok(scaler)
    }

    /// Step by one layer of `crop` over a footprint of `cell_count` cells and
    /// re-derive the level from `bay`'s capacity. A crop that cannot be laid
    /// out degrades to one unit per level.
    pub fn fit_layout(&mut self, bay: &GrowthBay, cell_count: usize, crop: &CropSpec) -> UnitLayout {
        let layout = UnitLayout::compute(bay.capacity(), cell_count, crop.max_units_per_cell);
        self.step = layout.units_per_layer;
        self.degraded = layout.degraded;
        self.sync_level(bay);
        layout
    }

    fn sync_level(&mut self, bay: &GrowthBay) {
        let level = bay.capacity().div_ceil(self.step);
        self.level = level.clamp(1, self.config.max_level);
    }

    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Units gained per level.
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn capacity_at(&self, level: u32) -> u32 {
        level.saturating_mul(self.step).max(1)
    }

    /// Watts added by reaching `level` from the level below.
    pub fn level_cost(&self, level: u32) -> f64 {
        self.config.base_increase * f64::from(level).powf(self.config.exponent)
    }

    /// Total draw at `level`.
    pub fn power_draw_at(&self, level: u32) -> Fixed64 {
        let extra: f64 = (2..=level).map(|k| self.level_cost(k)).sum();
        Fixed64::saturating_from_num(self.config.base_draw + extra)
    }

    pub fn power_draw(&self) -> Fixed64 {
        self.power_draw_at(self.level)
    }

    /// Extra watts the next level would cost, or `None` at the top level.
    pub fn next_increase_cost(&self) -> Option<Fixed64> {
        (self.level < self.config.max_level)
            .then(|| Fixed64::saturating_from_num(self.level_cost(self.level + 1)))
    }

    /// Move `delta` levels and resize `bay` to match.
    pub fn adjust(
        &mut self,
        bay: &mut GrowthBay,
        delta: i32,
        engine: &EngineConfig,
    ) -> Result<ScaleOutcome, ScaleError> {
        if !engine.capacity_scaling_enabled {
            return Err(ScaleError::Disabled);
        }
        let target = i64::from(self.level) + i64::from(delta);
        let max = i64::from(self.config.max_level);
        let level = target.clamp(1, max);
        self.level = level as u32;

        let capacity = bay.set_capacity(self.capacity_at(self.level));
        let outcome = ScaleOutcome {
            level: self.level,
            capacity,
            power_draw: self.power_draw(),
            clamped: level != target,
            degraded: self.degraded,
        };
        tracing::debug!(level = outcome.level, capacity, step = self.step, "density level changed");
        Ok(outcome)
    }
}
