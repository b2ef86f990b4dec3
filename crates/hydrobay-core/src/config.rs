//! Explicit engine and bay configuration.
//!
//! Every policy the stage engine consults lives in an [`EngineConfig`] value
//! handed to [`StageEngine::new`](crate::engine::StageEngine::new). There is no
//! global settings object. All structs deserialize with defaults so partial
//! settings files are accepted.

use crate::fixed::{Fixed64, Ticks};
use serde::{Deserialize, Serialize};

/// Ticks in one simulated day.
pub const DEFAULT_TICKS_PER_DAY: Ticks = 60_000;

/// Growth integration cadence, roughly 33 seconds at 60 ticks per second.
pub const DEFAULT_COARSE_INTERVAL: Ticks = 2_000;

/// Default bay capacity in plant units.
pub const DEFAULT_CAPACITY: u32 = 52;

/// Default bay fertility multiplier.
pub const DEFAULT_FERTILITY: f64 = 2.8;

// ---------------------------------------------------------------------------
// Environment checks
// ---------------------------------------------------------------------------

/// Inclusive ambient temperature band, in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min: Fixed64,
    pub max: Fixed64,
}

impl TemperatureBand {
    pub fn contains(&self, t: Fixed64) -> bool {
        t >= self.min && t <= self.max
    }
}

impl Default for TemperatureBand {
    fn default() -> Self {
        Self {
            min: Fixed64::from_num(10),
            max: Fixed64::from_num(42),
        }
    }
}

/// Inclusive window of the simulated day, as fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: Fixed64,
    pub end: Fixed64,
}

impl DayWindow {
    pub fn contains(&self, day_fraction: Fixed64) -> bool {
        day_fraction >= self.start && day_fraction <= self.end
    }
}

impl Default for DayWindow {
    fn default() -> Self {
        Self {
            start: Fixed64::from_num(0.25),
            end: Fixed64::from_num(0.8),
        }
    }
}

/// Growth preconditions. A `None` check is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentChecks {
    /// Growth requires the bay to be powered.
    pub power: bool,
    pub temperature: Option<TemperatureBand>,
    pub daylight: Option<DayWindow>,
    /// Growth stops when the vacuum fraction exceeds this.
    pub max_vacuum: Option<Fixed64>,
}

impl Default for EnvironmentChecks {
    fn default() -> Self {
        Self {
            power: true,
            temperature: Some(TemperatureBand::default()),
            daylight: Some(DayWindow::default()),
            max_vacuum: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Policy flags and constants for the stage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Average cell light scales the growth rate. When off the rate is 1.
    pub light_requirement: bool,
    /// Losing power wipes the batch back to Sowing.
    pub power_loss_reset: bool,
    /// Hosts may change density levels through the capacity scaler.
    pub capacity_scaling_enabled: bool,
    pub ticks_per_day: Ticks,
    /// Ticks accumulated in Growing before growth is integrated once.
    pub coarse_interval: Ticks,
    /// Fertility assumed by the regrowth projection.
    pub reference_fertility: Fixed64,
    pub checks: EnvironmentChecks,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            light_requirement: true,
            power_loss_reset: true,
            capacity_scaling_enabled: true,
            ticks_per_day: DEFAULT_TICKS_PER_DAY,
            coarse_interval: DEFAULT_COARSE_INTERVAL,
            reference_fertility: Fixed64::ONE,
            checks: EnvironmentChecks::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_day == 0 {
            return Err(ConfigError::ZeroTicksPerDay);
        }
        if self.coarse_interval == 0 {
            return Err(ConfigError::ZeroCoarseInterval);
        }
        if self.reference_fertility <= Fixed64::ZERO {
            return Err(ConfigError::NonPositive("reference_fertility"));
        }
        if let Some(band) = &self.checks.temperature
            && band.min > band.max
        {
            return Err(ConfigError::InvertedRange("temperature"));
        }
        if let Some(window) = &self.checks.daylight
            && window.start > window.end
        {
            return Err(ConfigError::InvertedRange("daylight"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bay config
// ---------------------------------------------------------------------------

/// Per-building configuration a bay is spawned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayConfig {
    pub capacity: u32,
    pub fertility: Fixed64,
}

impl Default for BayConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            fertility: Fixed64::from_num(DEFAULT_FERTILITY),
        }
    }
}

impl BayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.fertility <= Fixed64::ZERO {
            return Err(ConfigError::NonPositive("fertility"));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bay capacity must be at least 1")]
    ZeroCapacity,
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("ticks_per_day must be positive")]
    ZeroTicksPerDay,
    #[error("coarse_interval must be positive")]
    ZeroCoarseInterval,
    #[error("{0} range is inverted")]
    InvertedRange(&'static str),
}
