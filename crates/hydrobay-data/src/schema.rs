//! On-disk structs for greenhouse content.
//!
//! Numbers are plain `f64` here. The loader converts them to fixed point and
//! rejects anything that does not fit.

use hydrobay_power::ScalingConfig;
use serde::Deserialize;

// ===========================================================================
// Crops
// ===========================================================================

/// A crop definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct CropData {
    pub name: String,
    pub grow_days: f64,
    #[serde(default = "default_min_light")]
    pub min_light: f64,
    #[serde(default = "default_optimal_light")]
    pub optimal_light: f64,
    /// Ticks before the plant rots. 0 = ageless.
    #[serde(default)]
    pub lifespan: u64,
    /// Growth a harvested unit reverts to. 0 = single harvest.
    #[serde(default)]
    pub repeat_threshold: f64,
    #[serde(default = "default_units_per_cell")]
    pub max_units_per_cell: u32,
}

fn default_min_light() -> f64 {
    0.5
}

fn default_optimal_light() -> f64 {
    1.0
}

fn default_units_per_cell() -> u32 {
    1
}

// ===========================================================================
// Bays
// ===========================================================================

/// A bay template: a building variant hosts spawn bays from.
#[derive(Debug, Clone, Deserialize)]
pub struct BayData {
    pub name: String,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_fertility")]
    pub fertility: f64,
    /// Crop the bay starts out requesting, by name.
    #[serde(default)]
    pub crop: Option<String>,
}

fn default_capacity() -> u32 {
    hydrobay_core::config::DEFAULT_CAPACITY
}

fn default_fertility() -> f64 {
    hydrobay_core::config::DEFAULT_FERTILITY
}

// ===========================================================================
// Settings
// ===========================================================================

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RangeData {
    pub min: f64,
    pub max: f64,
}

/// Engine policy as written in a settings file. Missing fields take the
/// engine defaults. An explicit `None`/`null` range disables that check.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineData {
    pub light_requirement: bool,
    pub power_loss_reset: bool,
    pub capacity_scaling_enabled: bool,
    pub ticks_per_day: u64,
    pub coarse_interval: u64,
    pub reference_fertility: f64,
    pub require_power: bool,
    pub temperature: Option<RangeData>,
    pub daylight: Option<RangeData>,
    pub max_vacuum: Option<f64>,
}

impl Default for EngineData {
    fn default() -> Self {
        Self {
            light_requirement: true,
            power_loss_reset: true,
            capacity_scaling_enabled: true,
            ticks_per_day: hydrobay_core::config::DEFAULT_TICKS_PER_DAY,
            coarse_interval: hydrobay_core::config::DEFAULT_COARSE_INTERVAL,
            reference_fertility: 1.0,
            require_power: true,
            temperature: Some(RangeData {
                min: 10.0,
                max: 42.0,
            }),
            daylight: Some(RangeData {
                min: 0.25,
                max: 0.8,
            }),
            max_vacuum: None,
        }
    }
}

/// The whole settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub engine: EngineData,
    pub scaling: ScalingConfig,
}
