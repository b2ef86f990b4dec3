//! Hydrobay Power -- density scaling and plumbing upkeep for growth bays.
//!
//! Neither concern is part of the stage engine. [`scaling::CapacityScaler`]
//! resizes a bay through its public capacity API and reports the resulting
//! power draw for the host's grid. [`plumbing::PlumbingModule`] plugs into a
//! [`hydrobay_core::greenhouse::Greenhouse`] as a module and charges water
//! upkeep per stored plant.

pub mod plumbing;
pub mod scaling;

pub use plumbing::{FuelSource, PlumbingModule, TankSpec, WaterTank};
pub use scaling::{CapacityScaler, ScaleError, ScaleOutcome, ScalingConfig};
