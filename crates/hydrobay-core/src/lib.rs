//! Hydrobay Core -- the stage engine for high-density growth bays.
//!
//! A growth bay takes in matured seedlings until it is full, integrates
//! growth on a coarse cadence under light, temperature, daylight and power
//! constraints, then hands the crop back to the world. Repeat-harvestable
//! crops regrow from the average growth of their harvested units as long as
//! the batch is projected to outlive another cycle.
//!
//! # Advance Pipeline
//!
//! Each call to [`engine::StageEngine::advance`]:
//!
//! 1. **Power edge** -- a powered-to-unpowered edge may wipe the batch.
//! 2. **Sowing** -- absorb ready seedlings; a full bay starts growing.
//! 3. **Growing** -- accumulate ticks; every coarse interval age the batch,
//!    check lifespan, integrate growth.
//! 4. **Harvest** -- place stored units, buffer repeat harvests, then
//!    either regrow or reset.
//!
//! The engine never touches the host world. Everything the host must do
//! comes back as [`effect::Effect`] values.
//!
//! # Key Types
//!
//! - [`bay::GrowthBay`] -- one container and its [`bay::Stage`].
//! - [`engine::StageEngine`] -- the pure controller.
//! - [`env::Environment`] -- the per-call host snapshot.
//! - [`config::EngineConfig`] -- explicit policy flags and constants.
//! - [`crop::CropRegistry`] -- immutable crop definitions.
//! - [`greenhouse::Greenhouse`] -- many bays, modules, hashing, save/load.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod bay;
pub mod config;
pub mod crop;
pub mod effect;
pub mod engine;
pub mod env;
pub mod fixed;
pub mod greenhouse;
pub mod growth;
pub mod harvest;
pub mod id;
pub mod layout;
pub mod module;
pub mod occupancy;
pub mod probe;
pub mod report;
pub mod serialize;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
