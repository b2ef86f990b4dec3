//! Hydrobay Data -- greenhouse content from RON, TOML or JSON files.
//!
//! [`load_greenhouse_data`] reads a directory of `crops`, `bays` and
//! `settings` files and returns a frozen crop registry, resolved bay
//! templates, the engine config and the density scaling config.

pub mod loader;
pub mod schema;

pub use loader::{BayTemplate, DataLoadError, GreenhouseData, load_greenhouse_data};
