use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a bay owned by a [`Greenhouse`](crate::greenhouse::Greenhouse).
    pub struct BayId;
}

/// Identifies a crop definition in the [`CropRegistry`](crate::crop::CropRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CropId(pub u32);

/// Host-side handle of a plant unit standing on a bay cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u64);

/// A cell of the bay footprint in host grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub z: i32,
}

impl CellPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}
