//! Point-in-time environment snapshot supplied by the host on every advance.

use crate::fixed::Fixed64;
use crate::id::{CellPos, CropId, UnitId};

/// Life stage of a plant unit standing on a bay cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UnitStage {
    /// Still being sown by a worker.
    Sowing,
    /// Sown and growing; ready to be internalized by a sowing bay.
    Growing,
    /// Fully grown and harvestable.
    Mature,
}

/// A plant unit the host reports on a footprint cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub unit: UnitId,
    pub stage: UnitStage,
    /// The unit's own growth fraction in [0, 1].
    pub growth: Fixed64,
}

impl Occupant {
    pub fn is_ready_to_internalize(&self) -> bool {
        self.stage == UnitStage::Growing
    }
}

/// Per-cell reading for one cell of the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReading {
    pub pos: CellPos,
    /// Ground light level in [0, 1].
    pub light: Fixed64,
    pub occupant: Option<Occupant>,
}

impl CellReading {
    pub fn empty(pos: CellPos, light: Fixed64) -> Self {
        Self {
            pos,
            light,
            occupant: None,
        }
    }
}

/// Everything the engine reads from the host for one advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Footprint cells in the host's iteration order.
    pub cells: Vec<CellReading>,
    /// Ambient temperature in degrees Celsius.
    pub temperature: Fixed64,
    /// Fraction of the simulated day elapsed, in [0, 1).
    pub day_fraction: Fixed64,
    /// Fraction of atmosphere lost, in [0, 1].
    pub vacuum: Fixed64,
    pub powered: bool,
    /// The crop an operator currently selected for this bay.
    pub requested_crop: Option<CropId>,
}

impl Environment {
    /// A temperate, lit, powered midday snapshot over `cells` empty cells.
    pub fn temperate(cells: &[CellPos], requested_crop: Option<CropId>) -> Self {
        Self {
            cells: cells
                .iter()
                .map(|&pos| CellReading::empty(pos, Fixed64::ONE))
                .collect(),
            temperature: Fixed64::from_num(21),
            day_fraction: Fixed64::from_num(0.5),
            vacuum: Fixed64::ZERO,
            powered: true,
            requested_crop,
        }
    }

    /// Place an occupant on the cell at `pos`. Returns false if the cell is
    /// not part of the footprint.
    pub fn place(&mut self, pos: CellPos, occupant: Occupant) -> bool {
        match self.cells.iter_mut().find(|c| c.pos == pos) {
            Some(cell) => {
                cell.occupant = Some(occupant);
                true
            }
            None => false,
        }
    }

    /// Remove any occupant from the cell at `pos`.
    pub fn clear(&mut self, pos: CellPos) {
        if let Some(cell) = self.cells.iter_mut().find(|c| c.pos == pos) {
            cell.occupant = None;
        }
    }

    pub fn occupants(&self) -> impl Iterator<Item = (&CellReading, &Occupant)> {
        self.cells
            .iter()
            .filter_map(|c| c.occupant.as_ref().map(|o| (c, o)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<CellPos> {
        vec![CellPos::new(0, 0), CellPos::new(0, 1)]
    }

    #[test]
    fn temperate_snapshot_is_lit_and_powered() {
        let env = Environment::temperate(&cells(), Some(CropId(0)));
        assert_eq!(env.cells.len(), 2);
        assert!(env.powered);
        assert!(env.cells.iter().all(|c| c.light == Fixed64::ONE));
        assert_eq!(env.occupants().count(), 0);
    }

    #[test]
    fn place_and_clear_occupant() {
        let mut env = Environment::temperate(&cells(), None);
        let occ = Occupant {
            unit: UnitId(1),
            stage: UnitStage::Growing,
            growth: Fixed64::ZERO,
        };
        assert!(env.place(CellPos::new(0, 1), occ));
        assert!(!env.place(CellPos::new(5, 5), occ));
        assert_eq!(env.occupants().count(), 1);
        env.clear(CellPos::new(0, 1));
        assert_eq!(env.occupants().count(), 0);
    }

    #[test]
    fn only_growing_units_are_ready() {
        let mut occ = Occupant {
            unit: UnitId(1),
            stage: UnitStage::Sowing,
            growth: Fixed64::ZERO,
        };
        assert!(!occ.is_ready_to_internalize());
        occ.stage = UnitStage::Growing;
        assert!(occ.is_ready_to_internalize());
        occ.stage = UnitStage::Mature;
        assert!(!occ.is_ready_to_internalize());
    }
}
