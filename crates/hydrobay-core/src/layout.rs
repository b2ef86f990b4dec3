//! How stored units partition into layers over the footprint.
//!
//! A layer is one unit slot per crop draw on every footprint cell. Renderers
//! stack layers; the capacity scaler steps capacity by one layer.

/// Per-layer partition of a bay's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLayout {
    pub units_per_layer: u32,
    pub layers: u32,
    /// The crop or footprint could not be partitioned cleanly and a
    /// best-effort count was used instead.
    pub degraded: bool,
}

impl UnitLayout {
    pub fn compute(capacity: u32, cell_count: usize, max_units_per_cell: u32) -> Self {
        let cells = u32::try_from(cell_count).unwrap_or(u32::MAX);
        let per_layer = cells.checked_mul(max_units_per_cell).filter(|&n| n > 0);
        let (units_per_layer, degraded) = match per_layer {
            Some(n) => (n, false),
            None => {
                tracing::warn!(
                    cell_count,
                    max_units_per_cell,
                    "crop cannot be partitioned over the footprint; using one unit per layer"
                );
                (1, true)
            }
        };
        Self {
            units_per_layer,
            layers: capacity.div_ceil(units_per_layer),
            degraded,
        }
    }

    /// Units drawn on the topmost, possibly partial, layer.
    pub fn top_layer_units(&self, capacity: u32) -> u32 {
        match capacity % self.units_per_layer {
            0 if capacity > 0 => self.units_per_layer,
            rem => rem,
        }
    }
}
