//! Water upkeep for bays attached to a plumbing network.
//!
//! Each attached bay draws from a [`FuelSource`]. Every upkeep interval a
//! bay consumes `0.05` units per stored plant unless the network it sits on
//! has a recycler. The plumbing network itself is a host concern; the
//! module only sees it through the [`FuelSource`] trait.

use std::fmt;

use hydrobay_core::bay::GrowthBay;
use hydrobay_core::fixed::{Fixed64, Ticks};
use hydrobay_core::id::BayId;
use hydrobay_core::module::{Module, ModuleContext, ModuleError};
use slotmap::SecondaryMap;

/// Ticks between upkeep charges.
pub const DEFAULT_UPKEEP_INTERVAL: Ticks = 250;

/// Units consumed per stored plant per upkeep interval.
pub fn consumption_per_unit() -> Fixed64 {
    Fixed64::from_num(0.05)
}

// ---------------------------------------------------------------------------
// Fuel source
// ---------------------------------------------------------------------------

/// Host-provided supply a bay draws water from.
pub trait FuelSource: fmt::Debug + Send {
    fn consume_fuel(&mut self, amount: Fixed64);

    /// A recycler on the network makes upkeep free.
    fn is_recycling_present(&self) -> bool;

    /// Whether anything is left to draw. Hosts typically cut power to a
    /// dry bay.
    fn has_fuel(&self) -> bool {
        true
    }
}

/// Tank sizing for a bay of a given capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TankSpec {
    pub capacity: Fixed64,
    /// Refill per host refill call.
    pub refuel_rate: Fixed64,
}

impl TankSpec {
    /// Ten units of storage and a fifth of a unit of refill per plant slot.
    pub fn for_bay_capacity(capacity: u32) -> Self {
        let slots = Fixed64::from_num(capacity);
        Self {
            capacity: slots * 10,
            refuel_rate: slots / 5,
        }
    }
}

/// A plain tank, refilled by the host from its pipe network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterTank {
    pub spec: TankSpec,
    pub level: Fixed64,
    pub recycling: bool,
}

impl WaterTank {
    /// A full tank sized for `bay`.
    pub fn for_bay(bay: &GrowthBay) -> Self {
        let spec = TankSpec::for_bay_capacity(bay.capacity());
        Self {
            spec,
            level: spec.capacity,
            recycling: false,
        }
    }

    /// One refill step from the pipe network.
    pub fn refill(&mut self) {
        self.level = (self.level + self.spec.refuel_rate).min(self.spec.capacity);
    }
}

impl FuelSource for WaterTank {
    fn consume_fuel(&mut self, amount: Fixed64) {
        self.level = (self.level - amount).max(Fixed64::ZERO);
    }

    fn is_recycling_present(&self) -> bool {
        self.recycling
    }

    fn has_fuel(&self) -> bool {
        self.level > Fixed64::ZERO
    }
}

// ---------------------------------------------------------------------------
// Plumbing module
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PlumbingModule {
    interval: Ticks,
    accumulator: Ticks,
    sources: SecondaryMap<BayId, Box<dyn FuelSource>>,
    /// Total drawn since creation, across all bays.
    consumed: Fixed64,
}

impl Default for PlumbingModule {
    fn default() -> Self {
        Self::new(DEFAULT_UPKEEP_INTERVAL)
    }
}

impl PlumbingModule {
    /// An interval of 0 is clamped to 1.
    pub fn new(interval: Ticks) -> Self {
        Self {
            interval: interval.max(1),
            accumulator: 0,
            sources: SecondaryMap::new(),
            consumed: Fixed64::ZERO,
        }
    }

    pub fn attach(&mut self, bay: BayId, source: Box<dyn FuelSource>) {
        self.sources.insert(bay, source);
    }

    pub fn detach(&mut self, bay: BayId) -> Option<Box<dyn FuelSource>> {
        self.sources.remove(bay)
    }

    pub fn source(&self, bay: BayId) -> Option<&dyn FuelSource> {
        self.sources.get(bay).map(|s| s.as_ref())
    }

    pub fn source_mut(&mut self, bay: BayId) -> Option<&mut (dyn FuelSource + 'static)> {
        self.sources.get_mut(bay).map(|s| s.as_mut())
    }

    /// Whether `bay` can keep running. Bays without plumbing always can.
    pub fn is_supplied(&self, bay: BayId) -> bool {
        self.sources.get(bay).is_none_or(|s| s.has_fuel())
    }

    pub fn consumed(&self) -> Fixed64 {
        self.consumed
    }

    /// Water one interval of upkeep costs for `bay`.
    pub fn upkeep_for(bay: &GrowthBay) -> Fixed64 {
        consumption_per_unit() * Fixed64::from_num(bay.stored_count())
    }
}

impl Module for PlumbingModule {
    fn name(&self) -> &str {
        "plumbing"
    }

    fn on_tick(&mut self, ctx: &mut ModuleContext<'_>) {
        self.accumulator = self.accumulator.saturating_add(ctx.elapsed);
        let intervals = self.accumulator / self.interval;
        if intervals == 0 {
            return;
        }
        self.accumulator %= self.interval;
        let intervals = Fixed64::saturating_from_num(intervals);

        for (id, source) in self.sources.iter_mut() {
            let Some(bay) = ctx.bays.get(id) else {
                continue;
            };
            if source.is_recycling_present() {
                continue;
            }
            let amount = Self::upkeep_for(bay).saturating_mul(intervals);
            if amount > Fixed64::ZERO {
                source.consume_fuel(amount);
                self.consumed = self.consumed.saturating_add(amount);
                if !source.has_fuel() {
                    tracing::warn!(?id, "bay ran dry");
                }
            }
        }
    }

    fn serialize_state(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        out.extend_from_slice(&self.accumulator.to_le_bytes());
        out.extend_from_slice(&self.consumed.to_bits().to_le_bytes());
        out
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), ModuleError> {
        if data.len() != 16 {
            return Err(ModuleError::DeserializeFailed(format!(
                "expected 16 bytes, got {}",
                data.len()
            )));
        }
        let (acc, consumed) = data.split_at(8);
        let to_array = |bytes: &[u8]| -> Result<[u8; 8], ModuleError> {
            bytes
                .try_into()
                .map_err(|_| ModuleError::DeserializeFailed("truncated field".to_string()))
        };
        self.accumulator = u64::from_le_bytes(to_array(acc)?);
        self.consumed = Fixed64::from_bits(i64::from_le_bytes(to_array(consumed)?));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
