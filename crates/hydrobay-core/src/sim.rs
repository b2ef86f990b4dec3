//! Deterministic state hashing for desync detection.

use crate::bay::{GrowthBay, Stage};
use crate::fixed::Fixed64;

/// A simple deterministic hash of bay state.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Feed every simulated field of a bay, stage first.
    pub fn write_bay(&mut self, bay: &GrowthBay) {
        match bay.stage() {
            Stage::Sowing { stored } => {
                self.write(&[0]);
                self.write_u32(*stored);
            }
            Stage::Growing {
                stored,
                growth,
                tick_accumulator,
            } => {
                self.write(&[1]);
                self.write_u32(*stored);
                self.write_fixed64(*growth);
                self.write_u64(*tick_accumulator);
            }
            Stage::Harvest {
                remaining,
                buffered,
                harvested_growth,
            } => {
                self.write(&[2]);
                self.write_u32(*remaining);
                self.write_u32(*buffered);
                self.write_fixed64(*harvested_growth);
            }
        }
        self.write_u32(bay.capacity());
        self.write_fixed64(bay.fertility());
        self.write_u64(bay.plant_age());
        self.write_u32(bay.crop().map_or(u32::MAX, |c| c.0));
        self.write(&[bay.powered_last_tick() as u8]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
