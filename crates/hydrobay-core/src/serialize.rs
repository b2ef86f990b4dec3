//! Save/restore support via `bitcode` with a versioned header.
//!
//! Only simulated state is persisted. Capacity and fertility come from the
//! bay's configuration on restore, and the last light reading is recomputed
//! on the next growth integration.

use crate::bay::{GrowthBay, Stage};
use crate::config::{BayConfig, ConfigError};
use crate::fixed::Ticks;
use crate::id::CropId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a single-bay snapshot.
pub const BAY_SNAPSHOT_MAGIC: u32 = 0x4859_0001;

/// Magic number identifying a whole-greenhouse snapshot.
pub const GREENHOUSE_SNAPSHOT_MAGIC: u32 = 0x4859_0002;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{expected:08X}, got 0x{got:08X}")]
    InvalidMagic { expected: u32, got: u32 },
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid bay configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("module state rejected: {0}")]
    Module(#[from] crate::module::ModuleError),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Greenhouse tick at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(magic: u32, tick: Ticks) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self, expected_magic: u32) -> Result<(), DeserializeError> {
        if self.magic != expected_magic {
            return Err(DeserializeError::InvalidMagic {
                expected: expected_magic,
                got: self.magic,
            });
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bay snapshot
// ---------------------------------------------------------------------------

/// The persisted portion of a [`GrowthBay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaySnapshot {
    pub stage: Stage,
    pub plant_age: Ticks,
    pub crop: Option<CropId>,
    pub powered_last_tick: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct BayBlob {
    header: SnapshotHeader,
    bay: BaySnapshot,
}

impl GrowthBay {
    pub fn snapshot(&self) -> BaySnapshot {
        BaySnapshot {
            stage: self.stage.clone(),
            plant_age: self.plant_age,
            crop: self.crop,
            powered_last_tick: self.powered_last_tick,
        }
    }

    /// Rebuild a bay from a snapshot under `config`. A stored count above
    /// the configured capacity is clamped.
    pub fn restore(snapshot: BaySnapshot, config: &BayConfig) -> Result<Self, ConfigError> {
        let mut bay = GrowthBay::new(config)?;
        bay.stage = snapshot.stage;
        bay.plant_age = snapshot.plant_age;
        bay.crop = snapshot.crop;
        bay.powered_last_tick = snapshot.powered_last_tick;
        bay.clamp_stored();
        Ok(bay)
    }

    /// Serialize this bay into a standalone binary blob.
    pub fn serialize(&self, tick: Ticks) -> Result<Vec<u8>, SerializeError> {
        let blob = BayBlob {
            header: SnapshotHeader::new(BAY_SNAPSHOT_MAGIC, tick),
            bay: self.snapshot(),
        };
        bitcode::serialize(&blob).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize a bay blob produced by [`GrowthBay::serialize`].
    pub fn deserialize(data: &[u8], config: &BayConfig) -> Result<Self, DeserializeError> {
        let blob: BayBlob =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        blob.header.validate(BAY_SNAPSHOT_MAGIC)?;
        Ok(GrowthBay::restore(blob.bay, config)?)
    }
}
