//! Crop definitions and the immutable crop registry.
//!
//! Crops are registered once at startup through [`CropRegistryBuilder`] and
//! frozen into a [`CropRegistry`] that bays reference by [`CropId`].

use crate::fixed::{Fixed64, Ticks};
use crate::id::CropId;
use std::collections::HashMap;

/// Growth parameters for one crop type. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropSpec {
    pub name: String,
    /// Simulated days to reach full growth at rate 1 and fertility 1.
    pub grow_days: Fixed64,
    /// Average light at or below which the crop does not grow.
    pub min_light: Fixed64,
    /// Average light at or above which the crop grows at full rate.
    pub optimal_light: Fixed64,
    /// Ticks a plant may live before rotting. 0 = ageless.
    pub lifespan: Ticks,
    /// Growth a harvested unit reverts to. 0 = single harvest.
    pub repeat_threshold: Fixed64,
    /// Plant units drawn per footprint cell.
    pub max_units_per_cell: u32,
}

impl CropSpec {
    /// Whether the crop can be partially harvested and regrown.
    pub fn is_repeat_harvestable(&self) -> bool {
        self.repeat_threshold > Fixed64::ZERO
    }

    /// Whether the crop ever dies of age.
    pub fn is_ageless(&self) -> bool {
        self.lifespan == 0
    }

    /// A crop the growth model can integrate: positive growth duration and
    /// an ordered light window.
    pub fn is_valid(&self) -> bool {
        self.grow_days > Fixed64::ZERO
            && self.min_light >= Fixed64::ZERO
            && self.optimal_light >= self.min_light
            && self.repeat_threshold >= Fixed64::ZERO
            && self.repeat_threshold < Fixed64::ONE
    }
}

/// Builder for constructing an immutable [`CropRegistry`].
#[derive(Debug, Default)]
pub struct CropRegistryBuilder {
    crops: Vec<CropSpec>,
    name_to_id: HashMap<String, CropId>,
}

impl CropRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a crop. Returns its ID.
    pub fn register(&mut self, spec: CropSpec) -> Result<CropId, RegistryError> {
        if self.name_to_id.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateName(spec.name));
        }
        let id = CropId(self.crops.len() as u32);
        self.name_to_id.insert(spec.name.clone(), id);
        self.crops.push(spec);
        Ok(id)
    }

    /// Mutate an already registered crop by name.
    pub fn mutate<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut CropSpec),
    {
        let id = self
            .name_to_id
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        f(&mut self.crops[id.0 as usize]);
        Ok(())
    }

    pub fn crop_id(&self, name: &str) -> Option<CropId> {
        self.name_to_id.get(name).copied()
    }

    /// Finalize. Every crop must pass [`CropSpec::is_valid`].
    pub fn build(self) -> Result<CropRegistry, RegistryError> {
        for spec in &self.crops {
            if !spec.is_valid() {
                return Err(RegistryError::InvalidCrop(spec.name.clone()));
            }
        }
        Ok(CropRegistry {
            crops: self.crops,
            name_to_id: self.name_to_id,
        })
    }
}

/// Immutable registry. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone, Default)]
pub struct CropRegistry {
    crops: Vec<CropSpec>,
    name_to_id: HashMap<String, CropId>,
}

impl CropRegistry {
    pub fn get(&self, id: CropId) -> Option<&CropSpec> {
        self.crops.get(id.0 as usize)
    }

    pub fn crop_id(&self, name: &str) -> Option<CropId> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Look up a crop only if it can drive growth. Missing or invalid
    /// definitions leave the caller inert.
    pub fn resolve(&self, id: Option<CropId>) -> Option<&CropSpec> {
        let spec = self.get(id?)?;
        if spec.is_valid() {
            Some(spec)
        } else {
            tracing::warn!(crop = %spec.name, "crop definition cannot drive growth");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("crop not found: {0}")]
    NotFound(String),
    #[error("duplicate crop name: {0}")]
    DuplicateName(String),
    #[error("invalid crop definition: {0}")]
    InvalidCrop(String),
}
