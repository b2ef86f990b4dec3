//! A host-side aggregate of bays sharing one configuration and crop
//! registry.
//!
//! # Advance pipeline
//!
//! Each call to [`Greenhouse::advance_all`] runs:
//!
//! 1. **Bays** -- every bay with an environment snapshot is advanced by the
//!    stage engine. Bays are independent, so under the `parallel` feature
//!    this phase runs on the rayon pool.
//! 2. **Modules** -- registered modules run in registration order.
//! 3. **Bookkeeping** -- the tick counter moves and the state hash is
//!    recomputed.

use crate::bay::GrowthBay;
use crate::config::{BayConfig, ConfigError, EngineConfig};
use crate::crop::CropRegistry;
use crate::effect::AdvanceOutcome;
use crate::engine::StageEngine;
use crate::env::Environment;
use crate::fixed::Ticks;
use crate::id::BayId;
use crate::module::{Module, ModuleContext};
use crate::serialize::{
    DeserializeError, GREENHOUSE_SNAPSHOT_MAGIC, SerializeError, SnapshotHeader,
};
use crate::sim::StateHash;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

#[derive(Debug)]
pub struct Greenhouse {
    config: EngineConfig,
    crops: CropRegistry,
    bays: SlotMap<BayId, GrowthBay>,
    modules: Vec<Box<dyn Module>>,
    tick: Ticks,
    last_state_hash: u64,
}

impl Greenhouse {
    pub fn new(config: EngineConfig, crops: CropRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            crops,
            bays: SlotMap::with_key(),
            modules: Vec::new(),
            tick: 0,
            last_state_hash: StateHash::new().finish(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn crops(&self) -> &CropRegistry {
        &self.crops
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Hash computed at the end of the last advance.
    pub fn last_state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// An engine over this greenhouse's config and crops.
    pub fn engine(&self) -> StageEngine<'_> {
        StageEngine::from_validated(&self.config, &self.crops)
    }

    // -----------------------------------------------------------------------
    // Bays
    // -----------------------------------------------------------------------

    pub fn add_bay(&mut self, config: &BayConfig) -> Result<BayId, ConfigError> {
        let bay = GrowthBay::new(config)?;
        Ok(self.bays.insert(bay))
    }

    /// Remove a bay, purging its batch. The returned outcome carries the
    /// despawn request for the host.
    pub fn remove_bay(&mut self, id: BayId) -> Option<(GrowthBay, AdvanceOutcome)> {
        let mut bay = self.bays.remove(id)?;
        let outcome = bay.force_reset();
        Some((bay, outcome))
    }

    pub fn bay(&self, id: BayId) -> Option<&GrowthBay> {
        self.bays.get(id)
    }

    pub fn bay_mut(&mut self, id: BayId) -> Option<&mut GrowthBay> {
        self.bays.get_mut(id)
    }

    pub fn bays(&self) -> impl Iterator<Item = (BayId, &GrowthBay)> {
        self.bays.iter()
    }

    pub fn bay_count(&self) -> usize {
        self.bays.len()
    }

    // -----------------------------------------------------------------------
    // Modules
    // -----------------------------------------------------------------------

    pub fn register_module(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// First registered module of concrete type `T`.
    pub fn find_module<T: Module + 'static>(&self) -> Option<&T> {
        self.modules.iter().find_map(|m| m.as_any().downcast_ref::<T>())
    }

    pub fn find_module_mut<T: Module + 'static>(&mut self) -> Option<&mut T> {
        self.modules
            .iter_mut()
            .find_map(|m| m.as_any_mut().downcast_mut::<T>())
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance every bay that has a snapshot in `environments` by `elapsed`
    /// ticks, then run modules. Bays without a snapshot are skipped.
    pub fn advance_all(
        &mut self,
        environments: &SecondaryMap<BayId, Environment>,
        elapsed: Ticks,
    ) -> Vec<(BayId, AdvanceOutcome)> {
        let outcomes = self.phase_bays(environments, elapsed);

        self.tick = self.tick.saturating_add(elapsed);
        let mut modules = std::mem::take(&mut self.modules);
        {
            let mut ctx = ModuleContext {
                bays: &mut self.bays,
                environments,
                tick: self.tick,
                elapsed,
            };
            for module in &mut modules {
                module.on_tick(&mut ctx);
            }
        }
        self.modules = modules;

        self.last_state_hash = self.state_hash();
        outcomes
    }

    #[cfg(not(feature = "parallel"))]
    fn phase_bays(
        &mut self,
        environments: &SecondaryMap<BayId, Environment>,
        elapsed: Ticks,
    ) -> Vec<(BayId, AdvanceOutcome)> {
        let engine = StageEngine::from_validated(&self.config, &self.crops);
        self.bays
            .iter_mut()
            .filter_map(|(id, bay)| {
                let env = environments.get(id)?;
                Some((id, engine.advance(bay, env, elapsed)))
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn phase_bays(
        &mut self,
        environments: &SecondaryMap<BayId, Environment>,
        elapsed: Ticks,
    ) -> Vec<(BayId, AdvanceOutcome)> {
        use rayon::prelude::*;

        let engine = StageEngine::from_validated(&self.config, &self.crops);
        let work: Vec<(BayId, &mut GrowthBay)> = self.bays.iter_mut().collect();
        work.into_par_iter()
            .filter_map(|(id, bay)| {
                let env = environments.get(id)?;
                Some((id, engine.advance(bay, env, elapsed)))
            })
            .collect()
    }

    /// Deterministic hash over the tick and every bay in slot order.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.tick);
        for (_, bay) in &self.bays {
            h.write_bay(bay);
        }
        h.finish()
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = GreenhouseSnapshot {
            header: SnapshotHeader::new(GREENHOUSE_SNAPSHOT_MAGIC, self.tick),
            bays: self.bays.clone(),
            modules: self
                .modules
                .iter()
                .map(|m| (m.name().to_string(), m.serialize_state()))
                .collect(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild a greenhouse. Bay ids survive the round trip. `modules` are
    /// registered in order and receive their saved state by name.
    pub fn deserialize(
        data: &[u8],
        config: EngineConfig,
        crops: CropRegistry,
        modules: Vec<Box<dyn Module>>,
    ) -> Result<Self, DeserializeError> {
        let snapshot: GreenhouseSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate(GREENHOUSE_SNAPSHOT_MAGIC)?;

        let mut greenhouse = Greenhouse::new(config, crops)?;
        greenhouse.tick = snapshot.header.tick;
        greenhouse.bays = snapshot.bays;
        for (_, bay) in greenhouse.bays.iter_mut() {
            BayConfig {
                capacity: bay.capacity(),
                fertility: bay.fertility(),
            }
            .validate()?;
            bay.clamp_stored();
            bay.last_average_glow = None;
        }

        for mut module in modules {
            match snapshot.modules.iter().find(|(name, _)| name == module.name()) {
                Some((_, state)) => module.load_state(state)?,
                None => tracing::warn!(module = module.name(), "no saved state for module"),
            }
            greenhouse.modules.push(module);
        }

        greenhouse.last_state_hash = greenhouse.state_hash();
        Ok(greenhouse)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GreenhouseSnapshot {
    header: SnapshotHeader,
    bays: SlotMap<BayId, GrowthBay>,
    modules: Vec<(String, Vec<u8>)>,
}
