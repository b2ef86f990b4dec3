//! Module system for extending a greenhouse with per-tick behaviors.
//!
//! Modules run after every bay has advanced, receiving a [`ModuleContext`]
//! with mutable access to the bays and read access to the environment
//! snapshots of that tick. Plumbing upkeep is one such module. Modules can
//! optionally serialize and restore custom state for save/load support.

use crate::bay::GrowthBay;
use crate::env::Environment;
use crate::fixed::Ticks;
use crate::id::BayId;
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Module trait
// ---------------------------------------------------------------------------

/// A greenhouse module that hooks into the tick pipeline.
///
/// The default implementations of `on_tick`, `serialize_state`, and
/// `load_state` are no-ops, so modules only need to override the methods
/// they care about.
pub trait Module: std::fmt::Debug + Send {
    /// The human-readable name of this module, used for lookup and debugging.
    fn name(&self) -> &str;

    /// Called once per greenhouse advance, after the bays.
    fn on_tick(&mut self, ctx: &mut ModuleContext<'_>) {
        let _ = ctx;
    }

    /// Serialize this module's internal state for save games.
    /// Returns an empty vec by default (stateless module).
    fn serialize_state(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Load previously serialized state. Returns `Ok(())` by default (no-op).
    fn load_state(&mut self, _data: &[u8]) -> Result<(), ModuleError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ---------------------------------------------------------------------------
// ModuleContext
// ---------------------------------------------------------------------------

/// Mutable context passed to modules during `on_tick`.
pub struct ModuleContext<'a> {
    pub bays: &'a mut SlotMap<BayId, GrowthBay>,
    /// Environment snapshots the bays were advanced against.
    pub environments: &'a SecondaryMap<BayId, Environment>,
    /// Greenhouse tick after this advance.
    pub tick: Ticks,
    /// Ticks covered by this advance.
    pub elapsed: Ticks,
}

// ---------------------------------------------------------------------------
// ModuleError
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("deserialize failed: {0}")]
    DeserializeFailed(String),
    #[error("module not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BayConfig;

    #[derive(Debug)]
    struct CounterModule {
        count: u32,
        last_elapsed: Ticks,
    }

    impl Module for CounterModule {
        fn name(&self) -> &str {
            "counter"
        }

        fn on_tick(&mut self, ctx: &mut ModuleContext<'_>) {
            self.count += 1;
            self.last_elapsed = ctx.elapsed;
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[derive(Debug)]
    struct CapacityBumpModule;

    impl Module for CapacityBumpModule {
        fn name(&self) -> &str {
            "capacity_bump"
        }

        fn on_tick(&mut self, ctx: &mut ModuleContext<'_>) {
            for (_, bay) in ctx.bays.iter_mut() {
                bay.adjust_capacity(1);
            }
        }

        fn serialize_state(&self) -> Vec<u8> {
            vec![7]
        }

        fn load_state(&mut self, data: &[u8]) -> Result<(), ModuleError> {
            if data != [7] {
                return Err(ModuleError::DeserializeFailed(format!(
                    "unexpected payload of {} bytes",
                    data.len()
                )));
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn module_on_tick_sees_context() {
        let mut bays = SlotMap::with_key();
        let envs = SecondaryMap::new();
        let mut module = CounterModule {
            count: 0,
            last_elapsed: 0,
        };
        for _ in 0..3 {
            let mut ctx = ModuleContext {
                bays: &mut bays,
                environments: &envs,
                tick: 0,
                elapsed: 5,
            };
            module.on_tick(&mut ctx);
        }
        assert_eq!(module.count, 3);
        assert_eq!(module.last_elapsed, 5);
    }

    #[test]
    fn module_can_mutate_bays() {
        let mut bays: SlotMap<BayId, GrowthBay> = SlotMap::with_key();
        let id = bays.insert(GrowthBay::new(&BayConfig::default()).unwrap());
        let envs = SecondaryMap::new();
        let mut ctx = ModuleContext {
            bays: &mut bays,
            environments: &envs,
            tick: 1,
            elapsed: 1,
        };
        CapacityBumpModule.on_tick(&mut ctx);
        assert_eq!(bays[id].capacity(), 53);
    }

    #[test]
    fn module_state_round_trip() {
        let mut m = CapacityBumpModule;
        let data = m.serialize_state();
        assert!(m.load_state(&data).is_ok());
        assert!(matches!(
            m.load_state(&[1, 2]),
            Err(ModuleError::DeserializeFailed(_))
        ));
    }

    #[test]
    fn default_state_is_empty() {
        let m = CounterModule {
            count: 0,
            last_elapsed: 0,
        };
        assert!(m.serialize_state().is_empty());
    }

    #[test]
    fn module_error_display_messages() {
        let msg = ModuleError::NotFound("plumbing".to_string()).to_string();
        assert!(msg.contains("module not found"), "got: {msg}");
        assert!(msg.contains("plumbing"), "got: {msg}");
    }
}
