//! Growth integration on the coarse cadence.
//!
//! [`GrowthModel`] turns an environment snapshot and crop parameters into a
//! growth delta for one coarse interval. Aging and lifespan expiry are
//! handled here too since expiry short-circuits growth.

use crate::config::EngineConfig;
use crate::crop::CropSpec;
use crate::env::Environment;
use crate::fixed::{Fixed64, Ticks, Wide, clamp01, widen};
use crate::probe::{self, GrowthBlock};

/// Growth within this distance of 1 counts as fully grown. Absorbs the
/// truncation error of summing fixed-point deltas.
pub const GROWTH_SNAP: Fixed64 = Fixed64::from_bits(1 << 16);

/// Result of one growth integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthReading {
    pub delta: Fixed64,
    /// Average light used for the rate, `None` when not applicable.
    pub glow: Option<Fixed64>,
    pub blocked: Option<GrowthBlock>,
}

impl GrowthReading {
    fn blocked(reason: GrowthBlock) -> Self {
        Self {
            delta: Fixed64::ZERO,
            glow: None,
            blocked: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GrowthModel<'a> {
    config: &'a EngineConfig,
}

impl<'a> GrowthModel<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Age after one coarse interval.
    pub fn aged(&self, plant_age: Ticks) -> Ticks {
        plant_age.saturating_add(self.config.coarse_interval)
    }

    /// Whether a plant of `age` ticks has outlived `crop`.
    pub fn expired(age: Ticks, crop: &CropSpec) -> bool {
        !crop.is_ageless() && age > crop.lifespan
    }

    /// Growth rate and the light reading behind it.
    pub fn rate(&self, env: &Environment, crop: &CropSpec) -> (Fixed64, Option<Fixed64>) {
        if !self.config.light_requirement {
            return (Fixed64::ONE, None);
        }
        let avg = probe::average_light(&env.cells);
        (
            probe::light_rate(avg, crop.min_light, crop.optimal_light),
            Some(avg),
        )
    }

    /// Growth fraction gained in one coarse interval at `rate`.
    ///
    /// `fertility * rate * coarse_interval / (ticks_per_day * grow_days)`,
    /// evaluated in wide precision. Saturates instead of overflowing.
    pub fn delta(&self, fertility: Fixed64, rate: Fixed64, crop: &CropSpec) -> Fixed64 {
        let numer = widen(fertility) * widen(rate) * Wide::saturating_from_num(self.config.coarse_interval);
        let denom = Wide::saturating_from_num(self.config.ticks_per_day) * widen(crop.grow_days);
        match numer.checked_div(denom) {
            Some(d) => Fixed64::saturating_from_num(d),
            None => Fixed64::ZERO,
        }
    }

    /// Full integration for one interval: preconditions, rate, delta.
    pub fn compute(
        &self,
        fertility: Fixed64,
        crop: Option<&CropSpec>,
        env: &Environment,
    ) -> GrowthReading {
        let Some(crop) = crop else {
            return GrowthReading::blocked(GrowthBlock::NoCrop);
        };
        if let Some(block) = probe::blocking_condition(env, &self.config.checks) {
            return GrowthReading::blocked(block);
        }
        let (rate, glow) = self.rate(env, crop);
        let delta = self.delta(fertility, rate, crop);
        tracing::trace!(crop = %crop.name, %rate, %delta, "growth integrated");
        GrowthReading {
            delta,
            glow,
            blocked: None,
        }
    }

    /// Add `delta` to `growth`, clamped to [0, 1] and snapped to 1 within
    /// [`GROWTH_SNAP`].
    pub fn apply(growth: Fixed64, delta: Fixed64) -> Fixed64 {
        let next = clamp01(growth.saturating_add(delta));
        if Fixed64::ONE - next <= GROWTH_SNAP {
            Fixed64::ONE
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::CellPos;

    fn crop(grow_days: f64) -> CropSpec {
        CropSpec {
            name: "rice".into(),
            grow_days: Fixed64::from_num(grow_days),
            min_light: Fixed64::from_num(0.5),
            optimal_light: Fixed64::ONE,
            lifespan: 0,
            repeat_threshold: Fixed64::ZERO,
            max_units_per_cell: 1,
        }
    }

    fn env() -> Environment {
        Environment::temperate(&[CellPos::new(0, 0), CellPos::new(1, 0)], None)
    }

    #[test]
    fn delta_is_normalized_to_grow_days() {
        let cfg = EngineConfig {
            coarse_interval: 60_000,
            ..EngineConfig::default()
        };
        let model = GrowthModel::new(&cfg);
        let d = model.delta(Fixed64::ONE, Fixed64::ONE, &crop(10.0));
        let tenth = Fixed64::from_num(0.1);
        assert!((d - tenth).abs() < Fixed64::from_num(0.000_001));
    }

    #[test]
    fn delta_scales_with_fertility() {
        let cfg = EngineConfig::default();
        let model = GrowthModel::new(&cfg);
        let one = model.delta(Fixed64::ONE, Fixed64::ONE, &crop(5.0));
        let two = model.delta(Fixed64::from_num(2), Fixed64::ONE, &crop(5.0));
        assert!((two - one * 2).abs() <= Fixed64::from_bits(2));
    }

    #[test]
    fn ten_tenths_snap_to_one() {
        let mut g = Fixed64::ZERO;
        let step = Fixed64::from_num(0.1);
        for _ in 0..10 {
            g = GrowthModel::apply(g, step);
        }
        assert_eq!(g, Fixed64::ONE);
    }

    #[test]
    fn apply_clamps() {
        assert_eq!(
            GrowthModel::apply(Fixed64::from_num(0.9), Fixed64::from_num(0.5)),
            Fixed64::ONE
        );
        assert_eq!(
            GrowthModel::apply(Fixed64::from_num(0.25), Fixed64::ZERO),
            Fixed64::from_num(0.25)
        );
    }

    #[test]
    fn no_crop_blocks() {
        let cfg = EngineConfig::default();
        let r = GrowthModel::new(&cfg).compute(Fixed64::ONE, None, &env());
        assert_eq!(r.blocked, Some(GrowthBlock::NoCrop));
        assert_eq!(r.delta, Fixed64::ZERO);
        assert!(r.glow.is_none());
    }

    #[test]
    fn night_blocks_and_clears_glow() {
        let cfg = EngineConfig::default();
        let mut e = env();
        e.day_fraction = Fixed64::from_num(0.1);
        let r = GrowthModel::new(&cfg).compute(Fixed64::ONE, Some(&crop(5.0)), &e);
        assert_eq!(r.blocked, Some(GrowthBlock::Daylight));
        assert!(r.glow.is_none());
    }

    #[test]
    fn dim_light_halves_rate() {
        let cfg = EngineConfig::default();
        let mut e = env();
        for c in &mut e.cells {
            c.light = Fixed64::from_num(0.75);
        }
        let model = GrowthModel::new(&cfg);
        let r = model.compute(Fixed64::ONE, Some(&crop(5.0)), &e);
        assert_eq!(r.glow, Some(Fixed64::from_num(0.75)));
        let full = model.delta(Fixed64::ONE, Fixed64::ONE, &crop(5.0));
        assert!((r.delta * 2 - full).abs() <= Fixed64::from_bits(4));
    }

    #[test]
    fn light_requirement_off_ignores_darkness() {
        let cfg = EngineConfig {
            light_requirement: false,
            ..EngineConfig::default()
        };
        let mut e = env();
        for c in &mut e.cells {
            c.light = Fixed64::ZERO;
        }
        let r = GrowthModel::new(&cfg).compute(Fixed64::ONE, Some(&crop(5.0)), &e);
        assert!(r.delta > Fixed64::ZERO);
        assert!(r.glow.is_none());
    }

    #[test]
    fn expiry_respects_ageless() {
        let mut c = crop(5.0);
        assert!(!GrowthModel::expired(u64::MAX, &c));
        c.lifespan = 100;
        assert!(!GrowthModel::expired(100, &c));
        assert!(GrowthModel::expired(101, &c));
    }
}
