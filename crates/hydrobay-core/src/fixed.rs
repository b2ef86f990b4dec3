use fixed::types::{I32F32, I64F64};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Q64.64 fixed-point for tick-scale projections that overflow Q32.32.
pub type Wide = I64F64;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp a value to the unit interval [0, 1].
#[inline]
pub fn clamp01(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Widen a Fixed64 for projection math. Lossless.
#[inline]
pub fn widen(v: Fixed64) -> Wide {
    Wide::from_num(v)
}
