use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Scores, probabilities, temperatures and multipliers all use this type so
/// that quality derivation is bit-identical on every platform.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for content loading, never per tick.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Checked conversion for values read from outside the program. `None` for
/// NaN, infinities and anything outside the Q32.32 range.
#[inline]
pub fn try_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    if v.is_finite() {
        Fixed64::checked_from_num(v)
    } else {
        None
    }
}

/// Convert Fixed64 to f64. Use only for display and persisted records.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `num / den` as a fixed-point fraction. A zero denominator yields zero.
#[inline]
pub fn ratio(num: u64, den: u64) -> Fixed64 {
    if den == 0 {
        return Fixed64::ZERO;
    }
    Fixed64::from_num(num) / Fixed64::from_num(den)
}

/// Clamp a value into `[0, 1]`.
#[inline]
pub fn clamp_unit(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::from_num(1))
}
