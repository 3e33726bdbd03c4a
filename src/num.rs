//! Exact decimal arithmetic helpers.
//!
//! All price and quantity math in the engine flows through
//! `rust_decimal::Decimal`. Addition, subtraction, multiplication and
//! comparison are total on `Decimal`; the helpers here cover the two
//! places where care is needed: division (explicit result scale,
//! checked zero divisor) and aggregate means over possibly-empty
//! windows.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ArithmeticError;

/// Result scale used when the caller does not ask for one.
///
/// 12 fractional digits is ample for crypto price/qty precision and
/// keeps repeated divisions (EMA chains) stable.
pub const DEFAULT_SCALE: u32 = 12;

/// Checked division at [`DEFAULT_SCALE`].
pub fn div(a: Decimal, b: Decimal) -> Result<Decimal, ArithmeticError> {
    div_scaled(a, b, DEFAULT_SCALE)
}

/// Checked division with an explicit result scale.
///
/// Rounds half-away-from-zero at `scale`; never silently degrades to
/// binary float precision.
pub fn div_scaled(a: Decimal, b: Decimal, scale: u32) -> Result<Decimal, ArithmeticError> {
    a.checked_div(b)
        .map(|q| q.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(ArithmeticError::DivisionByZero)
}

/// Arithmetic mean of a window. `None` on an empty window.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    div(sum, Decimal::from(values.len())).ok()
}

/// Clamp `v` into `[lo, hi]`.
pub fn clamp(v: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    v.max(lo).min(hi)
}
