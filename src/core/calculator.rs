//! Precise decimal arithmetic for balance mutations
//!
//! Every balance change goes through [`precise_add`], which adds in decimal
//! (never binary floating point) and rounds to a fixed number of places, so
//! that a series of transfers with zero net movement restores the exact
//! original balance.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept after every balance mutation
pub const PRECISION_DP: u32 = 6;

/// Add two amounts and round the sum to [`PRECISION_DP`] places
///
/// Midpoints round away from zero. Pass a negated amount to subtract.
///
/// # Returns
///
/// * `Some(sum)` - The rounded sum
/// * `None` - If the sum leaves the representable decimal range
pub fn precise_add(first: Decimal, second: Decimal) -> Option<Decimal> {
    first.checked_add(second).map(round_to_precision)
}

/// Round to [`PRECISION_DP`] places, midpoints away from zero
pub fn round_to_precision(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `value` has no significant digits past [`PRECISION_DP`] places
///
/// Trailing zeros do not count, so `0.1000000` fits.
pub fn fits_precision(value: Decimal) -> bool {
    value.normalize().scale() <= PRECISION_DP
}
