//! Fixed-point currency helpers.
//!
//! Amounts stay exact `Decimal` sums internally; rounding to cents happens
//! only at presentation and submission boundaries, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Sales tax applied to every cart.
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Round to two decimal places, halves away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount as `$12.34`.
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", round2(amount))
}
