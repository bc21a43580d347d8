//! Utility functions for rounding and unit conversion

use rust_decimal::{Decimal, RoundingStrategy};

use crate::engine::error::{EstimateError, Result};

pub const CUFT_PER_M3: f64 = 35.314_666_7;

/// Absorbs float noise such as 510.0000000001 before rounding up
const CEIL_TOLERANCE: f64 = 1e-9;

/// Round a continuous quantity up to whole units, never down
pub fn ceil_units(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // Only noise just above a whole number is absorbed; anything below rounds up
    let floor = value.floor();
    if floor > 0.0 && value - floor < CEIL_TOLERANCE {
        floor as u64
    } else {
        value.ceil() as u64
    }
}

pub fn cuft_to_m3(cuft: f64) -> f64 {
    cuft / CUFT_PER_M3
}

/// Round to the smallest currency unit
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a measured quantity into a Decimal with 4 places
pub fn decimal_from_f64(value: f64) -> Result<Decimal> {
    Decimal::try_from(value)
        .map(|d| d.round_dp(4))
        .map_err(|_| EstimateError::InvalidGeometry(format!("{} is not representable", value)))
}

/// Split `total` into `parts` money amounts; the last absorbs rounding
pub fn split_evenly(total: Decimal, parts: u32) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }
    let share = round_money(total / Decimal::from(parts));
    let mut amounts = vec![share; parts as usize];
    let assigned = share * Decimal::from(parts - 1);
    amounts[parts as usize - 1] = total - assigned;
    amounts
}
