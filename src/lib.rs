// Library module for testable functions

pub mod engine;
pub mod history;

use rust_decimal::Decimal;

use crate::engine::utils::{decimal_from_f64, round_money};

/// Calculate cost per square foot of built-up area
/// Formula: total / built_up_area, rounded to the smallest currency unit
pub fn calculate_cost_per_sqft(total: Decimal, built_up_area: f64) -> Option<Decimal> {
    if !built_up_area.is_finite() || built_up_area <= 0.0 {
        return None;
    }
    let area = decimal_from_f64(built_up_area).ok()?;
    if area.is_zero() {
        return None;
    }
    Some(round_money(total / area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cost_per_sqft_calculation() {
        let rate = calculate_cost_per_sqft(dec!(3600000), 1800.0);
        assert_eq!(rate, Some(dec!(2000)));
    }

    #[test]
    fn test_cost_per_sqft_rounds_to_cents() {
        // 1000 / 3 = 333.333...
        let rate = calculate_cost_per_sqft(dec!(1000), 3.0);
        assert_eq!(rate, Some(dec!(333.33)));
    }

    #[test]
    fn test_cost_per_sqft_zero_area() {
        assert!(calculate_cost_per_sqft(dec!(1000), 0.0).is_none());
    }

    #[test]
    fn test_cost_per_sqft_negative_area() {
        assert!(calculate_cost_per_sqft(dec!(1000), -50.0).is_none());
    }

    #[test]
    fn test_cost_per_sqft_non_finite_area() {
        assert!(calculate_cost_per_sqft(dec!(1000), f64::NAN).is_none());
        assert!(calculate_cost_per_sqft(dec!(1000), f64::INFINITY).is_none());
    }
}
