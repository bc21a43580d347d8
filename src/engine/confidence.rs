//! Confidence scoring - how far the estimate can be trusted
//!
//! The score blends input completeness, freshness of the regional pricing
//! data and market stability into an integer between 40 and 95.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::engine::types::{ConfidenceFactor, ConfidenceScore, ProjectInput, Reliability};

pub const COMPLETENESS_WEIGHT: f64 = 0.4;
pub const REGIONAL_DATA_WEIGHT: f64 = 0.3;
pub const MARKET_WEIGHT: f64 = 0.3;

pub const MIN_SCORE: u8 = 40;
pub const MAX_SCORE: u8 = 95;

pub const FRESH_WITHIN_DAYS: i64 = 30;
pub const STALE_AFTER_DAYS: i64 = 90;

/// Share of the optional project facts the caller actually supplied
pub fn input_completeness(input: &ProjectInput) -> f64 {
    let supplied = [
        input.construction_type.is_some(),
        input.roof_type.is_some(),
        input.soil.is_some(),
        input.site.complexity.is_some(),
        input.start_date.is_some(),
        input.rooms.total() > 0,
    ];
    let given = supplied.iter().filter(|s| **s).count();
    given as f64 / supplied.len() as f64
}

pub fn data_age_days(last_updated: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    (as_of - last_updated).num_days().max(0)
}

/// 1.0 for recent regional data, tapering to 0.5 once stale
pub fn regional_data_quality(last_updated: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let age = data_age_days(last_updated, as_of);
    if age <= FRESH_WITHIN_DAYS {
        1.0
    } else if age <= STALE_AFTER_DAYS {
        0.8
    } else {
        warn!("Regional pricing data is {} days old", age);
        0.5
    }
}

/// Half-width of the variance range as a fraction of the total
pub fn variance_ratio(score: u8) -> Decimal {
    Decimal::from(100 - score.min(100)) / Decimal::from(200)
}

fn describe_completeness(value: f64) -> String {
    format!(
        "{:.0}% of optional project details supplied",
        value * 100.0
    )
}

fn describe_regional(value: f64) -> String {
    if value >= 1.0 {
        "regional pricing updated within the last month".to_string()
    } else if value >= 0.8 {
        "regional pricing is one to three months old".to_string()
    } else {
        "regional pricing is stale (older than three months)".to_string()
    }
}

fn describe_market(volatility: f64) -> String {
    if volatility <= 0.2 {
        format!("stable market (volatility {:.2})", volatility)
    } else if volatility <= 0.5 {
        format!("moderately volatile market (volatility {:.2})", volatility)
    } else {
        format!("highly volatile market (volatility {:.2})", volatility)
    }
}

/// All three inputs are 0.0-1.0; out-of-range values are clamped
pub fn estimate_confidence(
    input_completeness: f64,
    regional_data_quality: f64,
    market_volatility: f64,
) -> ConfidenceScore {
    let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let completeness = clamp(input_completeness);
    let regional = clamp(regional_data_quality);
    // an unknown market is treated as fully volatile
    let volatility = if market_volatility.is_finite() {
        market_volatility.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let stability = 1.0 - volatility;

    let raw = 100.0
        * (COMPLETENESS_WEIGHT * completeness
            + REGIONAL_DATA_WEIGHT * regional
            + MARKET_WEIGHT * stability);
    let score = (raw.round() as u8).clamp(MIN_SCORE, MAX_SCORE);

    debug!(
        "Confidence {} (raw {:.2}): completeness {:.2}, regional {:.2}, volatility {:.2}",
        score, raw, completeness, regional, volatility
    );

    ConfidenceScore {
        score,
        reliability: Reliability::from_score(score),
        factors: vec![
            ConfidenceFactor {
                name: "input_completeness".to_string(),
                weight: COMPLETENESS_WEIGHT,
                value: completeness,
                explanation: describe_completeness(completeness),
            },
            ConfidenceFactor {
                name: "regional_data_quality".to_string(),
                weight: REGIONAL_DATA_WEIGHT,
                value: regional,
                explanation: describe_regional(regional),
            },
            ConfidenceFactor {
                name: "market_stability".to_string(),
                weight: MARKET_WEIGHT,
                value: stability,
                explanation: describe_market(volatility),
            },
        ],
        variance_ratio: variance_ratio(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::sample_input;
    use crate::engine::types::{Complexity, RoofType};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(estimate_confidence(0.0, 0.0, 1.0).score, MIN_SCORE);
        assert_eq!(estimate_confidence(1.0, 1.0, 0.0).score, MAX_SCORE);
        assert_eq!(estimate_confidence(f64::NAN, 2.0, -1.0).score, 60);
    }

    #[test]
    fn test_weighted_blend() {
        // 100 x (0.4 + 0.3 + 0.3 x 0.8) = 94
        let confidence = estimate_confidence(1.0, 1.0, 0.2);
        assert_eq!(confidence.score, 94);
        assert_eq!(confidence.reliability, Reliability::High);
        assert_eq!(confidence.variance_ratio, dec!(0.03));
        assert_eq!(confidence.factors.len(), 3);
    }

    #[test]
    fn test_reliability_thresholds() {
        assert_eq!(Reliability::from_score(80), Reliability::High);
        assert_eq!(Reliability::from_score(79), Reliability::Medium);
        assert_eq!(Reliability::from_score(65), Reliability::Medium);
        assert_eq!(Reliability::from_score(64), Reliability::Low);
    }

    #[test]
    fn test_label_never_improves_as_score_drops() {
        let mut previous = Reliability::High;
        for completeness in (0..=10).rev() {
            let c = estimate_confidence(completeness as f64 / 10.0, 0.8, 0.3);
            assert!(c.reliability <= previous);
            previous = c.reliability;
        }
    }

    #[test]
    fn test_variance_ratio() {
        assert_eq!(variance_ratio(40), dec!(0.3));
        assert_eq!(variance_ratio(95), dec!(0.025));
    }

    #[test]
    fn test_regional_data_freshness() {
        let as_of = day(2026, 10, 1);

        assert_eq!(regional_data_quality(day(2026, 9, 15), as_of), 1.0);
        assert_eq!(regional_data_quality(day(2026, 8, 1), as_of), 0.8);
        assert_eq!(regional_data_quality(day(2026, 3, 1), as_of), 0.5);
        // data dated after the reference point counts as fresh
        assert_eq!(regional_data_quality(day(2026, 10, 5), as_of), 1.0);
    }

    #[test]
    fn test_input_completeness() {
        let mut input = sample_input();
        // soil and rooms supplied
        assert!((input_completeness(&input) - 2.0 / 6.0).abs() < 1e-12);

        input.roof_type = Some(RoofType::Sloped);
        input.site.complexity = Some(Complexity::Simple);
        input.start_date = NaiveDate::from_ymd_opt(2027, 1, 1);
        input.construction_type = Some(Default::default());
        assert_eq!(input_completeness(&input), 1.0);
    }
}
