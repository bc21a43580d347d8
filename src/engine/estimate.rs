//! End-to-end estimate: validate -> geometry -> quantities -> costs ->
//! timeline -> cash flow -> confidence
//!
//! The numeric result depends only on the project input and the snapshot.
//! `calculated_at` and `valid_until` are report metadata.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculate_cost_per_sqft;
use crate::engine::cashflow::project_cash_flow;
use crate::engine::confidence::{estimate_confidence, input_completeness, regional_data_quality};
use crate::engine::cost::{compose_costs, CostRequest};
use crate::engine::error::Result;
use crate::engine::geometry::resolve_geometry;
use crate::engine::quantity::{estimate_quantities, feature_quantities, formula_inputs};
use crate::engine::snapshot::ConfigurationSnapshot;
use crate::engine::timeline::{allocate_costs, estimate_timeline, ScheduleFactors};
use crate::engine::types::{
    CashFlowMonth, ConfidenceFactor, CostBreakdown, CostLine, Geometry, MaterialQuantities,
    ProjectInput, Reliability, Timeline,
};
use crate::engine::utils::round_money;
use crate::engine::validate::validate_input;

/// Days an estimate stays valid after it is calculated
pub const VALIDITY_DAYS: i64 = 30;

pub const DISCLAIMER: &str = "This is a preliminary estimate based on standard construction \
practices and current market rates. Actual costs may vary with site conditions, design changes, \
material availability and contractor pricing. Obtain detailed quotations before committing to \
construction.";

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationOptions {
    pub include_contingency: bool,
    /// Reference time for data freshness; the snapshot's publication time when unset
    pub as_of: Option<DateTime<Utc>>,
    pub calculated_at: DateTime<Utc>,
}

impl CalculationOptions {
    pub fn new(calculated_at: DateTime<Utc>) -> Self {
        CalculationOptions {
            include_contingency: false,
            as_of: None,
            calculated_at,
        }
    }

    pub fn with_contingency(mut self, include: bool) -> Self {
        self.include_contingency = include;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceRange {
    pub low: Decimal,
    pub high: Decimal,
}

impl VarianceRange {
    pub fn around(total: Decimal, ratio: Decimal) -> Self {
        VarianceRange {
            low: round_money(total * (Decimal::ONE - ratio)),
            high: round_money(total * (Decimal::ONE + ratio)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub score: u8,
    pub reliability: Reliability,
    pub factors: Vec<ConfidenceFactor>,
    pub variance_ratio: Decimal,
    pub variance_range: VarianceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub total_cost: Decimal,
    pub cost_per_sqft: Decimal,
    pub currency: String,
    pub geometry: Geometry,
    pub quantities: MaterialQuantities,
    pub breakdown: CostBreakdown,
    pub timeline: Timeline,
    pub cash_flow: Vec<CashFlowMonth>,
    pub confidence: ConfidenceReport,
    pub snapshot_version: String,
    pub calculated_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub disclaimer: String,
}

impl EstimateReport {
    /// Material and feature lines with quantity, unit, quality and specification
    pub fn materials(&self) -> &[CostLine] {
        &self.breakdown.lines
    }

    /// Equal in everything but the report metadata timestamps
    pub fn same_result(&self, other: &EstimateReport) -> bool {
        let mut this = self.clone();
        this.calculated_at = other.calculated_at;
        this.valid_until = other.valid_until;
        this == *other
    }
}

pub fn calculate_estimate(
    input: &ProjectInput,
    snapshot: &ConfigurationSnapshot,
    options: &CalculationOptions,
) -> Result<EstimateReport> {
    snapshot.validate()?;
    let project = validate_input(input, snapshot)?;
    let region = snapshot.region(&project.region)?;

    info!(
        "Estimating {} sq.ft x {} floors ({}) in {} against snapshot {}",
        project.plot_area_sqft, project.floors, project.quality, project.region, snapshot.version
    );

    let geometry = resolve_geometry(
        project.plot_area_sqft,
        project.floors,
        project.soil,
        project.construction_type,
    )?;
    let quantities = estimate_quantities(
        &geometry,
        project.concrete_grade,
        region.seismic_zone,
        &project.rooms,
    )?;
    let features = feature_quantities(
        &project.features,
        snapshot,
        &formula_inputs(&geometry, &project.rooms),
    )?;

    let breakdown = compose_costs(
        &CostRequest {
            quantities: &quantities,
            features: &features,
            built_up_area: geometry.built_up_area,
            quality: project.quality,
            region: &project.region,
            season_factor: snapshot.season_factor()?,
            demand_index: snapshot.demand_index()?,
            include_contingency: options.include_contingency,
        },
        snapshot,
    )?;
    assert_eq!(
        breakdown.grand_total,
        breakdown.category_sum(),
        "grand total must equal the sum of its categories"
    );
    assert_eq!(
        breakdown.grand_total,
        breakdown.leaf_sum(),
        "grand total must equal the sum of its leaves"
    );

    let mut timeline = estimate_timeline(
        geometry.built_up_area,
        &ScheduleFactors {
            complexity: project.complexity,
            weather: project.weather,
            labor_availability: project.labor_availability,
            roof_type: project.roof_type,
        },
    );
    allocate_costs(&mut timeline, breakdown.grand_total);
    assert_eq!(
        timeline.allocated_cost(),
        breakdown.grand_total,
        "phase allocations must equal the grand total"
    );

    let cash_flow = project_cash_flow(&timeline, project.start_date);

    let as_of = options.as_of.unwrap_or(snapshot.published_at);
    let volatility = snapshot.market.volatility.to_f64().unwrap_or(1.0);
    let confidence = estimate_confidence(
        input_completeness(input),
        regional_data_quality(region.last_updated, as_of),
        volatility,
    );

    let total_cost = breakdown.grand_total;
    let cost_per_sqft =
        calculate_cost_per_sqft(total_cost, geometry.built_up_area).unwrap_or(Decimal::ZERO);

    info!(
        "Estimate complete: {} {} ({} per sq.ft), {} days, confidence {} ({:?})",
        total_cost,
        snapshot.currency,
        cost_per_sqft,
        timeline.total_days,
        confidence.score,
        confidence.reliability
    );

    Ok(EstimateReport {
        total_cost,
        cost_per_sqft,
        currency: snapshot.currency.clone(),
        geometry,
        quantities,
        breakdown,
        timeline,
        cash_flow,
        confidence: ConfidenceReport {
            score: confidence.score,
            reliability: confidence.reliability,
            variance_range: VarianceRange::around(total_cost, confidence.variance_ratio),
            variance_ratio: confidence.variance_ratio,
            factors: confidence.factors,
        },
        snapshot_version: snapshot.version.clone(),
        calculated_at: options.calculated_at,
        valid_until: options.calculated_at + Duration::days(VALIDITY_DAYS),
        disclaimer: DISCLAIMER.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EstimateError;
    use crate::engine::fixtures::{calculated_at, sample_input, sample_snapshot};
    use crate::engine::types::{Feature, LineItem, Location, Phase, PlotArea};
    use crate::engine::validate::ErrorCode;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn run(input: &ProjectInput) -> Result<EstimateReport> {
        calculate_estimate(input, &sample_snapshot(), &CalculationOptions::new(calculated_at()))
    }

    #[test]
    fn test_sample_estimate() {
        let report = run(&sample_input()).unwrap();

        assert_eq!(report.geometry.built_up_area, 1800.0);
        assert_eq!(report.snapshot_version, "2026.10.1");
        assert_eq!(report.currency, "INR");
        assert!(report.total_cost > Decimal::ZERO);
        assert_eq!(report.materials().len(), 9);
        assert_eq!(report.timeline.phases[0].phase, Phase::Planning);
        assert_eq!(report.cash_flow[0].label, "Month 1");
        assert_eq!(report.disclaimer, DISCLAIMER);
    }

    #[test]
    fn test_totals_are_consistent() {
        let report = run(&sample_input()).unwrap();
        let breakdown = &report.breakdown;

        assert_eq!(report.total_cost, breakdown.category_sum());
        assert_eq!(report.total_cost, report.timeline.allocated_cost());
        assert_eq!(
            report.cash_flow.iter().map(|m| m.amount).sum::<Decimal>(),
            report.total_cost
        );
        assert_eq!(
            report.cost_per_sqft,
            round_money(report.total_cost / dec!(1800))
        );
    }

    #[test]
    fn test_identical_inputs_identical_results() {
        let snapshot = sample_snapshot();
        let first = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at()),
        )
        .unwrap();
        let second = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at() + Duration::hours(5)),
        )
        .unwrap();

        assert_eq!(first.total_cost, second.total_cost);
        assert_eq!(first.timeline, second.timeline);
        assert!(first.same_result(&second));
        assert_ne!(first.calculated_at, second.calculated_at);
    }

    #[test]
    fn test_invalid_plot_area_never_yields_numbers() {
        for area in [-100.0, 0.0] {
            let mut input = sample_input();
            input.plot_area = PlotArea::sqft(area);

            match run(&input) {
                Err(EstimateError::Validation(errors)) => {
                    assert!(errors.has_field("plot_area"));
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_absurd_room_count_is_rejected_not_priced() {
        let mut input = sample_input();
        input.rooms.bedrooms = 300_000_000;

        match run(&input) {
            Err(EstimateError::Validation(errors)) => {
                assert!(errors.has_field("rooms.bedrooms"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_location_is_a_user_error() {
        let mut input = sample_input();
        input.location = Location {
            state_code: "TN".to_string(),
            city: "Chennai".to_string(),
        };

        let err = run(&input).unwrap_err();
        assert!(!err.is_internal());
        match err {
            EstimateError::Validation(errors) => {
                assert_eq!(errors.iter().next().unwrap().code, ErrorCode::UnknownLocation);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_snapshot_is_an_internal_error() {
        let mut snapshot = sample_snapshot();
        snapshot.regions[0]
            .material_multipliers
            .insert(crate::engine::types::Material::Cement, dec!(4.0));

        let err = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at()),
        )
        .unwrap_err();

        // rejected by the integrity audit before any pricing happens
        assert!(err.is_internal());
        match err {
            EstimateError::OutOfRangeMultiplier { name, value, .. } => {
                assert_eq!(name, "regions.KA/bengaluru.cement");
                assert_eq!(value, dec!(4.0));
            }
            other => panic!("expected OutOfRangeMultiplier, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_snapshot_entry_is_a_configuration_gap() {
        let mut snapshot = sample_snapshot();
        snapshot.labor_rates.remove(&crate::engine::types::LaborSkill::Skilled);

        let err = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at()),
        )
        .unwrap_err();

        assert!(err.is_internal());
        assert!(matches!(err, EstimateError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_contingency_is_optional() {
        let snapshot = sample_snapshot();
        let without = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at()),
        )
        .unwrap();
        let with = calculate_estimate(
            &sample_input(),
            &snapshot,
            &CalculationOptions::new(calculated_at()).with_contingency(true),
        )
        .unwrap();

        assert_eq!(without.breakdown.contingency, None);
        let contingency = with.breakdown.contingency.unwrap();
        assert_eq!(with.total_cost, without.total_cost + contingency);
    }

    #[test]
    fn test_confidence_and_variance() {
        let report = run(&sample_input()).unwrap();
        let confidence = &report.confidence;

        // 100 x (0.4 x 2/6 + 0.3 x 1.0 + 0.3 x 0.8) = 67.3
        assert_eq!(confidence.score, 67);
        assert_eq!(confidence.reliability, Reliability::Medium);
        assert_eq!(confidence.variance_ratio, dec!(0.165));
        assert!(confidence.variance_range.low < report.total_cost);
        assert!(confidence.variance_range.high > report.total_cost);
    }

    #[test]
    fn test_stale_region_lowers_confidence() {
        let mut input = sample_input();
        input.location = Location {
            state_code: "UK".to_string(),
            city: "Dehradun".to_string(),
        };

        let report = run(&input).unwrap();
        // regional quality 0.5: 13.3 + 15 + 24
        assert_eq!(report.confidence.score, 52);
        assert_eq!(report.confidence.reliability, Reliability::Low);
    }

    #[test]
    fn test_as_of_overrides_snapshot_date() {
        let options = CalculationOptions {
            as_of: Some(calculated_at() + Duration::days(365)),
            ..CalculationOptions::new(calculated_at())
        };
        let report = calculate_estimate(&sample_input(), &sample_snapshot(), &options).unwrap();

        assert!(report.confidence.score < 67);
    }

    #[test]
    fn test_validity_window() {
        let report = run(&sample_input()).unwrap();
        assert_eq!(report.valid_until - report.calculated_at, Duration::days(30));
    }

    #[test]
    fn test_features_add_lines() {
        let mut input = sample_input();
        input.features.insert(Feature::SolarPanels);
        input.features.insert(Feature::RainwaterHarvesting);

        let plain = run(&sample_input()).unwrap();
        let report = run(&input).unwrap();

        assert_eq!(report.materials().len(), 11);
        assert!(report
            .materials()
            .iter()
            .any(|l| l.item == LineItem::Feature(Feature::SolarPanels)));
        assert!(report.breakdown.materials.mep > plain.breakdown.materials.mep);
    }

    #[test]
    fn test_start_date_gives_calendar_months() {
        let mut input = sample_input();
        input.start_date = NaiveDate::from_ymd_opt(2027, 1, 10);

        let report = run(&input).unwrap();
        assert_eq!(report.cash_flow[0].label, "2027-01");
        assert_eq!(
            report.cash_flow.iter().map(|m| m.amount).sum::<Decimal>(),
            report.total_cost
        );
    }
}
