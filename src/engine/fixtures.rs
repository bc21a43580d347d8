//! Shared test data: the sample snapshot and a typical two-storey project

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;

use crate::engine::snapshot::ConfigurationSnapshot;
use crate::engine::types::{
    Location, PlotArea, ProjectInput, QualityTier, RoomComposition, SiteConditions, SoilType,
};

const SAMPLE_SNAPSHOT: &str = include_str!("../../config/snapshot.sample.json");

pub fn sample_snapshot() -> ConfigurationSnapshot {
    ConfigurationSnapshot::from_json(SAMPLE_SNAPSHOT).expect("sample snapshot parses")
}

/// 1200 sq.ft plot, two floors, standard quality in Bengaluru
pub fn sample_input() -> ProjectInput {
    ProjectInput {
        plot_area: PlotArea::sqft(1200.0),
        floors: 2,
        rooms: RoomComposition {
            bedrooms: 3,
            bathrooms: 2,
            kitchens: 1,
            living: 1,
            other: 1,
        },
        quality: QualityTier::Standard,
        location: Location {
            state_code: "KA".to_string(),
            city: "Bengaluru".to_string(),
        },
        construction_type: None,
        roof_type: None,
        soil: Some(SoilType::Medium),
        concrete_grade: None,
        features: BTreeSet::new(),
        site: SiteConditions::default(),
        start_date: None,
    }
}

pub fn calculated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}
