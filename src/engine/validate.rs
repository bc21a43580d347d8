//! Input validation - all-or-nothing, every field problem reported at once

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::engine::snapshot::{ConfigurationSnapshot, RegionKey};
use crate::engine::types::{
    Complexity, ConcreteGrade, ConstructionType, Feature, LaborAvailability, ProjectInput,
    QualityTier, RoofType, RoomComposition, SoilType, Weather,
};

pub const MIN_PLOT_AREA_SQFT: f64 = 100.0;
pub const MAX_PLOT_AREA_SQFT: f64 = 50_000.0;
pub const MIN_FLOORS: i32 = 1;
pub const MAX_FLOORS: i32 = 4;
/// Upper bound on any single room count
pub const MAX_ROOMS_PER_KIND: i32 = 50;

/// Machine-readable validation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    OutOfRange,
    InvalidFormat,
    UnknownLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>, code: ErrorCode) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
            code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &str, message: impl Into<String>, code: ErrorCode) {
        self.0.push(FieldError::new(field, message, code));
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        ValidationErrors(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Input that passed validation, with defaults resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProject {
    pub plot_area_sqft: f64,
    pub floors: u32,
    pub rooms: RoomComposition,
    pub quality: QualityTier,
    pub region: RegionKey,
    pub construction_type: ConstructionType,
    pub roof_type: RoofType,
    pub soil: SoilType,
    pub concrete_grade: ConcreteGrade,
    pub features: BTreeSet<Feature>,
    pub complexity: Complexity,
    pub weather: Weather,
    pub labor_availability: LaborAvailability,
    pub start_date: Option<NaiveDate>,
}

/// Complexity when the caller gives none: taller or feature-heavy builds are harder
pub fn derive_complexity(floors: u32, features: &BTreeSet<Feature>) -> Complexity {
    if floors >= 3 || features.len() >= 3 {
        Complexity::Complex
    } else if floors == 2 || !features.is_empty() {
        Complexity::Medium
    } else {
        Complexity::Simple
    }
}

pub fn validate_input(
    input: &ProjectInput,
    snapshot: &ConfigurationSnapshot,
) -> Result<ValidatedProject, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let plot_area_sqft = input.plot_area.in_sqft();
    if !input.plot_area.value.is_finite() || input.plot_area.value <= 0.0 {
        errors.push("plot_area", "must be a positive number", ErrorCode::OutOfRange);
    } else if !(MIN_PLOT_AREA_SQFT..=MAX_PLOT_AREA_SQFT).contains(&plot_area_sqft) {
        errors.push(
            "plot_area",
            format!(
                "{:.0} sq.ft is outside {}-{} sq.ft",
                plot_area_sqft, MIN_PLOT_AREA_SQFT, MAX_PLOT_AREA_SQFT
            ),
            ErrorCode::OutOfRange,
        );
    }

    if !(MIN_FLOORS..=MAX_FLOORS).contains(&input.floors) {
        errors.push(
            "floors",
            format!("must be between {} and {}", MIN_FLOORS, MAX_FLOORS),
            ErrorCode::OutOfRange,
        );
    }

    let rooms = [
        ("rooms.bedrooms", input.rooms.bedrooms),
        ("rooms.bathrooms", input.rooms.bathrooms),
        ("rooms.kitchens", input.rooms.kitchens),
        ("rooms.living", input.rooms.living),
        ("rooms.other", input.rooms.other),
    ];
    for (field, count) in rooms {
        if count < 0 {
            errors.push(field, "must not be negative", ErrorCode::OutOfRange);
        } else if count > MAX_ROOMS_PER_KIND {
            errors.push(
                field,
                format!("must be at most {}", MAX_ROOMS_PER_KIND),
                ErrorCode::OutOfRange,
            );
        }
    }

    let state_code = input.location.state_code.trim();
    let city = input.location.city.trim();
    let mut location_ok = true;
    if state_code.is_empty() {
        errors.push("location.state_code", "is required", ErrorCode::Required);
        location_ok = false;
    } else if !(2..=3).contains(&state_code.len())
        || !state_code.chars().all(|c| c.is_ascii_alphabetic())
    {
        errors.push(
            "location.state_code",
            "must be a 2-3 letter state code",
            ErrorCode::InvalidFormat,
        );
        location_ok = false;
    }
    if city.is_empty() {
        errors.push("location.city", "is required", ErrorCode::Required);
        location_ok = false;
    }

    let region = RegionKey::from(&input.location);
    if location_ok && !snapshot.has_region(&region) {
        errors.push(
            "location",
            format!("no pricing data for {}", region),
            ErrorCode::UnknownLocation,
        );
    }

    if !errors.is_empty() {
        debug!("Rejected project input: {}", errors);
        return Err(errors);
    }

    let floors = input.floors as u32;
    let complexity = input
        .site
        .complexity
        .unwrap_or_else(|| derive_complexity(floors, &input.features));

    Ok(ValidatedProject {
        plot_area_sqft,
        floors,
        rooms: input.rooms,
        quality: input.quality,
        region,
        construction_type: input.construction_type.unwrap_or_default(),
        roof_type: input.roof_type.unwrap_or_default(),
        soil: input.soil.unwrap_or_default(),
        concrete_grade: input
            .concrete_grade
            .unwrap_or_else(|| ConcreteGrade::for_quality(input.quality)),
        features: input.features.clone(),
        complexity,
        weather: input.site.weather,
        labor_availability: input.site.labor_availability,
        start_date: input.start_date,
    })
}
