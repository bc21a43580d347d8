//! Quantity estimation - material quantities from structural volumes
//!
//! Every quantity is rounded up to whole ordering units so materials are
//! never under-ordered. Concrete and mortar volumes are carried in cubic
//! metres because cement factors are quoted per m3.

use std::collections::BTreeSet;
use tracing::debug;

use crate::engine::error::{EstimateError, Result};
use crate::engine::formula::{FormulaInputs, Variable};
use crate::engine::snapshot::ConfigurationSnapshot;
use crate::engine::types::{
    ConcreteGrade, Feature, Geometry, MaterialQuantities, RoomComposition, SeismicZone,
    StructuralVolumes, WallAreas,
};
use crate::engine::utils::{ceil_units, cuft_to_m3};

pub const MORTAR_CEMENT_BAGS_PER_M3: f64 = 5.5;

pub const WALL_HEIGHT_FT: f64 = 10.0;
pub const OPENING_FRACTION: f64 = 0.20;
pub const EXTERNAL_WALL_SHARE: f64 = 0.60;

// 9" external walls, 4.5" partitions
const EXTERNAL_BRICKS_PER_SQFT: f64 = 10.8;
const INTERNAL_BRICKS_PER_SQFT: f64 = 5.4;
const EXTERNAL_WALL_THICKNESS_FT: f64 = 0.75;
const INTERNAL_WALL_THICKNESS_FT: f64 = 0.375;

const MORTAR_SHARE_OF_BRICKWORK: f64 = 0.25;
const SAND_PER_WALL_CUFT: f64 = 0.45;
const AGGREGATE_PER_CONCRETE_CUFT: f64 = 0.9;

/// Two coats
const PAINT_SQFT_PER_LITRE: f64 = 50.0;

/// Cement bags = ceil(concrete x grade factor + mortar x 5.5)
pub fn cement_bags(concrete_m3: f64, mortar_m3: f64, grade: ConcreteGrade) -> u64 {
    ceil_units(concrete_m3 * grade.cement_factor() + mortar_m3 * MORTAR_CEMENT_BAGS_PER_M3)
}

/// Steel = sum of element volume x element factor, scaled by seismic zone
pub fn steel_kg(volumes: &StructuralVolumes, zone: SeismicZone) -> u64 {
    let base: f64 = volumes
        .elements()
        .iter()
        .map(|(element, cuft)| cuft_to_m3(*cuft) * element.steel_factor())
        .sum();
    ceil_units(base * zone.steel_multiplier())
}

/// Wall areas from a square-root perimeter heuristic
pub fn wall_areas(built_up_area: f64, floors: u32) -> WallAreas {
    let perimeter = 4.0 * built_up_area.sqrt();
    let gross = perimeter * WALL_HEIGHT_FT * floors as f64;
    let net = gross * (1.0 - OPENING_FRACTION);
    let external = net * EXTERNAL_WALL_SHARE;
    let internal = net - external;

    WallAreas {
        gross,
        net,
        external,
        internal,
        volume: external * EXTERNAL_WALL_THICKNESS_FT + internal * INTERNAL_WALL_THICKNESS_FT,
    }
}

pub fn brick_count(walls: &WallAreas) -> u64 {
    ceil_units(
        walls.external * EXTERNAL_BRICKS_PER_SQFT + walls.internal * INTERNAL_BRICKS_PER_SQFT,
    )
}

/// Negative counts never reach here after validation; treat them as none
fn room_count(count: i32) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

pub fn electrical_points(rooms: &RoomComposition) -> u64 {
    room_count(rooms.bedrooms) * 8
        + room_count(rooms.bathrooms) * 3
        + room_count(rooms.kitchens) * 10
        + room_count(rooms.living) * 12
        + room_count(rooms.other) * 5
}

/// Wet points per room plus the main supply and overhead tank connections
pub fn plumbing_points(rooms: &RoomComposition) -> u64 {
    room_count(rooms.bathrooms) * 6 + room_count(rooms.kitchens) * 3 + 2
}

fn check_volumes(geometry: &Geometry) -> Result<()> {
    let valid = geometry.built_up_area.is_finite()
        && geometry.built_up_area > 0.0
        && geometry
            .volumes
            .elements()
            .iter()
            .all(|(_, v)| v.is_finite() && *v >= 0.0);
    if valid {
        Ok(())
    } else {
        Err(EstimateError::InvalidGeometry(format!(
            "unusable volumes {:?} for built-up area {}",
            geometry.volumes, geometry.built_up_area
        )))
    }
}

pub fn estimate_quantities(
    geometry: &Geometry,
    grade: ConcreteGrade,
    zone: SeismicZone,
    rooms: &RoomComposition,
) -> Result<MaterialQuantities> {
    check_volumes(geometry)?;

    let concrete_cuft = geometry.volumes.total();
    let concrete_m3 = cuft_to_m3(concrete_cuft);
    let walls = wall_areas(geometry.built_up_area, geometry.floors);
    let mortar_m3 = cuft_to_m3(walls.volume * MORTAR_SHARE_OF_BRICKWORK);
    let painted_area = 2.0 * walls.net + geometry.carpet_area;

    let quantities = MaterialQuantities {
        cement_bags: cement_bags(concrete_m3, mortar_m3, grade),
        steel_kg: steel_kg(&geometry.volumes, zone),
        bricks: brick_count(&walls),
        sand_cuft: ceil_units(walls.volume * SAND_PER_WALL_CUFT),
        aggregate_cuft: ceil_units(concrete_cuft * AGGREGATE_PER_CONCRETE_CUFT),
        tiles_sqft: ceil_units(geometry.carpet_area),
        paint_litres: ceil_units(painted_area / PAINT_SQFT_PER_LITRE),
        electrical_points: electrical_points(rooms),
        plumbing_points: plumbing_points(rooms),
        concrete_m3,
        mortar_m3,
        walls,
    };

    debug!(
        "Estimated quantities: {} bags cement, {} kg steel, {} bricks",
        quantities.cement_bags, quantities.steel_kg, quantities.bricks
    );

    Ok(quantities)
}

/// Variable bindings for snapshot-defined formulas
pub fn formula_inputs(geometry: &Geometry, rooms: &RoomComposition) -> FormulaInputs {
    FormulaInputs::new()
        .with(Variable::PlotArea, geometry.plot_area_sqft)
        .with(Variable::BuiltUpArea, geometry.built_up_area)
        .with(Variable::CarpetArea, geometry.carpet_area)
        .with(Variable::OpenArea, geometry.open_area())
        .with(Variable::Floors, geometry.floors as f64)
        .with(Variable::Bedrooms, rooms.bedrooms as f64)
        .with(Variable::Bathrooms, rooms.bathrooms as f64)
        .with(Variable::Kitchens, rooms.kitchens as f64)
        .with(Variable::LivingRooms, rooms.living as f64)
        .with(Variable::OtherRooms, rooms.other as f64)
}

/// Quantities for the requested optional features, in feature order
pub fn feature_quantities(
    features: &BTreeSet<Feature>,
    snapshot: &ConfigurationSnapshot,
    inputs: &FormulaInputs,
) -> Result<Vec<(Feature, u64)>> {
    let mut quantities = Vec::with_capacity(features.len());
    for feature in features {
        let price = snapshot.feature(*feature)?;
        let quantity = ceil_units(price.quantity.evaluate(inputs)?);
        debug!("Feature {}: {} {}", feature, quantity, price.pricing.unit);
        quantities.push((*feature, quantity));
    }
    Ok(quantities)
}
