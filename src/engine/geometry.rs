//! Geometry resolution - built-up area and structural concrete volumes
//! Pure functions over plot geometry and floor count

use tracing::debug;

use crate::engine::error::{EstimateError, Result};
use crate::engine::formula::{Formula, FormulaInputs, Step, Variable};
use crate::engine::types::{
    ConstructionType, Geometry, PlotSizeClass, SoilType, StructuralVolumes,
};
use crate::engine::validate::{MAX_FLOORS, MAX_PLOT_AREA_SQFT, MIN_FLOORS, MIN_PLOT_AREA_SQFT};

/// Carpet area as a share of built-up area
pub const CARPET_AREA_RATIO: f64 = 0.80;

const FOUNDATION_FRACTION: f64 = 0.3;
const COLUMN_FRACTION: f64 = 0.04;
const BEAM_FRACTION: f64 = 0.03;
const SLAB_FRACTION: f64 = 0.15;

/// Plot utilization bracket: < 1000 -> 0.70, 1000..=2000 -> 0.75, > 2000 -> 0.80
pub fn utilization_bracket() -> Formula {
    Formula::Stepped {
        variable: Variable::PlotArea,
        steps: vec![
            Step {
                limit: 1000.0,
                inclusive: false,
                value: 0.70,
            },
            Step {
                limit: 2000.0,
                inclusive: true,
                value: 0.75,
            },
        ],
        otherwise: 0.80,
    }
}

pub fn utilization_factor(plot_area_sqft: f64) -> Result<f64> {
    let inputs = FormulaInputs::new().with(Variable::PlotArea, plot_area_sqft);
    Ok(utilization_bracket().evaluate(&inputs)?)
}

fn check_range(plot_area_sqft: f64, floors: u32) -> Result<()> {
    if !plot_area_sqft.is_finite()
        || !(MIN_PLOT_AREA_SQFT..=MAX_PLOT_AREA_SQFT).contains(&plot_area_sqft)
    {
        return Err(EstimateError::InvalidGeometry(format!(
            "plot area {} sq.ft outside {}-{}",
            plot_area_sqft, MIN_PLOT_AREA_SQFT, MAX_PLOT_AREA_SQFT
        )));
    }
    let floor_range = (MIN_FLOORS as u32)..=(MAX_FLOORS as u32);
    if !floor_range.contains(&floors) {
        return Err(EstimateError::InvalidGeometry(format!(
            "floor count {} outside {}-{}",
            floors, MIN_FLOORS, MAX_FLOORS
        )));
    }
    Ok(())
}

/// Built-up area = plot area x utilization factor x floors
pub fn calculate_builtup_area(plot_area_sqft: f64, floors: u32) -> Result<f64> {
    check_range(plot_area_sqft, floors)?;
    Ok(plot_area_sqft * utilization_factor(plot_area_sqft)? * floors as f64)
}

pub fn structural_volumes(
    built_up_area: f64,
    floors: u32,
    soil: SoilType,
    construction: ConstructionType,
) -> StructuralVolumes {
    let floors = floors as f64;
    let columns = match construction {
        ConstructionType::RccFrame => built_up_area * COLUMN_FRACTION * floors,
        // Walls carry the load
        ConstructionType::LoadBearing => 0.0,
    };

    StructuralVolumes {
        foundation: built_up_area * soil.foundation_depth() * FOUNDATION_FRACTION,
        columns,
        beams: built_up_area * BEAM_FRACTION * floors,
        slabs: built_up_area * SLAB_FRACTION * floors,
    }
}

pub fn resolve_geometry(
    plot_area_sqft: f64,
    floors: u32,
    soil: SoilType,
    construction: ConstructionType,
) -> Result<Geometry> {
    let built_up_area = calculate_builtup_area(plot_area_sqft, floors)?;
    let volumes = structural_volumes(built_up_area, floors, soil, construction);

    debug!(
        "Resolved geometry: plot {:.0} sq.ft, built-up {:.0} sq.ft, concrete {:.1} cu.ft",
        plot_area_sqft,
        built_up_area,
        volumes.total()
    );

    Ok(Geometry {
        plot_area_sqft,
        plot_size_class: PlotSizeClass::from_area(plot_area_sqft),
        utilization_factor: utilization_factor(plot_area_sqft)?,
        floors,
        built_up_area,
        carpet_area: built_up_area * CARPET_AREA_RATIO,
        volumes,
    })
}
