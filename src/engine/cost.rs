//! Cost composition - prices quantities against the configuration snapshot
//!
//! Unit prices run through the multiplier chain in a fixed order
//! (base -> location -> quality -> season -> demand) and every step is kept,
//! so the report can show the marginal effect of each factor. Amounts are
//! rounded per line; category totals are sums of rounded lines.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::engine::error::{EstimateError, Result};
use crate::engine::snapshot::{check_multiplier, ConfigurationSnapshot, RegionKey, RegionProfile};
use crate::engine::types::{
    CostBreakdown, CostLine, Feature, LaborCosts, LaborLine, LaborSkill, LineItem, Material,
    MaterialCategory, MaterialCosts, MaterialQuantities, PriceAdjustment, QualityTier,
};
use crate::engine::utils::{decimal_from_f64, round_money};

/// Apply the multipliers to a base price in order, keeping each step
pub fn apply_adjustments(
    base: Decimal,
    location: Decimal,
    quality: Decimal,
    season: Decimal,
    demand: Decimal,
) -> PriceAdjustment {
    let after_location = base * location;
    let after_quality = after_location * quality;
    let after_season = after_quality * season;
    let final_price = after_season * demand;

    PriceAdjustment {
        base,
        after_location,
        after_quality,
        after_season,
        final_price,
        location_adjustment: after_location - base,
        quality_premium: after_quality - after_location,
        seasonal_variation: after_season - after_quality,
        demand_adjustment: final_price - after_season,
    }
}

/// Net quantity grossed up for wastage, rounded up
pub fn with_wastage(net: u64, wastage_pct: Decimal) -> Result<u64> {
    let gross = (Decimal::from(net) * (Decimal::ONE + wastage_pct / dec!(100))).ceil();
    gross.to_u64().ok_or_else(|| {
        EstimateError::InvalidConfiguration(format!(
            "wastage {}% on {} units is not a valid quantity",
            wastage_pct, net
        ))
    })
}

/// Work quantity x base rate x regional multiplier
pub fn labor_cost(work_quantity_sqft: Decimal, base_rate: Decimal, multiplier: Decimal) -> Decimal {
    round_money(work_quantity_sqft * base_rate * multiplier)
}

/// Everything the composer needs besides the snapshot
#[derive(Debug, Clone)]
pub struct CostRequest<'a> {
    pub quantities: &'a MaterialQuantities,
    pub features: &'a [(Feature, u64)],
    pub built_up_area: f64,
    pub quality: QualityTier,
    pub region: &'a RegionKey,
    pub season_factor: Decimal,
    pub demand_index: Decimal,
    pub include_contingency: bool,
}

pub fn compose_costs(
    request: &CostRequest<'_>,
    snapshot: &ConfigurationSnapshot,
) -> Result<CostBreakdown> {
    let region = snapshot.region(request.region)?;
    let season = check_multiplier("season_factor", request.season_factor)?;
    let demand = check_multiplier("demand_index", request.demand_index)?;
    let tier = request.quality;

    let mut lines = Vec::with_capacity(Material::ALL.len() + request.features.len());

    for material in Material::ALL {
        let price = snapshot.material(material)?;
        let name = material.to_string();
        let unit_price = apply_adjustments(
            price.base_price,
            region.material_multiplier(material)?,
            price.grade_multiplier(&name, tier)?,
            season,
            demand,
        );
        let net_quantity = request.quantities.quantity(material);
        let billable_quantity = with_wastage(net_quantity, price.wastage_pct)?;

        lines.push(CostLine {
            item: LineItem::Material(material),
            category: material.category(),
            net_quantity,
            billable_quantity,
            unit: price.unit.clone(),
            quality: tier,
            specification: price.specification(&name, tier),
            amount: round_money(unit_price.final_price * Decimal::from(billable_quantity)),
            unit_price,
        });
    }

    for (feature, net_quantity) in request.features {
        let entry = snapshot.feature(*feature)?;
        let name = feature.to_string();
        let unit_price = apply_adjustments(
            entry.pricing.base_price,
            region.feature_multiplier(*feature)?,
            entry.pricing.grade_multiplier(&name, tier)?,
            season,
            demand,
        );
        let billable_quantity = with_wastage(*net_quantity, entry.pricing.wastage_pct)?;

        lines.push(CostLine {
            item: LineItem::Feature(*feature),
            category: entry.category,
            net_quantity: *net_quantity,
            billable_quantity,
            unit: entry.pricing.unit.clone(),
            quality: tier,
            specification: entry.pricing.specification(&name, tier),
            amount: round_money(unit_price.final_price * Decimal::from(billable_quantity)),
            unit_price,
        });
    }

    let materials = material_costs(&lines);
    let labor = labor_costs(request, snapshot, region)?;

    let policy = snapshot.cost_policy.checked()?;
    let subtotal = materials.total + labor.total;
    let equipment = round_money(subtotal * policy.equipment_rate);
    let overhead = round_money(subtotal * policy.overhead_rate);
    let contingency = request
        .include_contingency
        .then(|| round_money(subtotal * policy.contingency_rate));

    let grand_total = subtotal + equipment + overhead + contingency.unwrap_or(Decimal::ZERO);

    info!(
        "Composed costs for {}: materials {}, labor {}, total {}",
        request.region, materials.total, labor.total, grand_total
    );

    Ok(CostBreakdown {
        materials,
        labor,
        equipment,
        overhead,
        contingency,
        grand_total,
        lines,
    })
}

fn material_costs(lines: &[CostLine]) -> MaterialCosts {
    let mut costs = MaterialCosts::default();
    for line in lines {
        let bucket = match line.category {
            MaterialCategory::Structural => &mut costs.structural,
            MaterialCategory::Masonry => &mut costs.masonry,
            MaterialCategory::Finishing => &mut costs.finishing,
            MaterialCategory::Mep => &mut costs.mep,
        };
        *bucket += line.amount;
    }
    costs.total = costs.structural + costs.masonry + costs.finishing + costs.mep;
    costs
}

fn labor_costs(
    request: &CostRequest<'_>,
    snapshot: &ConfigurationSnapshot,
    region: &RegionProfile,
) -> Result<LaborCosts> {
    let work_quantity_sqft = decimal_from_f64(request.built_up_area)?;
    let mut lines = Vec::with_capacity(LaborSkill::ALL.len());

    for skill in LaborSkill::ALL {
        let base_rate = snapshot.labor_rate(skill)?;
        let regional_multiplier = region.labor_multiplier(skill)?;
        let amount = labor_cost(work_quantity_sqft, base_rate, regional_multiplier);
        debug!(
            "Labor {}: {} sq.ft at {} x {}",
            skill, work_quantity_sqft, base_rate, regional_multiplier
        );

        lines.push(LaborLine {
            skill,
            work_quantity_sqft,
            base_rate,
            regional_multiplier,
            amount,
        });
    }

    let total = lines.iter().map(|l| l.amount).sum();
    Ok(LaborCosts { lines, total })
}
