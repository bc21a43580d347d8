//! Core data types for the estimation pipeline
//! Pure data structures; the only behavior is fixed factor lookups

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Units a plot area may be supplied in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    SqFt,
    SqM,
    SqYd,
    Acre,
}

impl AreaUnit {
    /// Square feet per one unit
    pub fn sqft_factor(self) -> f64 {
        match self {
            AreaUnit::SqFt => 1.0,
            AreaUnit::SqM => 10.763_910_4,
            AreaUnit::SqYd => 9.0,
            AreaUnit::Acre => 43_560.0,
        }
    }
}

/// Unit-tagged plot area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    pub value: f64,
    pub unit: AreaUnit,
}

impl PlotArea {
    pub fn sqft(value: f64) -> Self {
        PlotArea {
            value,
            unit: AreaUnit::SqFt,
        }
    }

    pub fn in_sqft(&self) -> f64 {
        self.value * self.unit.sqft_factor()
    }
}

/// Construction-grade level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Basic,
    Standard,
    Premium,
    Luxury,
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Basic => write!(f, "basic"),
            QualityTier::Standard => write!(f, "standard"),
            QualityTier::Premium => write!(f, "premium"),
            QualityTier::Luxury => write!(f, "luxury"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionType {
    #[default]
    RccFrame,
    LoadBearing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofType {
    #[default]
    RccSlab,
    Sloped,
    Metal,
}

impl RoofType {
    /// Duration multiplier for the roofing phase
    pub fn roofing_factor(self) -> f64 {
        match self {
            RoofType::RccSlab => 1.0,
            RoofType::Sloped => 1.2,
            RoofType::Metal => 0.6,
        }
    }
}

/// Foundation/soil category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Good,
    #[default]
    Medium,
    Poor,
}

impl SoilType {
    /// Foundation depth in feet
    pub fn foundation_depth(self) -> f64 {
        match self {
            SoilType::Good => 1.5,
            SoilType::Medium => 2.0,
            SoilType::Poor => 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcreteGrade {
    M15,
    M20,
    M25,
}

impl ConcreteGrade {
    /// Cement bags per cubic metre of concrete
    pub fn cement_factor(self) -> f64 {
        match self {
            ConcreteGrade::M15 => 7.5,
            ConcreteGrade::M20 => 8.0,
            ConcreteGrade::M25 => 8.5,
        }
    }

    pub fn for_quality(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Basic => ConcreteGrade::M15,
            QualityTier::Standard => ConcreteGrade::M20,
            QualityTier::Premium | QualityTier::Luxury => ConcreteGrade::M25,
        }
    }
}

impl std::fmt::Display for ConcreteGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcreteGrade::M15 => write!(f, "M15"),
            ConcreteGrade::M20 => write!(f, "M20"),
            ConcreteGrade::M25 => write!(f, "M25"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeismicZone {
    I,
    II,
    III,
    IV,
    V,
}

impl SeismicZone {
    /// Steel reinforcement multiplier, increasing with zone severity
    pub fn steel_multiplier(self) -> f64 {
        match self {
            SeismicZone::I => 1.0,
            SeismicZone::II => 1.1,
            SeismicZone::III => 1.2,
            SeismicZone::IV => 1.3,
            SeismicZone::V => 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn factor(self) -> f64 {
        match self {
            Complexity::Simple => 1.0,
            Complexity::Medium => 1.2,
            Complexity::Complex => 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Favorable,
    Monsoon,
    Extreme,
}

impl Weather {
    pub fn factor(self) -> f64 {
        match self {
            Weather::Favorable => 1.0,
            Weather::Monsoon => 1.3,
            Weather::Extreme => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborAvailability {
    Abundant,
    #[default]
    Normal,
    Scarce,
}

impl LaborAvailability {
    pub fn factor(self) -> f64 {
        match self {
            LaborAvailability::Abundant => 0.9,
            LaborAvailability::Normal => 1.0,
            LaborAvailability::Scarce => 1.3,
        }
    }
}

/// Optional add-ons priced from the snapshot's feature catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SolarPanels,
    RainwaterHarvesting,
    ModularKitchen,
    FalseCeiling,
    Landscaping,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feature::SolarPanels => write!(f, "solar_panels"),
            Feature::RainwaterHarvesting => write!(f, "rainwater_harvesting"),
            Feature::ModularKitchen => write!(f, "modular_kitchen"),
            Feature::FalseCeiling => write!(f, "false_ceiling"),
            Feature::Landscaping => write!(f, "landscaping"),
        }
    }
}

/// Materials the quantity estimator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Cement,
    Steel,
    Bricks,
    Sand,
    Aggregate,
    Tiles,
    Paint,
    Electrical,
    Plumbing,
}

impl Material {
    pub const ALL: [Material; 9] = [
        Material::Cement,
        Material::Steel,
        Material::Bricks,
        Material::Sand,
        Material::Aggregate,
        Material::Tiles,
        Material::Paint,
        Material::Electrical,
        Material::Plumbing,
    ];

    pub fn category(self) -> MaterialCategory {
        match self {
            Material::Cement | Material::Steel | Material::Aggregate => MaterialCategory::Structural,
            Material::Bricks | Material::Sand => MaterialCategory::Masonry,
            Material::Tiles | Material::Paint => MaterialCategory::Finishing,
            Material::Electrical | Material::Plumbing => MaterialCategory::Mep,
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Material::Cement => write!(f, "cement"),
            Material::Steel => write!(f, "steel"),
            Material::Bricks => write!(f, "bricks"),
            Material::Sand => write!(f, "sand"),
            Material::Aggregate => write!(f, "aggregate"),
            Material::Tiles => write!(f, "tiles"),
            Material::Paint => write!(f, "paint"),
            Material::Electrical => write!(f, "electrical"),
            Material::Plumbing => write!(f, "plumbing"),
        }
    }
}

/// Subcategories of the materials cost block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Structural,
    Masonry,
    Finishing,
    Mep,
}

/// Labor skill tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborSkill {
    Skilled,
    SemiSkilled,
    Unskilled,
    Supervision,
}

impl LaborSkill {
    pub const ALL: [LaborSkill; 4] = [
        LaborSkill::Skilled,
        LaborSkill::SemiSkilled,
        LaborSkill::Unskilled,
        LaborSkill::Supervision,
    ];
}

impl std::fmt::Display for LaborSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaborSkill::Skilled => write!(f, "skilled"),
            LaborSkill::SemiSkilled => write!(f, "semi_skilled"),
            LaborSkill::Unskilled => write!(f, "unskilled"),
            LaborSkill::Supervision => write!(f, "supervision"),
        }
    }
}

/// Room mix; counts are signed so negative values surface as validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomComposition {
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub kitchens: i32,
    pub living: i32,
    pub other: i32,
}

impl RoomComposition {
    pub fn total(&self) -> i32 {
        self.bedrooms
            .saturating_add(self.bathrooms)
            .saturating_add(self.kitchens)
            .saturating_add(self.living)
            .saturating_add(self.other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub state_code: String,
    pub city: String,
}

/// Site conditions that drive the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConditions {
    /// Derived from floors and features when absent
    pub complexity: Option<Complexity>,
    pub weather: Weather,
    pub labor_availability: LaborAvailability,
}

/// Caller-supplied project parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub plot_area: PlotArea,
    pub floors: i32,
    #[serde(default)]
    pub rooms: RoomComposition,
    pub quality: QualityTier,
    pub location: Location,
    #[serde(default)]
    pub construction_type: Option<ConstructionType>,
    #[serde(default)]
    pub roof_type: Option<RoofType>,
    #[serde(default)]
    pub soil: Option<SoilType>,
    #[serde(default)]
    pub concrete_grade: Option<ConcreteGrade>,
    #[serde(default)]
    pub features: BTreeSet<Feature>,
    #[serde(default)]
    pub site: SiteConditions,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Plot size bracket driving the utilization factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotSizeClass {
    Small,
    Medium,
    Large,
}

impl PlotSizeClass {
    /// 1000 and 2000 both fall in the medium bracket
    pub fn from_area(plot_area_sqft: f64) -> Self {
        if plot_area_sqft < 1000.0 {
            PlotSizeClass::Small
        } else if plot_area_sqft <= 2000.0 {
            PlotSizeClass::Medium
        } else {
            PlotSizeClass::Large
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralElement {
    Foundation,
    Columns,
    Beams,
    Slabs,
}

impl StructuralElement {
    /// Steel in kg per cubic metre of concrete
    pub fn steel_factor(self) -> f64 {
        match self {
            StructuralElement::Foundation => 80.0,
            StructuralElement::Columns => 160.0,
            StructuralElement::Beams => 130.0,
            StructuralElement::Slabs => 90.0,
        }
    }
}

/// Concrete volumes per structural element, cubic feet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralVolumes {
    pub foundation: f64,
    pub columns: f64,
    pub beams: f64,
    pub slabs: f64,
}

impl StructuralVolumes {
    pub fn elements(&self) -> [(StructuralElement, f64); 4] {
        [
            (StructuralElement::Foundation, self.foundation),
            (StructuralElement::Columns, self.columns),
            (StructuralElement::Beams, self.beams),
            (StructuralElement::Slabs, self.slabs),
        ]
    }

    pub fn total(&self) -> f64 {
        self.foundation + self.columns + self.beams + self.slabs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub plot_area_sqft: f64,
    pub plot_size_class: PlotSizeClass,
    pub utilization_factor: f64,
    pub floors: u32,
    pub built_up_area: f64,
    pub carpet_area: f64,
    pub volumes: StructuralVolumes,
}

impl Geometry {
    /// Ground coverage of a single floor
    pub fn footprint(&self) -> f64 {
        self.built_up_area / self.floors as f64
    }

    /// Plot area not covered by the building
    pub fn open_area(&self) -> f64 {
        (self.plot_area_sqft - self.footprint()).max(0.0)
    }
}

/// Wall areas in square feet, volume in cubic feet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallAreas {
    pub gross: f64,
    pub net: f64,
    pub external: f64,
    pub internal: f64,
    pub volume: f64,
}

/// Net material quantities, rounded up to whole ordering units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantities {
    pub cement_bags: u64,
    pub steel_kg: u64,
    pub bricks: u64,
    pub sand_cuft: u64,
    pub aggregate_cuft: u64,
    pub tiles_sqft: u64,
    pub paint_litres: u64,
    pub electrical_points: u64,
    pub plumbing_points: u64,
    pub concrete_m3: f64,
    pub mortar_m3: f64,
    pub walls: WallAreas,
}

impl MaterialQuantities {
    pub fn quantity(&self, material: Material) -> u64 {
        match material {
            Material::Cement => self.cement_bags,
            Material::Steel => self.steel_kg,
            Material::Bricks => self.bricks,
            Material::Sand => self.sand_cuft,
            Material::Aggregate => self.aggregate_cuft,
            Material::Tiles => self.tiles_sqft,
            Material::Paint => self.paint_litres,
            Material::Electrical => self.electrical_points,
            Material::Plumbing => self.plumbing_points,
        }
    }
}

/// Unit price after each multiplier, applied in order
/// base -> location -> quality -> season -> demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub base: Decimal,
    pub after_location: Decimal,
    pub after_quality: Decimal,
    pub after_season: Decimal,
    pub final_price: Decimal,
    pub location_adjustment: Decimal,
    pub quality_premium: Decimal,
    pub seasonal_variation: Decimal,
    pub demand_adjustment: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineItem {
    Material(Material),
    Feature(Feature),
}

impl std::fmt::Display for LineItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItem::Material(m) => write!(f, "{}", m),
            LineItem::Feature(feat) => write!(f, "{}", feat),
        }
    }
}

/// One billable material or feature line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub item: LineItem,
    pub category: MaterialCategory,
    pub net_quantity: u64,
    pub billable_quantity: u64,
    pub unit: String,
    pub quality: QualityTier,
    pub specification: String,
    pub unit_price: PriceAdjustment,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialCosts {
    pub structural: Decimal,
    pub masonry: Decimal,
    pub finishing: Decimal,
    pub mep: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborLine {
    pub skill: LaborSkill,
    pub work_quantity_sqft: Decimal,
    pub base_rate: Decimal,
    pub regional_multiplier: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaborCosts {
    pub lines: Vec<LaborLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub materials: MaterialCosts,
    pub labor: LaborCosts,
    pub equipment: Decimal,
    pub overhead: Decimal,
    pub contingency: Option<Decimal>,
    pub grand_total: Decimal,
    pub lines: Vec<CostLine>,
}

impl CostBreakdown {
    /// Sum of the category totals
    pub fn category_sum(&self) -> Decimal {
        self.materials.total
            + self.labor.total
            + self.equipment
            + self.overhead
            + self.contingency.unwrap_or(Decimal::ZERO)
    }

    /// Sum of every leaf amount
    pub fn leaf_sum(&self) -> Decimal {
        let materials: Decimal = self.lines.iter().map(|l| l.amount).sum();
        let labor: Decimal = self.labor.lines.iter().map(|l| l.amount).sum();
        materials
            + labor
            + self.equipment
            + self.overhead
            + self.contingency.unwrap_or(Decimal::ZERO)
    }
}

/// Construction phases in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Foundation,
    Structure,
    Masonry,
    Roofing,
    Mep,
    Plastering,
    Flooring,
    Finishing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Planning => write!(f, "planning"),
            Phase::Foundation => write!(f, "foundation"),
            Phase::Structure => write!(f, "structure"),
            Phase::Masonry => write!(f, "masonry"),
            Phase::Roofing => write!(f, "roofing"),
            Phase::Mep => write!(f, "mep"),
            Phase::Plastering => write!(f, "plastering"),
            Phase::Flooring => write!(f, "flooring"),
            Phase::Finishing => write!(f, "finishing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub phase: Phase,
    pub duration_days: u32,
    pub start_day: u32,
    pub end_day: u32,
    pub cost: Decimal,
}

/// Critical-path phases plus work that runs alongside them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub phases: Vec<TimelinePhase>,
    pub parallel: Vec<TimelinePhase>,
    pub critical_path_days: u32,
    pub total_days: u32,
}

impl Timeline {
    /// Every phase, critical path first
    pub fn all_phases(&self) -> impl Iterator<Item = &TimelinePhase> {
        self.phases.iter().chain(self.parallel.iter())
    }

    pub fn allocated_cost(&self) -> Decimal {
        self.all_phases().map(|p| p.cost).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Reliability::High
        } else if score >= 65 {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    pub name: String,
    pub weight: f64,
    /// 0.0-1.0, higher is better
    pub value: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// 40-95
    pub score: u8,
    pub reliability: Reliability,
    pub factors: Vec<ConfidenceFactor>,
    /// Fractional half-width of the variance range
    pub variance_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowMonth {
    pub month: u32,
    pub label: String,
    pub amount: Decimal,
}
