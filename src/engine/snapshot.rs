//! Versioned configuration snapshot consumed read-only by the engine
//!
//! A snapshot is published by the admin tooling and never edited in place;
//! a price change produces a new version. Lookups that miss return
//! `InvalidConfiguration` and are logged with the missing key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

use crate::engine::error::{EstimateError, Result};
use crate::engine::formula::Formula;
use crate::engine::types::{
    Feature, LaborSkill, Location, Material, MaterialCategory, QualityTier, SeismicZone,
};

pub const MIN_MULTIPLIER: Decimal = dec!(0.5);
pub const MAX_MULTIPLIER: Decimal = dec!(3.0);

pub const EQUIPMENT_RATE_BAND: (Decimal, Decimal) = (dec!(0.03), dec!(0.05));
pub const OVERHEAD_RATE_BAND: (Decimal, Decimal) = (dec!(0.08), dec!(0.12));
pub const CONTINGENCY_RATE_BAND: (Decimal, Decimal) = (dec!(0.10), dec!(0.15));

const MAX_WASTAGE_PCT: Decimal = dec!(50);

/// Price entry for a material or feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPrice {
    pub base_price: Decimal,
    pub unit: String,
    #[serde(default)]
    pub wastage_pct: Decimal,
    pub grade_multipliers: BTreeMap<QualityTier, Decimal>,
    /// Human-readable specification per grade
    #[serde(default)]
    pub specifications: BTreeMap<QualityTier, String>,
}

impl CatalogPrice {
    pub fn grade_multiplier(&self, item: &str, tier: QualityTier) -> Result<Decimal> {
        match self.grade_multipliers.get(&tier) {
            Some(m) => check_multiplier(&format!("{} grade {}", item, tier), *m),
            None => Err(missing(format!("no {} grade multiplier for {}", tier, item))),
        }
    }

    pub fn specification(&self, item: &str, tier: QualityTier) -> String {
        self.specifications
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| format!("{} {}", tier, item))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePrice {
    pub pricing: CatalogPrice,
    pub category: MaterialCategory,
    pub quantity: Formula,
}

/// Regional adjustments for one (state, city)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub state_code: String,
    pub city: String,
    pub seismic_zone: SeismicZone,
    pub last_updated: DateTime<Utc>,
    pub material_multipliers: BTreeMap<Material, Decimal>,
    #[serde(default)]
    pub feature_multipliers: BTreeMap<Feature, Decimal>,
    pub labor_multipliers: BTreeMap<LaborSkill, Decimal>,
}

impl RegionProfile {
    pub fn key(&self) -> RegionKey {
        RegionKey::new(&self.state_code, &self.city)
    }

    pub fn material_multiplier(&self, material: Material) -> Result<Decimal> {
        let key = self.key();
        match self.material_multipliers.get(&material) {
            Some(m) => check_multiplier(&format!("region {} {}", key, material), *m),
            None => Err(missing(format!("region {} has no multiplier for {}", key, material))),
        }
    }

    pub fn feature_multiplier(&self, feature: Feature) -> Result<Decimal> {
        let key = self.key();
        match self.feature_multipliers.get(&feature) {
            Some(m) => check_multiplier(&format!("region {} {}", key, feature), *m),
            None => Err(missing(format!("region {} has no multiplier for {}", key, feature))),
        }
    }

    pub fn labor_multiplier(&self, skill: LaborSkill) -> Result<Decimal> {
        let key = self.key();
        match self.labor_multipliers.get(&skill) {
            Some(m) => check_multiplier(&format!("region {} labor {}", key, skill), *m),
            None => Err(missing(format!("region {} has no labor multiplier for {}", key, skill))),
        }
    }
}

/// Normalized (state, city) lookup key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    pub state_code: String,
    pub city: String,
}

impl RegionKey {
    pub fn new(state_code: &str, city: &str) -> Self {
        RegionKey {
            state_code: state_code.trim().to_uppercase(),
            city: city.trim().to_lowercase(),
        }
    }
}

impl From<&Location> for RegionKey {
    fn from(location: &Location) -> Self {
        RegionKey::new(&location.state_code, &location.city)
    }
}

impl std::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.state_code, self.city)
    }
}

/// Percentages applied to the materials + labor subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPolicy {
    pub equipment_rate: Decimal,
    pub overhead_rate: Decimal,
    pub contingency_rate: Decimal,
}

impl CostPolicy {
    pub fn checked(&self) -> Result<CostPolicy> {
        check_rate("equipment_rate", self.equipment_rate, EQUIPMENT_RATE_BAND)?;
        check_rate("overhead_rate", self.overhead_rate, OVERHEAD_RATE_BAND)?;
        check_rate("contingency_rate", self.contingency_rate, CONTINGENCY_RATE_BAND)?;
        Ok(*self)
    }
}

/// Market-wide pricing conditions at publication time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFactors {
    pub season_factor: Decimal,
    pub demand_index: Decimal,
    /// 0.0 (stable) to 1.0 (highly volatile)
    pub volatility: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    pub version: String,
    pub published_at: DateTime<Utc>,
    pub currency: String,
    pub materials: BTreeMap<Material, CatalogPrice>,
    #[serde(default)]
    pub features: BTreeMap<Feature, FeaturePrice>,
    pub regions: Vec<RegionProfile>,
    pub labor_rates: BTreeMap<LaborSkill, Decimal>,
    pub cost_policy: CostPolicy,
    pub market: MarketFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// A required entry is absent
    Missing,
    /// A multiplier outside [`MIN_MULTIPLIER`, `MAX_MULTIPLIER`]
    OutOfBandMultiplier { value: Decimal },
    /// A price, rate or formula that cannot be used as given
    InvalidValue,
}

/// A data-integrity problem found by [`ConfigurationSnapshot::issues`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotIssue {
    pub key: String,
    pub problem: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl SnapshotIssue {
    fn missing(key: String) -> Self {
        SnapshotIssue {
            key,
            problem: "missing".to_string(),
            kind: IssueKind::Missing,
        }
    }

    fn invalid(key: String, problem: String) -> Self {
        SnapshotIssue {
            key,
            problem,
            kind: IssueKind::InvalidValue,
        }
    }

    fn multiplier(key: String, value: Decimal) -> Self {
        SnapshotIssue {
            key,
            problem: out_of_band(value),
            kind: IssueKind::OutOfBandMultiplier { value },
        }
    }

    /// Out-of-band multipliers keep their own error; everything else is a configuration gap
    pub fn to_error(&self) -> EstimateError {
        match self.kind {
            IssueKind::OutOfBandMultiplier { value } => EstimateError::OutOfRangeMultiplier {
                name: self.key.clone(),
                value,
                min: MIN_MULTIPLIER,
                max: MAX_MULTIPLIER,
            },
            IssueKind::Missing | IssueKind::InvalidValue => {
                EstimateError::InvalidConfiguration(self.to_string())
            }
        }
    }
}

impl std::fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.problem)
    }
}

impl ConfigurationSnapshot {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: ConfigurationSnapshot = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        info!("Loading configuration snapshot from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        info!(
            "Loaded snapshot {} ({} materials, {} regions)",
            snapshot.version,
            snapshot.materials.len(),
            snapshot.regions.len()
        );
        Ok(snapshot)
    }

    pub fn region(&self, key: &RegionKey) -> Result<&RegionProfile> {
        self.regions
            .iter()
            .find(|r| &r.key() == key)
            .ok_or_else(|| missing(format!("no region profile for {}", key)))
    }

    pub fn has_region(&self, key: &RegionKey) -> bool {
        self.regions.iter().any(|r| &r.key() == key)
    }

    pub fn material(&self, material: Material) -> Result<&CatalogPrice> {
        self.materials
            .get(&material)
            .ok_or_else(|| missing(format!("no price for material {}", material)))
    }

    pub fn feature(&self, feature: Feature) -> Result<&FeaturePrice> {
        self.features
            .get(&feature)
            .ok_or_else(|| missing(format!("no price for feature {}", feature)))
    }

    pub fn labor_rate(&self, skill: LaborSkill) -> Result<Decimal> {
        self.labor_rates
            .get(&skill)
            .copied()
            .ok_or_else(|| missing(format!("no labor rate for {}", skill)))
    }

    pub fn season_factor(&self) -> Result<Decimal> {
        check_multiplier("market season_factor", self.market.season_factor)
    }

    pub fn demand_index(&self) -> Result<Decimal> {
        check_multiplier("market demand_index", self.market.demand_index)
    }

    /// Every integrity problem in the snapshot
    pub fn issues(&self) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();
        let mut push = |issue: SnapshotIssue| issues.push(issue);

        for (material, price) in &self.materials {
            audit_price(&material.to_string(), price, &mut push);
        }
        for material in Material::ALL {
            if !self.materials.contains_key(&material) {
                push(SnapshotIssue::missing(format!("materials.{}", material)));
            }
        }
        for (feature, price) in &self.features {
            audit_price(&feature.to_string(), &price.pricing, &mut push);
            if let Err(e) = price.quantity.check() {
                push(SnapshotIssue::invalid(
                    format!("features.{}.quantity", feature),
                    e.to_string(),
                ));
            }
        }

        for (skill, rate) in &self.labor_rates {
            if *rate <= Decimal::ZERO {
                push(SnapshotIssue::invalid(
                    format!("labor_rates.{}", skill),
                    format!("rate {} must be positive", rate),
                ));
            }
        }
        for skill in LaborSkill::ALL {
            if !self.labor_rates.contains_key(&skill) {
                push(SnapshotIssue::missing(format!("labor_rates.{}", skill)));
            }
        }

        if self.regions.is_empty() {
            push(SnapshotIssue::invalid(
                "regions".to_string(),
                "no region profiles".to_string(),
            ));
        }
        for region in &self.regions {
            let key = region.key();
            let multipliers = region
                .material_multipliers
                .iter()
                .map(|(m, v)| (m.to_string(), *v))
                .chain(region.feature_multipliers.iter().map(|(f, v)| (f.to_string(), *v)))
                .chain(
                    region
                        .labor_multipliers
                        .iter()
                        .map(|(s, v)| (format!("labor.{}", s), *v)),
                );
            for (name, value) in multipliers {
                if !in_band(value) {
                    push(SnapshotIssue::multiplier(format!("regions.{}.{}", key, name), value));
                }
            }
        }

        for (name, value, band) in [
            ("equipment_rate", self.cost_policy.equipment_rate, EQUIPMENT_RATE_BAND),
            ("overhead_rate", self.cost_policy.overhead_rate, OVERHEAD_RATE_BAND),
            ("contingency_rate", self.cost_policy.contingency_rate, CONTINGENCY_RATE_BAND),
        ] {
            if value < band.0 || value > band.1 {
                push(SnapshotIssue::invalid(
                    format!("cost_policy.{}", name),
                    format!("{} outside [{}, {}]", value, band.0, band.1),
                ));
            }
        }

        for (name, value) in [
            ("season_factor", self.market.season_factor),
            ("demand_index", self.market.demand_index),
        ] {
            if !in_band(value) {
                push(SnapshotIssue::multiplier(format!("market.{}", name), value));
            }
        }
        if self.market.volatility < Decimal::ZERO || self.market.volatility > Decimal::ONE {
            push(SnapshotIssue::invalid(
                "market.volatility".to_string(),
                format!("{} outside [0, 1]", self.market.volatility),
            ));
        }

        issues
    }

    /// Fails on the first integrity problem
    pub fn validate(&self) -> Result<()> {
        match self.issues().into_iter().next() {
            None => Ok(()),
            Some(issue) => {
                error!("Snapshot {} failed integrity check: {}", self.version, issue);
                Err(issue.to_error())
            }
        }
    }
}

fn audit_price(item: &str, price: &CatalogPrice, push: &mut impl FnMut(SnapshotIssue)) {
    if price.base_price <= Decimal::ZERO {
        push(SnapshotIssue::invalid(
            format!("{}.base_price", item),
            format!("{} must be positive", price.base_price),
        ));
    }
    if price.wastage_pct < Decimal::ZERO || price.wastage_pct > MAX_WASTAGE_PCT {
        push(SnapshotIssue::invalid(
            format!("{}.wastage_pct", item),
            format!("{} outside [0, {}]", price.wastage_pct, MAX_WASTAGE_PCT),
        ));
    }
    if price.grade_multipliers.len() < 2 {
        push(SnapshotIssue::invalid(
            format!("{}.grade_multipliers", item),
            "at least two grades are required".to_string(),
        ));
    }
    for (tier, value) in &price.grade_multipliers {
        if !in_band(*value) {
            push(SnapshotIssue::multiplier(
                format!("{}.grade_multipliers.{}", item, tier),
                *value,
            ));
        }
    }
}

fn in_band(value: Decimal) -> bool {
    value >= MIN_MULTIPLIER && value <= MAX_MULTIPLIER
}

fn out_of_band(value: Decimal) -> String {
    format!("{} outside [{}, {}]", value, MIN_MULTIPLIER, MAX_MULTIPLIER)
}

/// Reject a multiplier outside the sane band
pub fn check_multiplier(name: &str, value: Decimal) -> Result<Decimal> {
    if in_band(value) {
        Ok(value)
    } else {
        error!("Multiplier {} = {} is outside the sane band", name, value);
        Err(EstimateError::OutOfRangeMultiplier {
            name: name.to_string(),
            value,
            min: MIN_MULTIPLIER,
            max: MAX_MULTIPLIER,
        })
    }
}

fn check_rate(name: &str, value: Decimal, band: (Decimal, Decimal)) -> Result<()> {
    if value < band.0 || value > band.1 {
        error!("Cost policy {} = {} is outside [{}, {}]", name, value, band.0, band.1);
        return Err(EstimateError::InvalidConfiguration(format!(
            "cost policy {} = {} outside [{}, {}]",
            name, value, band.0, band.1
        )));
    }
    Ok(())
}

fn missing(message: String) -> EstimateError {
    error!("Configuration gap: {}", message);
    EstimateError::InvalidConfiguration(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::sample_snapshot;

    #[test]
    fn test_sample_snapshot_is_clean() {
        let snapshot = sample_snapshot();

        assert!(snapshot.issues().is_empty(), "{:?}", snapshot.issues());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_region_lookup_is_normalized() {
        let snapshot = sample_snapshot();

        let region = snapshot.region(&RegionKey::new(" ka ", "Bengaluru")).unwrap();
        assert_eq!(region.seismic_zone, SeismicZone::II);
        assert!(snapshot.has_region(&RegionKey::new("MH", "MUMBAI")));
    }

    #[test]
    fn test_missing_region_is_configuration_error() {
        let snapshot = sample_snapshot();

        let err = snapshot.region(&RegionKey::new("XX", "nowhere")).unwrap_err();
        assert!(matches!(err, EstimateError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("XX/nowhere"));
    }

    #[test]
    fn test_out_of_band_multiplier_reported() {
        let mut snapshot = sample_snapshot();
        snapshot.regions[0]
            .material_multipliers
            .insert(Material::Steel, dec!(3.2));

        let issues = snapshot.issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].key.ends_with("steel"));
        assert_eq!(
            issues[0].kind,
            IssueKind::OutOfBandMultiplier { value: dec!(3.2) }
        );

        // the audit surfaces the distinct multiplier error, not a generic gap
        match snapshot.validate().unwrap_err() {
            EstimateError::OutOfRangeMultiplier { name, value, min, max } => {
                assert_eq!(name, "regions.KA/bengaluru.steel");
                assert_eq!(value, dec!(3.2));
                assert_eq!((min, max), (MIN_MULTIPLIER, MAX_MULTIPLIER));
            }
            other => panic!("expected OutOfRangeMultiplier, got {:?}", other),
        }

        let err = snapshot.regions[0]
            .material_multiplier(Material::Steel)
            .unwrap_err();
        assert!(matches!(err, EstimateError::OutOfRangeMultiplier { .. }));
    }

    #[test]
    fn test_single_grade_set_rejected() {
        let mut snapshot = sample_snapshot();
        let cement = snapshot.materials.get_mut(&Material::Cement).unwrap();
        cement.grade_multipliers.retain(|tier, _| *tier == QualityTier::Standard);

        let issues = snapshot.issues();
        assert!(issues
            .iter()
            .any(|i| i.key == "cement.grade_multipliers"));
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_policy_rates_checked_against_bands() {
        let mut snapshot = sample_snapshot();
        snapshot.cost_policy.overhead_rate = dec!(0.20);

        assert!(snapshot.cost_policy.checked().is_err());
        assert!(matches!(
            snapshot.validate(),
            Err(EstimateError::InvalidConfiguration(_))
        ));
        assert!(snapshot
            .issues()
            .iter()
            .any(|i| i.key == "cost_policy.overhead_rate"));
    }

    #[test]
    fn test_missing_material_listed() {
        let mut snapshot = sample_snapshot();
        snapshot.materials.remove(&Material::Paint);

        let issues = snapshot.issues();
        let paint = issues.iter().find(|i| i.key == "materials.paint").unwrap();
        assert_eq!(paint.kind, IssueKind::Missing);
        assert!(matches!(
            snapshot.validate(),
            Err(EstimateError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            snapshot.material(Material::Paint),
            Err(EstimateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let snapshot = sample_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let parsed = ConfigurationSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
