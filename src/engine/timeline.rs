//! Timeline estimation - phase durations and cost allocation
//!
//! Critical-path phases are laid end to end: each starts the day after the
//! previous one ends. MEP work runs alongside roofing and later phases, so it
//! is scheduled separately and does not push the critical path out.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::debug;

use crate::engine::types::{
    Complexity, LaborAvailability, Phase, RoofType, Timeline, TimelinePhase, Weather,
};
use crate::engine::utils::{ceil_units, round_money};

pub const PLANNING_DAYS: u32 = 30;
pub const MEP_DAYS: u32 = 45;

pub const CRITICAL_PATH: [Phase; 8] = [
    Phase::Planning,
    Phase::Foundation,
    Phase::Structure,
    Phase::Masonry,
    Phase::Roofing,
    Phase::Plastering,
    Phase::Flooring,
    Phase::Finishing,
];

/// Every phase in canonical order, MEP alongside roofing
pub const ALL_PHASES: [Phase; 9] = [
    Phase::Planning,
    Phase::Foundation,
    Phase::Structure,
    Phase::Masonry,
    Phase::Roofing,
    Phase::Mep,
    Phase::Plastering,
    Phase::Flooring,
    Phase::Finishing,
];

/// Built-up sq.ft completed per day; None for fixed-duration phases
pub fn daily_throughput(phase: Phase) -> Option<f64> {
    match phase {
        Phase::Foundation => Some(40.0),
        Phase::Structure => Some(35.0),
        Phase::Masonry => Some(60.0),
        Phase::Roofing => Some(80.0),
        Phase::Plastering => Some(100.0),
        Phase::Flooring => Some(75.0),
        Phase::Finishing => Some(120.0),
        Phase::Planning | Phase::Mep => None,
    }
}

/// Share of the grand total spent in each phase
pub fn cost_share(phase: Phase) -> Decimal {
    match phase {
        Phase::Planning => dec!(0.02),
        Phase::Foundation => dec!(0.12),
        Phase::Structure => dec!(0.25),
        Phase::Masonry => dec!(0.12),
        Phase::Roofing => dec!(0.08),
        Phase::Mep => dec!(0.12),
        Phase::Plastering => dec!(0.08),
        Phase::Flooring => dec!(0.09),
        Phase::Finishing => dec!(0.12),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleFactors {
    pub complexity: Complexity,
    pub weather: Weather,
    pub labor_availability: LaborAvailability,
    pub roof_type: RoofType,
}

impl ScheduleFactors {
    fn site_factor(&self) -> f64 {
        self.complexity.factor() * self.weather.factor() * self.labor_availability.factor()
    }
}

/// Adjusted duration in whole days, never below one
pub fn phase_duration(phase: Phase, built_up_area: f64, factors: &ScheduleFactors) -> u32 {
    let days = match phase {
        // approvals are not affected by site conditions
        Phase::Planning => return PLANNING_DAYS,
        Phase::Mep => {
            MEP_DAYS as f64
                * factors.complexity.factor()
                * factors.labor_availability.factor()
        }
        _ => {
            let throughput = daily_throughput(phase).unwrap_or(1.0);
            let mut days = built_up_area / throughput * factors.site_factor();
            if phase == Phase::Roofing {
                days *= factors.roof_type.roofing_factor();
            }
            days
        }
    };
    ceil_units(days).max(1) as u32
}

fn scheduled(phase: Phase, duration_days: u32, start_day: u32) -> TimelinePhase {
    TimelinePhase {
        phase,
        duration_days,
        start_day,
        end_day: start_day + duration_days - 1,
        cost: Decimal::ZERO,
    }
}

pub fn estimate_timeline(built_up_area: f64, factors: &ScheduleFactors) -> Timeline {
    let mut phases = Vec::with_capacity(CRITICAL_PATH.len());
    let mut next_day = 1;
    let mut roofing_start = 1;

    for phase in CRITICAL_PATH {
        let duration = phase_duration(phase, built_up_area, factors);
        if phase == Phase::Roofing {
            roofing_start = next_day;
        }
        let entry = scheduled(phase, duration, next_day);
        next_day = entry.end_day + 1;
        phases.push(entry);
    }

    let mep = scheduled(
        Phase::Mep,
        phase_duration(Phase::Mep, built_up_area, factors),
        roofing_start,
    );

    let critical_path_days = next_day - 1;
    let total_days = critical_path_days.max(mep.end_day);

    debug!(
        "Scheduled {} critical-path days ({} total with MEP)",
        critical_path_days, total_days
    );

    Timeline {
        phases,
        parallel: vec![mep],
        critical_path_days,
        total_days,
    }
}

/// Split the grand total across phases; the last phase absorbs rounding
pub fn phase_allocations(grand_total: Decimal) -> BTreeMap<Phase, Decimal> {
    let mut allocations = BTreeMap::new();
    let mut remaining = grand_total;

    for (i, phase) in ALL_PHASES.iter().enumerate() {
        let amount = if i == ALL_PHASES.len() - 1 {
            remaining
        } else {
            round_money(grand_total * cost_share(*phase))
        };
        remaining -= amount;
        allocations.insert(*phase, amount);
    }

    allocations
}

pub fn allocate_costs(timeline: &mut Timeline, grand_total: Decimal) {
    let allocations = phase_allocations(grand_total);
    for entry in timeline.phases.iter_mut().chain(timeline.parallel.iter_mut()) {
        entry.cost = allocations
            .get(&entry.phase)
            .copied()
            .unwrap_or(Decimal::ZERO);
    }
}
