//! Cash-flow projection - phase costs spread over the months they span
//!
//! Without a start date, months are 30-day buckets counted from day 1
//! ("Month 1", "Month 2", ...). With one, days map onto calendar months and
//! are labelled "YYYY-MM".

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::engine::types::{CashFlowMonth, Timeline};
use crate::engine::utils::split_evenly;

pub const DAYS_PER_MONTH: u32 = 30;

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// 1-based month in which the given project day falls
pub fn month_of_day(day: u32, start: Option<NaiveDate>) -> u32 {
    let day = day.max(1);
    match start {
        None => (day - 1) / DAYS_PER_MONTH + 1,
        Some(start) => {
            let date = start + Duration::days(i64::from(day - 1));
            (month_index(date) - month_index(start)) as u32 + 1
        }
    }
}

pub fn month_label(month: u32, start: Option<NaiveDate>) -> String {
    match start {
        None => format!("Month {}", month),
        Some(start) => {
            let index = month_index(start) + month as i32 - 1;
            format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
        }
    }
}

pub fn project_cash_flow(timeline: &Timeline, start: Option<NaiveDate>) -> Vec<CashFlowMonth> {
    let mut months: BTreeMap<u32, Decimal> = BTreeMap::new();

    for phase in timeline.all_phases() {
        let first = month_of_day(phase.start_day, start);
        let last = month_of_day(phase.end_day, start);
        let shares = split_evenly(phase.cost, last - first + 1);
        for (offset, amount) in shares.into_iter().enumerate() {
            *months.entry(first + offset as u32).or_insert(Decimal::ZERO) += amount;
        }
    }

    // months fully covered by a gap still appear, with nothing spent
    if let Some(&last) = months.keys().next_back() {
        for month in 1..=last {
            months.entry(month).or_insert(Decimal::ZERO);
        }
    }

    debug!("Projected cash flow over {} months", months.len());

    months
        .into_iter()
        .map(|(month, amount)| CashFlowMonth {
            month,
            label: month_label(month, start),
            amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Phase, TimelinePhase};
    use rust_decimal_macros::dec;

    fn phase(phase: Phase, start_day: u32, end_day: u32, cost: Decimal) -> TimelinePhase {
        TimelinePhase {
            phase,
            duration_days: end_day - start_day + 1,
            start_day,
            end_day,
            cost,
        }
    }

    fn timeline() -> Timeline {
        Timeline {
            phases: vec![
                phase(Phase::Planning, 1, 30, dec!(100)),
                phase(Phase::Foundation, 31, 75, dec!(1000)),
            ],
            parallel: vec![phase(Phase::Mep, 40, 50, dec!(50))],
            critical_path_days: 75,
            total_days: 75,
        }
    }

    #[test]
    fn test_month_of_day_buckets() {
        assert_eq!(month_of_day(1, None), 1);
        assert_eq!(month_of_day(30, None), 1);
        assert_eq!(month_of_day(31, None), 2);
        assert_eq!(month_of_day(61, None), 3);
    }

    #[test]
    fn test_month_of_day_calendar() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 15);

        assert_eq!(month_of_day(1, start), 1);
        assert_eq!(month_of_day(17, start), 1); // Jan 31
        assert_eq!(month_of_day(18, start), 2); // Feb 1
        assert_eq!(month_label(1, start), "2026-01");
        assert_eq!(month_label(12, start), "2026-12");
        assert_eq!(month_label(13, start), "2027-01");
    }

    #[test]
    fn test_cash_flow_sums_to_allocated_cost() {
        let timeline = timeline();
        let flow = project_cash_flow(&timeline, None);

        assert_eq!(flow.len(), 3);
        assert_eq!(
            flow.iter().map(|m| m.amount).sum::<Decimal>(),
            timeline.allocated_cost()
        );
        // foundation spans months 2 and 3, MEP sits inside month 2
        assert_eq!(flow[0].amount, dec!(100));
        assert_eq!(flow[1].amount, dec!(550));
        assert_eq!(flow[2].amount, dec!(500));
        assert_eq!(flow[0].label, "Month 1");
    }

    #[test]
    fn test_uneven_split_keeps_every_cent() {
        let timeline = Timeline {
            phases: vec![phase(Phase::Structure, 1, 90, dec!(100))],
            parallel: Vec::new(),
            critical_path_days: 90,
            total_days: 90,
        };
        let flow = project_cash_flow(&timeline, None);

        assert_eq!(flow[0].amount, dec!(33.33));
        assert_eq!(flow[2].amount, dec!(33.34));
        assert_eq!(flow.iter().map(|m| m.amount).sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_calendar_labels_follow_start_date() {
        let flow = project_cash_flow(&timeline(), NaiveDate::from_ymd_opt(2026, 11, 20));

        assert_eq!(flow[0].label, "2026-11");
        assert_eq!(flow[1].label, "2026-12");
        assert_eq!(flow.last().unwrap().label, "2027-02");
    }
}
