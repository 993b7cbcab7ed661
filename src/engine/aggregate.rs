use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::model::{DaySummary, EmployeeStats, GlobalSummary, GroupBy, PeriodSummary};

/// Bucket key for a date at the requested granularity. Keys sort
/// lexicographically in chronological order within each granularity.
pub fn period_key(date: NaiveDate, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => date.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        GroupBy::Month => date.format("%Y-%m").to_string(),
    }
}

/// Groups reconciled days into periods, most recent period first. Detail
/// lists keep the chronological order of the input.
pub fn aggregate_periods(details: &[DaySummary], group_by: GroupBy) -> Vec<PeriodSummary> {
    let mut buckets: BTreeMap<String, PeriodSummary> = BTreeMap::new();

    for day in details {
        let key = period_key(day.date, group_by);
        let bucket = buckets.entry(key.clone()).or_insert_with(|| PeriodSummary {
            period: key,
            days: 0,
            work_days: 0,
            leave_days: 0,
            absent_days: 0,
            total_seconds: 0,
            details: Vec::new(),
        });
        tally(bucket, day);
        bucket.details.push(day.clone());
    }

    buckets.into_values().rev().collect()
}

fn tally(bucket: &mut PeriodSummary, day: &DaySummary) {
    bucket.days += 1;
    if day.is_work_day() {
        bucket.work_days += 1;
    }
    if day.is_leave_day() {
        bucket.leave_days += 1;
    }
    if day.is_absent_day() {
        bucket.absent_days += 1;
    }
    bucket.total_seconds += day.work_seconds;
}

/// Per-employee rollup over the input days, ascending by employee id.
pub fn employee_stats(details: &[DaySummary]) -> Vec<EmployeeStats> {
    let mut by_employee: BTreeMap<u64, EmployeeStats> = BTreeMap::new();

    for day in details {
        let stats = by_employee.entry(day.employee_id).or_insert_with(|| EmployeeStats {
            employee_id: day.employee_id,
            days: 0,
            work_days: 0,
            leave_days: 0,
            absent_days: 0,
            total_seconds: 0,
            average_hours: 0.0,
        });
        stats.days += 1;
        if day.is_work_day() {
            stats.work_days += 1;
        }
        if day.is_leave_day() {
            stats.leave_days += 1;
        }
        if day.is_absent_day() {
            stats.absent_days += 1;
        }
        stats.total_seconds += day.work_seconds;
    }

    let mut all: Vec<_> = by_employee.into_values().collect();
    for stats in &mut all {
        if stats.work_days > 0 {
            stats.average_hours = stats.total_seconds as f64 / 3600.0 / stats.work_days as f64;
        }
    }
    all
}

pub fn global_summary(details: &[DaySummary]) -> GlobalSummary {
    let mut summary = GlobalSummary::default();
    for day in details {
        summary.days += 1;
        if day.is_work_day() {
            summary.work_days += 1;
        }
        if day.is_leave_day() {
            summary.leave_days += 1;
        }
        if day.is_absent_day() {
            summary.absent_days += 1;
        }
        summary.total_seconds += day.work_seconds;
    }
    summary
}
