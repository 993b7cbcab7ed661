use std::collections::BTreeMap;

use crate::cache::CacheStore;
use crate::model::{
    AbnormalStatsRow, DailyTrendRow, DayRecord, DepartmentStatsRow, MonthlyStatsRow, PunchCounts,
    PunchStatus, StatsQuery, StatusStatsRow, TrendReport,
};

const ABNORMAL_TOP_N: usize = 10;

/// Punch-level statistics over a date range, optionally scoped to one
/// department. Every table is derived from the same walk over the cached
/// day records, so the numbers always agree with each other.
pub fn trend_report(cache: &CacheStore, query: &StatsQuery) -> TrendReport {
    let employees: Vec<_> = cache
        .employees()
        .into_iter()
        .filter(|e| query.department_id.is_none() || e.department_id == query.department_id)
        .collect();

    let mut daily: BTreeMap<chrono::NaiveDate, PunchCounts> = BTreeMap::new();
    let mut by_department: BTreeMap<String, PunchCounts> = BTreeMap::new();
    let mut by_status: BTreeMap<&'static str, (PunchStatus, usize)> = BTreeMap::new();
    let mut by_month: BTreeMap<String, PunchCounts> = BTreeMap::new();
    let mut abnormal: BTreeMap<u64, AbnormalStatsRow> = BTreeMap::new();

    for employee in &employees {
        let department = employee
            .department_id
            .and_then(|id| cache.department(id))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "unassigned".to_string());

        for date in query.range.days() {
            let Some(day) = cache.attendance(employee.id, date) else {
                continue;
            };
            let counts = day_counts(day);

            merge(daily.entry(date).or_default(), &counts);
            merge(by_department.entry(department.clone()).or_default(), &counts);
            merge(by_month.entry(date.format("%Y-%m").to_string()).or_default(), &counts);

            for punch in day.checkins.iter().chain(day.checkouts.iter()) {
                let slot = by_status
                    .entry(status_label(punch.status))
                    .or_insert((punch.status, 0));
                slot.1 += 1;
            }

            if counts.late_count > 0 || counts.early_count > 0 {
                let row = abnormal.entry(employee.id).or_insert_with(|| AbnormalStatsRow {
                    employee_id: employee.id,
                    name: employee.name.clone(),
                    employee_no: employee.employee_no.clone(),
                    late_count: 0,
                    early_count: 0,
                    total_late_minutes: 0,
                    total_early_minutes: 0,
                });
                row.late_count += counts.late_count;
                row.early_count += counts.early_count;
                row.total_late_minutes +=
                    day.checkins.iter().map(|p| p.late_minutes).sum::<i64>();
                row.total_early_minutes +=
                    day.checkouts.iter().map(|p| p.early_minutes).sum::<i64>();
            }
        }
    }

    let mut abnormal_stats: Vec<_> = abnormal.into_values().collect();
    abnormal_stats.sort_by(|a, b| {
        (b.late_count + b.early_count)
            .cmp(&(a.late_count + a.early_count))
            .then(a.employee_id.cmp(&b.employee_id))
    });
    abnormal_stats.truncate(ABNORMAL_TOP_N);

    TrendReport {
        daily_trend: daily
            .into_iter()
            .map(|(date, counts)| DailyTrendRow { date, counts })
            .collect(),
        department_stats: by_department
            .into_iter()
            .map(|(department, counts)| DepartmentStatsRow { department, counts })
            .collect(),
        status_stats: by_status
            .into_values()
            .map(|(status, count)| StatusStatsRow { status, count })
            .collect(),
        abnormal_stats,
        monthly_stats: by_month
            .into_iter()
            .map(|(month, counts)| MonthlyStatsRow { month, counts })
            .collect(),
    }
}

fn day_counts(day: &DayRecord) -> PunchCounts {
    PunchCounts {
        checkin_count: day.checkins.len(),
        checkout_count: day.checkouts.len(),
        late_count: day.checkins.iter().filter(|p| p.status == PunchStatus::Late).count(),
        early_count: day.checkouts.iter().filter(|p| p.status == PunchStatus::Early).count(),
    }
}

fn merge(into: &mut PunchCounts, from: &PunchCounts) {
    into.checkin_count += from.checkin_count;
    into.checkout_count += from.checkout_count;
    into.late_count += from.late_count;
    into.early_count += from.early_count;
}

fn status_label(status: PunchStatus) -> &'static str {
    match status {
        PunchStatus::Normal => "normal",
        PunchStatus::Late => "late",
        PunchStatus::Early => "early",
    }
}
