use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Outcome of reconciling one employee-day. Duration anomalies and
/// leave/absence are statuses here, never errors: a day that cannot be
/// reconciled must not abort the surrounding aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    #[strum(serialize = "normal")]
    Normal,
    #[strum(serialize = "late")]
    Late,
    #[strum(serialize = "early leave")]
    EarlyOut,
    #[strum(serialize = "late + early leave")]
    LateEarlyOut,
    #[strum(serialize = "night shift")]
    NightShift,
    #[strum(serialize = "cross-day")]
    CrossDay,
    #[strum(serialize = "data anomaly")]
    DataAnomaly,
    #[strum(serialize = "data anomaly (cross-day)")]
    CrossDayAnomaly,
    #[strum(serialize = "not clocked out")]
    MissingCheckout,
    #[strum(serialize = "not clocked in")]
    MissingCheckin,
    #[strum(serialize = "on leave")]
    OnLeave,
    #[strum(serialize = "pending approval")]
    LeavePending,
    #[strum(serialize = "absent")]
    Absent,
}

/// Reconciled view of one employee-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub checkin_time: Option<NaiveDateTime>,
    pub checkout_time: Option<NaiveDateTime>,
    pub work_seconds: i64,
    pub status: DayStatus,
    pub leave_type: Option<String>,
}

impl DaySummary {
    pub fn is_work_day(&self) -> bool {
        self.work_seconds > 0
    }

    pub fn is_leave_day(&self) -> bool {
        matches!(self.status, DayStatus::OnLeave | DayStatus::LeavePending)
    }

    pub fn is_absent_day(&self) -> bool {
        self.status == DayStatus::Absent
    }
}

/// Reporting granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    Month,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One day/week/month bucket of reconciled days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: String,
    pub days: usize,
    pub work_days: usize,
    pub leave_days: usize,
    pub absent_days: usize,
    pub total_seconds: i64,
    pub details: Vec<DaySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStats {
    pub employee_id: u64,
    pub days: usize,
    pub work_days: usize,
    pub leave_days: usize,
    pub absent_days: usize,
    pub total_seconds: i64,
    /// total hours / work days; zero when there are no work days.
    pub average_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub days: usize,
    pub work_days: usize,
    pub leave_days: usize,
    pub absent_days: usize,
    pub total_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkHoursQuery {
    /// Empty means every cached employee.
    pub employee_ids: Vec<u64>,
    pub range: DateRange,
    pub group_by: GroupBy,
    /// When false, weekend days without punches or leave are skipped
    /// instead of counted absent.
    pub include_weekends: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursReport {
    pub employee_ids: Vec<u64>,
    pub employee_stats: Vec<EmployeeStats>,
    pub summary: GlobalSummary,
    pub period_stats: Vec<PeriodSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
}

/// One entry in the bounded today-anomaly list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub employee_id: u64,
    pub name: String,
    pub department: Option<String>,
    pub status: DayStatus,
    pub punch_time: Option<NaiveDateTime>,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayReport {
    pub date: NaiveDate,
    pub expected: usize,
    pub present: usize,
    pub absent: usize,
    pub on_leave: usize,
    pub pending_leave: usize,
    pub anomalies: Vec<AnomalyEntry>,
    pub alert: AlertLevel,
    pub alert_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsQuery {
    pub range: DateRange,
    pub department_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PunchCounts {
    pub checkin_count: usize,
    pub checkout_count: usize,
    pub late_count: usize,
    pub early_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrendRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: PunchCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStatsRow {
    pub department: String,
    #[serde(flatten)]
    pub counts: PunchCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStatsRow {
    pub status: super::punch::PunchStatus,
    pub count: usize,
}

/// Per-employee late/early tally, worst offenders first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbnormalStatsRow {
    pub employee_id: u64,
    pub name: String,
    pub employee_no: String,
    pub late_count: usize,
    pub early_count: usize,
    pub total_late_minutes: i64,
    pub total_early_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatsRow {
    pub month: String,
    #[serde(flatten)]
    pub counts: PunchCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub daily_trend: Vec<DailyTrendRow>,
    pub department_stats: Vec<DepartmentStatsRow>,
    pub status_stats: Vec<StatusStatsRow>,
    pub abnormal_stats: Vec<AbnormalStatsRow>,
    pub monthly_stats: Vec<MonthlyStatsRow>,
}
