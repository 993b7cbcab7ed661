pub mod day_record;
pub mod department;
pub mod employee;
pub mod leave;
pub mod punch;
pub mod report;
pub mod rule;

pub use day_record::{DayKey, DayPunch, DayRecord};
pub use department::{Department, DepartmentInput};
pub use employee::{Employee, EmployeeFilter, EmployeeInput};
pub use leave::{LeaveCoverage, LeaveDecision, LeaveRequest, LeaveStatus, NewLeave};
pub use punch::{NewPunch, PunchEvent, PunchKind, PunchRequest, PunchStatus};
pub use report::{
    AbnormalStatsRow, AlertLevel, AnomalyEntry, DailyTrendRow, DateRange, DaySummary, DayStatus,
    DepartmentStatsRow, EmployeeStats, GlobalSummary, GroupBy, MonthlyStatsRow, PeriodSummary,
    PunchCounts, StatsQuery, StatusStatsRow, TodayReport, TrendReport, WorkHoursQuery,
    WorkHoursReport,
};
pub use rule::{AttendanceRule, RuleInput};
