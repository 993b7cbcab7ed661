use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Terminal once approved or rejected; no further transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: String,
    /// Inclusive range.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: f64,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub approve_remark: Option<String>,
}

/// One calendar day of a leave request, expanded for per-date lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveCoverage {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub leave_type: String,
    pub status: LeaveStatus,
    pub days: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLeave {
    pub employee_id: u64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: f64,
    pub reason: Option<String>,
}

/// Approve-or-reject decision on a pending request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LeaveDecision {
    pub approve: bool,
    pub approver_id: Option<u64>,
}
