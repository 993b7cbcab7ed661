use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Working-hours rule punches are judged against. At most one rule is the
/// default at any time; saving a new default clears the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRule {
    pub id: u64,
    pub rule_name: String,
    pub checkin_time: NaiveTime,
    pub checkin_late_time: NaiveTime,
    pub checkout_time: NaiveTime,
    pub checkout_early_time: NaiveTime,
    pub is_default: bool,
}

impl AttendanceRule {
    /// Built-in rule used when the store has none configured.
    pub fn fallback() -> Self {
        Self {
            id: 0,
            rule_name: "default".into(),
            checkin_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            checkin_late_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            checkout_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            checkout_early_time: NaiveTime::from_hms_opt(17, 45, 0).unwrap(),
            is_default: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleInput {
    pub id: Option<u64>,
    pub rule_name: Option<String>,
    pub checkin_time: NaiveTime,
    pub checkin_late_time: NaiveTime,
    pub checkout_time: NaiveTime,
    pub checkout_early_time: NaiveTime,
    pub is_default: bool,
}
