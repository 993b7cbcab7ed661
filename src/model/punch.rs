use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Direction of a punch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PunchKind {
    Checkin,
    Checkout,
}

/// Punctuality of a single punch, judged against the default rule at
/// punch time and stored alongside the event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PunchStatus {
    Normal,
    Late,
    Early,
}

/// A committed punch event. Append-only: never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PunchEvent {
    pub id: u64,
    pub employee_id: u64,
    #[sqlx(rename = "type")]
    pub kind: PunchKind,
    pub punch_time: NaiveDateTime,
    pub status: PunchStatus,
    pub late_minutes: i64,
    pub early_minutes: i64,
    pub address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// A punch as submitted by a caller, before the engine stamps punctuality.
#[derive(Debug, Clone, Deserialize)]
pub struct PunchRequest {
    pub employee_id: u64,
    pub kind: PunchKind,
    pub punch_time: NaiveDateTime,
    pub address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// A fully-stamped punch ready for the backing store.
#[derive(Debug, Clone)]
pub struct NewPunch {
    pub employee_id: u64,
    pub kind: PunchKind,
    pub punch_time: NaiveDateTime,
    pub status: PunchStatus,
    pub late_minutes: i64,
    pub early_minutes: i64,
    pub address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}
