use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::punch::{PunchEvent, PunchKind, PunchStatus};

/// Typed composite key for per-employee-per-day lookups. Replaces the
/// string `employeeId_date` keys of older systems so ids containing
/// separators can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey {
    pub employee_id: u64,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self { employee_id, date }
    }
}

/// A single punch as cached inside a day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPunch {
    pub punch_time: NaiveDateTime,
    pub status: PunchStatus,
    pub late_minutes: i64,
    pub early_minutes: i64,
}

impl From<&PunchEvent> for DayPunch {
    fn from(event: &PunchEvent) -> Self {
        Self {
            punch_time: event.punch_time,
            status: event.status,
            late_minutes: event.late_minutes,
            early_minutes: event.early_minutes,
        }
    }
}

/// All punches for one employee on one calendar date, each side kept
/// sorted ascending by timestamp. Created lazily on the first punch of
/// the day and rebuilt wholesale on full resync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub checkins: Vec<DayPunch>,
    pub checkouts: Vec<DayPunch>,
}

impl DayRecord {
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self { employee_id, date, checkins: Vec::new(), checkouts: Vec::new() }
    }

    pub fn push(&mut self, kind: PunchKind, punch: DayPunch) {
        let side = match kind {
            PunchKind::Checkin => &mut self.checkins,
            PunchKind::Checkout => &mut self.checkouts,
        };
        side.push(punch);
        side.sort_by_key(|p| p.punch_time);
    }

    pub fn earliest_checkin(&self) -> Option<&DayPunch> {
        self.checkins.first()
    }

    pub fn latest_checkout(&self) -> Option<&DayPunch> {
        self.checkouts.last()
    }

    pub fn latest_checkin(&self) -> Option<&DayPunch> {
        self.checkins.last()
    }

    pub fn earliest_checkout(&self) -> Option<&DayPunch> {
        self.checkouts.first()
    }
}
