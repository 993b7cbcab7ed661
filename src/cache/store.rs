use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::model::{
    AttendanceRule, DateRange, DayKey, DayPunch, DayRecord, Department, Employee, EmployeeFilter,
    LeaveCoverage, LeaveRequest, PunchEvent,
};

/// In-memory mirror of reference and event data. Owned exclusively by the
/// synchronizer; everything else reads snapshots through the service and
/// never mutates the maps directly.
#[derive(Debug, Default)]
pub struct CacheStore {
    employees: HashMap<u64, Employee>,
    departments: HashMap<u64, Department>,
    rules: HashMap<u64, AttendanceRule>,
    attendance: HashMap<DayKey, DayRecord>,
    leaves: HashMap<DayKey, LeaveCoverage>,
    last_sync: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub employees: usize,
    pub departments: usize,
    pub rules: usize,
    pub attendance_days: usize,
    pub leave_days: usize,
    pub last_sync: Option<NaiveDateTime>,
}

impl CacheStore {
    /// Builds a full replacement snapshot from bulk-loaded rows. The result
    /// is swapped in whole so readers never observe a partial map.
    pub fn build(
        employees: Vec<Employee>,
        departments: Vec<Department>,
        rules: Vec<AttendanceRule>,
        punches: Vec<PunchEvent>,
        leaves: Vec<LeaveRequest>,
    ) -> Self {
        let mut store = Self {
            employees: employees.into_iter().map(|e| (e.id, e)).collect(),
            departments: departments.into_iter().map(|d| (d.id, d)).collect(),
            rules: rules.into_iter().map(|r| (r.id, r)).collect(),
            attendance: HashMap::new(),
            leaves: HashMap::new(),
            last_sync: Some(Utc::now().naive_utc()),
        };
        for punch in &punches {
            store.add_punch(punch);
        }
        for leave in &leaves {
            store.add_leave(leave);
        }
        store
    }

    // ---------- reference reads ----------

    pub fn employee(&self, id: u64) -> Option<&Employee> {
        self.employees.get(&id)
    }

    pub fn employees(&self) -> Vec<Employee> {
        let mut all: Vec<_> = self.employees.values().cloned().collect();
        all.sort_by_key(|e| e.id);
        all
    }

    pub fn employee_ids(&self) -> Vec<u64> {
        let mut ids: Vec<_> = self.employees.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn employees_matching(&self, filter: &EmployeeFilter) -> Vec<Employee> {
        let mut matched: Vec<_> =
            self.employees.values().filter(|e| filter.matches(e)).cloned().collect();
        matched.sort_by_key(|e| e.id);
        matched
    }

    pub fn department(&self, id: u64) -> Option<&Department> {
        self.departments.get(&id)
    }

    pub fn departments(&self) -> Vec<Department> {
        let mut all: Vec<_> = self.departments.values().cloned().collect();
        all.sort_by_key(|d| d.id);
        all
    }

    pub fn rule(&self, id: u64) -> Option<&AttendanceRule> {
        self.rules.get(&id)
    }

    pub fn rules(&self) -> Vec<AttendanceRule> {
        let mut all: Vec<_> = self.rules.values().cloned().collect();
        all.sort_by_key(|r| (!r.is_default, r.id));
        all
    }

    /// The default rule, falling back to the lowest-id rule and finally the
    /// built-in defaults when nothing is configured.
    pub fn default_rule(&self) -> AttendanceRule {
        self.rules
            .values()
            .find(|r| r.is_default)
            .or_else(|| self.rules.values().min_by_key(|r| r.id))
            .cloned()
            .unwrap_or_else(AttendanceRule::fallback)
    }

    // ---------- event reads ----------

    pub fn attendance(&self, employee_id: u64, date: NaiveDate) -> Option<&DayRecord> {
        self.attendance.get(&DayKey::new(employee_id, date))
    }

    pub fn attendance_range(&self, employee_ids: &[u64], range: DateRange) -> Vec<&DayRecord> {
        let mut records = Vec::new();
        for date in range.days() {
            for &id in employee_ids {
                if let Some(day) = self.attendance.get(&DayKey::new(id, date)) {
                    records.push(day);
                }
            }
        }
        records
    }

    pub fn leave(&self, employee_id: u64, date: NaiveDate) -> Option<&LeaveCoverage> {
        self.leaves.get(&DayKey::new(employee_id, date))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            employees: self.employees.len(),
            departments: self.departments.len(),
            rules: self.rules.len(),
            attendance_days: self.attendance.len(),
            leave_days: self.leaves.len(),
            last_sync: self.last_sync,
        }
    }

    // ---------- incremental mutations (write-through targets) ----------

    /// Appends a punch into the day record for its calendar date, creating
    /// the record lazily and keeping both sides time-sorted.
    pub fn add_punch(&mut self, punch: &PunchEvent) {
        let key = DayKey::new(punch.employee_id, punch.punch_time.date());
        let day = self
            .attendance
            .entry(key)
            .or_insert_with(|| DayRecord::new(key.employee_id, key.date));
        day.push(punch.kind, DayPunch::from(punch));
    }

    pub fn upsert_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    /// Removes an employee along with every cached day record and leave
    /// coverage that belongs to it.
    pub fn remove_employee(&mut self, employee_id: u64) {
        self.employees.remove(&employee_id);
        self.attendance.retain(|key, _| key.employee_id != employee_id);
        self.leaves.retain(|key, _| key.employee_id != employee_id);
    }

    pub fn upsert_department(&mut self, department: Department) {
        self.departments.insert(department.id, department);
    }

    pub fn remove_department(&mut self, department_id: u64) {
        self.departments.remove(&department_id);
    }

    /// Saves a rule, clearing the previous default when this one becomes
    /// the default (the store already swapped atomically; mirror it).
    pub fn upsert_rule(&mut self, rule: AttendanceRule) {
        if rule.is_default {
            for existing in self.rules.values_mut() {
                if existing.id != rule.id {
                    existing.is_default = false;
                }
            }
        }
        self.rules.insert(rule.id, rule);
    }

    /// Expands a leave request into one coverage entry per covered date.
    pub fn add_leave(&mut self, leave: &LeaveRequest) {
        let mut date = leave.start_date;
        while date <= leave.end_date {
            self.leaves.insert(
                DayKey::new(leave.employee_id, date),
                LeaveCoverage {
                    employee_id: leave.employee_id,
                    date,
                    leave_type: leave.leave_type.clone(),
                    status: leave.status,
                    days: leave.days,
                },
            );
            date = date.succ_opt().expect("date overflow");
        }
    }

    pub fn remove_leave(&mut self, employee_id: u64, start: NaiveDate, end: NaiveDate) {
        let mut date = start;
        while date <= end {
            self.leaves.remove(&DayKey::new(employee_id, date));
            date = date.succ_opt().expect("date overflow");
        }
    }
}
