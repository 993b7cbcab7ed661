use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;
use crate::model::{
    AttendanceRule, Department, DepartmentInput, Employee, EmployeeInput, LeaveRequest,
    LeaveStatus, NewLeave, NewPunch, PunchEvent, RuleInput,
};

use super::BackingStore;

#[derive(Default)]
struct Inner {
    employees: Vec<Employee>,
    departments: Vec<Department>,
    rules: Vec<AttendanceRule>,
    punches: Vec<PunchEvent>,
    leaves: Vec<LeaveRequest>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`BackingStore`]. The authoritative store for tests and for
/// embedding the engine without a database; the same single-writer
/// uniqueness rules apply as in the MySQL implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`StoreError::Unavailable`] until
    /// switched back, for exercising resync failure paths.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn load_employees(&self) -> Result<Vec<Employee>, StoreError> {
        self.check_online()?;
        Ok(self.lock().employees.clone())
    }

    async fn load_departments(&self) -> Result<Vec<Department>, StoreError> {
        self.check_online()?;
        Ok(self.lock().departments.clone())
    }

    async fn load_rules(&self) -> Result<Vec<AttendanceRule>, StoreError> {
        self.check_online()?;
        Ok(self.lock().rules.clone())
    }

    async fn load_punches(&self, since: NaiveDate) -> Result<Vec<PunchEvent>, StoreError> {
        self.check_online()?;
        let mut punches: Vec<_> = self
            .lock()
            .punches
            .iter()
            .filter(|p| p.punch_time.date() >= since)
            .cloned()
            .collect();
        punches.sort_by_key(|p| (p.employee_id, p.punch_time));
        Ok(punches)
    }

    async fn load_leaves(&self, since: NaiveDate) -> Result<Vec<LeaveRequest>, StoreError> {
        self.check_online()?;
        Ok(self.lock().leaves.iter().filter(|l| l.end_date >= since).cloned().collect())
    }

    async fn insert_punch(&self, punch: &NewPunch) -> Result<PunchEvent, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        // Uniqueness check and insert happen under one lock, so a racing
        // duplicate deterministically loses.
        let duplicate = inner.punches.iter().any(|p| {
            p.employee_id == punch.employee_id
                && p.kind == punch.kind
                && p.punch_time.date() == punch.punch_time.date()
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "punch of this kind already recorded for the day".into(),
            ));
        }
        let event = PunchEvent {
            id: inner.next_id(),
            employee_id: punch.employee_id,
            kind: punch.kind,
            punch_time: punch.punch_time,
            status: punch.status,
            late_minutes: punch.late_minutes,
            early_minutes: punch.early_minutes,
            address: punch.address.clone(),
            longitude: punch.longitude,
            latitude: punch.latitude,
        };
        inner.punches.push(event.clone());
        Ok(event)
    }

    async fn insert_leave(&self, leave: &NewLeave) -> Result<LeaveRequest, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        let request = LeaveRequest {
            id: inner.next_id(),
            employee_id: leave.employee_id,
            leave_type: leave.leave_type.clone(),
            start_date: leave.start_date,
            end_date: leave.end_date,
            days: leave.days,
            reason: leave.reason.clone(),
            status: LeaveStatus::Pending,
            approver_id: None,
            approve_remark: None,
        };
        inner.leaves.push(request.clone());
        Ok(request)
    }

    async fn set_leave_status(
        &self,
        id: u64,
        status: LeaveStatus,
        approver_id: Option<u64>,
    ) -> Result<LeaveRequest, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        let leave = inner
            .leaves
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::NotFound)?;
        if leave.status != LeaveStatus::Pending {
            return Err(StoreError::Conflict("leave request already processed".into()));
        }
        leave.status = status;
        leave.approver_id = approver_id;
        Ok(leave.clone())
    }

    async fn delete_leave(&self, id: u64) -> Result<LeaveRequest, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        let pos = inner.leaves.iter().position(|l| l.id == id).ok_or(StoreError::NotFound)?;
        Ok(inner.leaves.remove(pos))
    }

    async fn save_rule(&self, rule: &RuleInput) -> Result<AttendanceRule, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if rule.is_default {
            for existing in &mut inner.rules {
                if Some(existing.id) != rule.id {
                    existing.is_default = false;
                }
            }
        }
        let saved = AttendanceRule {
            id: rule.id.unwrap_or(0),
            rule_name: rule.rule_name.clone().unwrap_or_else(|| "default".into()),
            checkin_time: rule.checkin_time,
            checkin_late_time: rule.checkin_late_time,
            checkout_time: rule.checkout_time,
            checkout_early_time: rule.checkout_early_time,
            is_default: rule.is_default,
        };
        match rule.id {
            Some(id) => {
                let existing =
                    inner.rules.iter_mut().find(|r| r.id == id).ok_or(StoreError::NotFound)?;
                *existing = saved.clone();
                Ok(saved)
            }
            None => {
                let mut saved = saved;
                saved.id = inner.next_id();
                inner.rules.push(saved.clone());
                Ok(saved)
            }
        }
    }

    async fn upsert_employee(&self, input: &EmployeeInput) -> Result<Employee, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if inner
            .employees
            .iter()
            .any(|e| e.employee_no == input.employee_no && Some(e.id) != input.id)
        {
            return Err(StoreError::Conflict("employee_no already in use".into()));
        }
        let employee = Employee {
            id: input.id.unwrap_or(0),
            name: input.name.clone(),
            employee_no: input.employee_no.clone(),
            department_id: input.department_id,
            position: input.position.clone(),
            phone: input.phone.clone(),
            tags: input.tags.clone(),
        };
        match input.id {
            Some(id) => {
                let existing =
                    inner.employees.iter_mut().find(|e| e.id == id).ok_or(StoreError::NotFound)?;
                *existing = employee.clone();
                Ok(employee)
            }
            None => {
                let mut employee = employee;
                employee.id = inner.next_id();
                inner.employees.push(employee.clone());
                Ok(employee)
            }
        }
    }

    async fn delete_employee(&self, id: u64) -> Result<(), StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        let pos = inner.employees.iter().position(|e| e.id == id).ok_or(StoreError::NotFound)?;
        inner.employees.remove(pos);
        Ok(())
    }

    async fn upsert_department(&self, input: &DepartmentInput) -> Result<Department, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if inner.departments.iter().any(|d| d.code == input.code && Some(d.id) != input.id) {
            return Err(StoreError::Conflict("department code already in use".into()));
        }
        let department = Department {
            id: input.id.unwrap_or(0),
            name: input.name.clone(),
            code: input.code.clone(),
            description: input.description.clone(),
        };
        match input.id {
            Some(id) => {
                let existing = inner
                    .departments
                    .iter_mut()
                    .find(|d| d.id == id)
                    .ok_or(StoreError::NotFound)?;
                *existing = department.clone();
                Ok(department)
            }
            None => {
                let mut department = department;
                department.id = inner.next_id();
                inner.departments.push(department.clone());
                Ok(department)
            }
        }
    }

    async fn delete_department(&self, id: u64) -> Result<(), StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if inner.employees.iter().any(|e| e.department_id == Some(id)) {
            return Err(StoreError::Conflict("department still has employees".into()));
        }
        let pos = inner.departments.iter().position(|d| d.id == id).ok_or(StoreError::NotFound)?;
        inner.departments.remove(pos);
        Ok(())
    }
}
