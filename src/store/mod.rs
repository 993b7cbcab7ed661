pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::{
    AttendanceRule, Department, DepartmentInput, Employee, EmployeeInput, LeaveRequest,
    LeaveStatus, NewLeave, NewPunch, PunchEvent, RuleInput,
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// The authoritative relational store the cache mirrors. Every write goes
/// here first; the in-memory mirror is only mutated after the store commit
/// succeeds (write-through, never write-back).
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn load_employees(&self) -> Result<Vec<Employee>, StoreError>;
    async fn load_departments(&self) -> Result<Vec<Department>, StoreError>;
    async fn load_rules(&self) -> Result<Vec<AttendanceRule>, StoreError>;
    /// Punches from `since` (inclusive) onward, ordered by employee and time.
    async fn load_punches(&self, since: NaiveDate) -> Result<Vec<PunchEvent>, StoreError>;
    /// Leave requests whose range ends on or after `since`.
    async fn load_leaves(&self, since: NaiveDate) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Appends a punch. Must enforce at-most-one punch per employee, kind
    /// and calendar day atomically (unique constraint, not read-then-write)
    /// and fail with [`StoreError::Conflict`] for the losing writer.
    async fn insert_punch(&self, punch: &NewPunch) -> Result<PunchEvent, StoreError>;

    async fn insert_leave(&self, leave: &NewLeave) -> Result<LeaveRequest, StoreError>;
    /// Pending-only transition; `Conflict` once the request was decided.
    async fn set_leave_status(
        &self,
        id: u64,
        status: LeaveStatus,
        approver_id: Option<u64>,
    ) -> Result<LeaveRequest, StoreError>;
    async fn delete_leave(&self, id: u64) -> Result<LeaveRequest, StoreError>;

    /// Saves a rule; setting `is_default` clears any previous default in
    /// the same transaction.
    async fn save_rule(&self, rule: &RuleInput) -> Result<AttendanceRule, StoreError>;

    async fn upsert_employee(&self, input: &EmployeeInput) -> Result<Employee, StoreError>;
    async fn delete_employee(&self, id: u64) -> Result<(), StoreError>;
    async fn upsert_department(&self, input: &DepartmentInput) -> Result<Department, StoreError>;
    /// Fails with `Conflict` while any employee references the department.
    async fn delete_department(&self, id: u64) -> Result<(), StoreError>;
}
