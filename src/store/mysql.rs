use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::StreamExt;
use sqlx::MySqlPool;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{
    AttendanceRule, Department, DepartmentInput, Employee, EmployeeInput, LeaveRequest,
    LeaveStatus, NewLeave, NewPunch, PunchEvent, RuleInput,
};

use super::BackingStore;

/// MySQL-backed implementation of [`BackingStore`]. Schema and migrations
/// are owned by the store side; this type only speaks the query surface.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = MySqlPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    async fn fetch_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let leave = sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT id, employee_id, leave_type, start_date, end_date, days,
                   reason, status, approver_id, approve_remark
            FROM leave_requests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(leave)
    }
}

/// MySQL reports unique-key and foreign-key violations as SQLSTATE 23000.
fn map_constraint(err: sqlx::Error, conflict_msg: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Conflict(conflict_msg.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BackingStore for MySqlStore {
    async fn load_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, Employee>(
            "SELECT id, name, employee_no, department_id, position, phone, tags FROM employees",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn load_departments(&self) -> Result<Vec<Department>, StoreError> {
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name, code, description FROM departments",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn load_rules(&self) -> Result<Vec<AttendanceRule>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRule>(
            r#"
            SELECT id, rule_name, checkin_time, checkin_late_time,
                   checkout_time, checkout_early_time, is_default
            FROM attendance_rules
            ORDER BY is_default DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn load_punches(&self, since: NaiveDate) -> Result<Vec<PunchEvent>, StoreError> {
        // The lookback window can hold a lot of rows; stream instead of
        // buffering the whole result set inside the driver.
        let mut stream = sqlx::query_as::<_, PunchEvent>(
            r#"
            SELECT id, employee_id, `type`, punch_time, status,
                   late_minutes, early_minutes, address, longitude, latitude
            FROM attendance
            WHERE DATE(punch_time) >= ?
            ORDER BY employee_id, punch_time ASC
            "#,
        )
        .bind(since)
        .fetch(&self.pool);

        let mut punches = Vec::new();
        while let Some(row) = stream.next().await {
            punches.push(row?);
        }
        debug!(count = punches.len(), %since, "loaded punch window");
        Ok(punches)
    }

    async fn load_leaves(&self, since: NaiveDate) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT id, employee_id, leave_type, start_date, end_date, days,
                   reason, status, approver_id, approve_remark
            FROM leave_requests
            WHERE end_date >= ?
            ORDER BY employee_id, start_date ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_punch(&self, punch: &NewPunch) -> Result<PunchEvent, StoreError> {
        // The unique index over (employee_id, type, punch date) makes the
        // "already punched today" guard atomic; a racing duplicate loses
        // here rather than in a read-then-write check.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, `type`, punch_time, status, late_minutes,
                 early_minutes, address, longitude, latitude)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(punch.employee_id)
        .bind(punch.kind)
        .bind(punch.punch_time)
        .bind(punch.status)
        .bind(punch.late_minutes)
        .bind(punch.early_minutes)
        .bind(&punch.address)
        .bind(punch.longitude)
        .bind(punch.latitude)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "punch of this kind already recorded for the day"))?;

        Ok(PunchEvent {
            id: result.last_insert_id(),
            employee_id: punch.employee_id,
            kind: punch.kind,
            punch_time: punch.punch_time,
            status: punch.status,
            late_minutes: punch.late_minutes,
            early_minutes: punch.early_minutes,
            address: punch.address.clone(),
            longitude: punch.longitude,
            latitude: punch.latitude,
        })
    }

    async fn insert_leave(&self, leave: &NewLeave) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(leave.employee_id)
        .bind(&leave.leave_type)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.days)
        .bind(&leave.reason)
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            employee_id: leave.employee_id,
            leave_type: leave.leave_type.clone(),
            start_date: leave.start_date,
            end_date: leave.end_date,
            days: leave.days,
            reason: leave.reason.clone(),
            status: LeaveStatus::Pending,
            approver_id: None,
            approve_remark: None,
        })
    }

    async fn set_leave_status(
        &self,
        id: u64,
        status: LeaveStatus,
        approver_id: Option<u64>,
    ) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(approver_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch_leave(id).await? {
                Some(_) => Err(StoreError::Conflict("leave request already processed".into())),
                None => Err(StoreError::NotFound),
            };
        }

        self.fetch_leave(id).await?.ok_or(StoreError::NotFound)
    }

    async fn delete_leave(&self, id: u64) -> Result<LeaveRequest, StoreError> {
        let leave = self.fetch_leave(id).await?.ok_or(StoreError::NotFound)?;
        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(leave)
    }

    async fn save_rule(&self, rule: &RuleInput) -> Result<AttendanceRule, StoreError> {
        // Default-swap must be atomic so readers never see zero or two
        // default rules.
        let mut tx = self.pool.begin().await?;

        if rule.is_default {
            let clear = match rule.id {
                Some(id) => sqlx::query(
                    "UPDATE attendance_rules SET is_default = 0 WHERE is_default = 1 AND id != ?",
                )
                .bind(id),
                None => sqlx::query("UPDATE attendance_rules SET is_default = 0 WHERE is_default = 1"),
            };
            clear.execute(&mut *tx).await?;
        }

        let rule_name = rule.rule_name.clone().unwrap_or_else(|| "default".into());
        let id = match rule.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE attendance_rules
                    SET rule_name = ?, checkin_time = ?, checkin_late_time = ?,
                        checkout_time = ?, checkout_early_time = ?, is_default = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&rule_name)
                .bind(rule.checkin_time)
                .bind(rule.checkin_late_time)
                .bind(rule.checkout_time)
                .bind(rule.checkout_early_time)
                .bind(rule.is_default)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO attendance_rules
                        (rule_name, checkin_time, checkin_late_time,
                         checkout_time, checkout_early_time, is_default)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&rule_name)
                .bind(rule.checkin_time)
                .bind(rule.checkin_late_time)
                .bind(rule.checkout_time)
                .bind(rule.checkout_early_time)
                .bind(rule.is_default)
                .execute(&mut *tx)
                .await?;
                result.last_insert_id()
            }
        };

        tx.commit().await?;

        Ok(AttendanceRule {
            id,
            rule_name,
            checkin_time: rule.checkin_time,
            checkin_late_time: rule.checkin_late_time,
            checkout_time: rule.checkout_time,
            checkout_early_time: rule.checkout_early_time,
            is_default: rule.is_default,
        })
    }

    async fn upsert_employee(&self, input: &EmployeeInput) -> Result<Employee, StoreError> {
        let id = match input.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE employees
                    SET name = ?, employee_no = ?, department_id = ?,
                        position = ?, phone = ?, tags = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.name)
                .bind(&input.employee_no)
                .bind(input.department_id)
                .bind(&input.position)
                .bind(&input.phone)
                .bind(&input.tags)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_constraint(e, "employee_no already in use"))?;
                id
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO employees
                        (name, employee_no, department_id, position, phone, tags)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.name)
                .bind(&input.employee_no)
                .bind(input.department_id)
                .bind(&input.position)
                .bind(&input.phone)
                .bind(&input.tags)
                .execute(&self.pool)
                .await
                .map_err(|e| map_constraint(e, "employee_no already in use"))?;
                result.last_insert_id()
            }
        };

        Ok(Employee {
            id,
            name: input.name.clone(),
            employee_no: input.employee_no.clone(),
            department_id: input.department_id,
            position: input.position.clone(),
            phone: input.phone.clone(),
            tags: input.tags.clone(),
        })
    }

    async fn delete_employee(&self, id: u64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_department(&self, input: &DepartmentInput) -> Result<Department, StoreError> {
        let id = match input.id {
            Some(id) => {
                sqlx::query(
                    "UPDATE departments SET name = ?, code = ?, description = ? WHERE id = ?",
                )
                .bind(&input.name)
                .bind(&input.code)
                .bind(&input.description)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_constraint(e, "department code already in use"))?;
                id
            }
            None => {
                let result =
                    sqlx::query("INSERT INTO departments (name, code, description) VALUES (?, ?, ?)")
                        .bind(&input.name)
                        .bind(&input.code)
                        .bind(&input.description)
                        .execute(&self.pool)
                        .await
                        .map_err(|e| map_constraint(e, "department code already in use"))?;
                result.last_insert_id()
            }
        };

        Ok(Department {
            id,
            name: input.name.clone(),
            code: input.code.clone(),
            description: input.description.clone(),
        })
    }

    async fn delete_department(&self, id: u64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "department still has employees"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
