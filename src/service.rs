use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::cache::query::{OP_STATS, OP_TODAY_STATS, OP_WORK_HOURS};
use crate::cache::{CacheStats, CacheStore, QueryCache, Synchronizer};
use crate::config::EngineConfig;
use crate::engine::{aggregate, reconcile_day, today_report, trend_report, DayContext};
use crate::error::{EngineError, StoreError};
use crate::model::{
    AttendanceRule, DayRecord, Department, DepartmentInput, Employee, EmployeeFilter,
    EmployeeInput, LeaveCoverage, LeaveDecision, LeaveRequest, LeaveStatus, NewLeave, NewPunch,
    PunchEvent,
    PunchKind, PunchRequest, PunchStatus, RuleInput, StatsQuery, TodayReport, TrendReport,
    WorkHoursQuery, WorkHoursReport,
};
use crate::store::BackingStore;

/// Outcome of a bulk device import: rows that hit a duplicate-punch
/// conflict or an unknown employee are skipped, not fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
}

/// Facade over the backing store, the in-memory mirror and the query
/// cache. Reads are served from the mirror; writes go to the store first
/// and are applied to the mirror only after the commit succeeds.
pub struct AttendanceService {
    store: Arc<dyn BackingStore>,
    cache: Arc<RwLock<CacheStore>>,
    sync: Arc<Synchronizer>,
    queries: QueryCache,
    config: EngineConfig,
    sync_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn BackingStore>, config: EngineConfig) -> Self {
        let cache = Arc::new(RwLock::new(CacheStore::default()));
        let sync =
            Arc::new(Synchronizer::new(store.clone(), cache.clone(), config.lookback_days));
        let queries = QueryCache::new(config.today_ttl, config.report_ttl);
        let (shutdown, _) = watch::channel(false);
        Self { store, cache, sync, queries, config, sync_task: Mutex::new(None), shutdown }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---------- lifecycle ----------

    /// Runs the initial full sync (fatal on failure: starting with an empty
    /// mirror would serve wrong answers) and spawns the periodic resync
    /// task. Later failed ticks only log; the previous snapshot stays live.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.sync.sync_all().await?;

        let sync = self.sync.clone();
        let interval = self.config.sync_interval;
        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the startup sync
            // already covered it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = sync.sync_all().await {
                            warn!(error = %e, "scheduled resync failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("resync task stopping");
                        break;
                    }
                }
            }
        });

        *self.sync_task.lock().expect("task slot poisoned") = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.sync_task.lock().expect("task slot poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// On-demand full resync, e.g. after out-of-band database edits.
    pub async fn resync(&self) -> Result<(), EngineError> {
        self.sync.sync_all().await?;
        self.queries.invalidate_reports();
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.read_cache().stats()
    }

    // ---------- mirror reads ----------

    pub fn employee(&self, id: u64) -> Result<Employee, EngineError> {
        self.read_cache()
            .employee(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("employee", id))
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.read_cache().employees()
    }

    pub fn employees_matching(&self, filter: &EmployeeFilter) -> Vec<Employee> {
        self.read_cache().employees_matching(filter)
    }

    pub fn department(&self, id: u64) -> Result<Department, EngineError> {
        self.read_cache()
            .department(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("department", id))
    }

    pub fn departments(&self) -> Vec<Department> {
        self.read_cache().departments()
    }

    pub fn rules(&self) -> Vec<AttendanceRule> {
        self.read_cache().rules()
    }

    pub fn default_rule(&self) -> AttendanceRule {
        self.read_cache().default_rule()
    }

    /// The raw punch record for one employee-day, straight from the mirror.
    /// Repeated calls without intervening writes return the same value.
    pub fn attendance(&self, employee_id: u64, date: NaiveDate) -> Option<DayRecord> {
        self.read_cache().attendance(employee_id, date).cloned()
    }

    pub fn leave(&self, employee_id: u64, date: NaiveDate) -> Option<LeaveCoverage> {
        self.read_cache().leave(employee_id, date).cloned()
    }

    // ---------- write-through mutations ----------

    /// Stamps punctuality against the default rule, commits to the store
    /// (which enforces at-most-one punch per employee, kind and day) and
    /// mirrors the committed event.
    pub async fn record_punch(&self, req: PunchRequest) -> Result<PunchEvent, EngineError> {
        let rule = {
            let cache = self.read_cache();
            if cache.employee(req.employee_id).is_none() {
                return Err(EngineError::not_found("employee", req.employee_id));
            }
            cache.default_rule()
        };

        let t = req.punch_time.time();
        let (status, late_minutes, early_minutes) = match req.kind {
            PunchKind::Checkin if t > rule.checkin_late_time => {
                (PunchStatus::Late, (t - rule.checkin_late_time).num_minutes(), 0)
            }
            PunchKind::Checkout if t < rule.checkout_early_time => {
                (PunchStatus::Early, 0, (rule.checkout_early_time - t).num_minutes())
            }
            _ => (PunchStatus::Normal, 0, 0),
        };

        let new = NewPunch {
            employee_id: req.employee_id,
            kind: req.kind,
            punch_time: req.punch_time,
            status,
            late_minutes,
            early_minutes,
            address: req.address,
            longitude: req.longitude,
            latitude: req.latitude,
        };

        let event = self.store.insert_punch(&new).await?;
        self.apply_write(|cache| cache.add_punch(&event));
        Ok(event)
    }

    /// Bulk import from a punch device. Duplicate punches and unknown
    /// employee ids are counted as skipped; any other failure aborts.
    pub async fn import_punches(
        &self,
        rows: Vec<PunchRequest>,
    ) -> Result<ImportOutcome, EngineError> {
        let mut outcome = ImportOutcome::default();
        for row in rows {
            match self.record_punch(row).await {
                Ok(_) => outcome.imported += 1,
                Err(EngineError::Conflict(msg)) => {
                    debug!(reason = %msg, "import row skipped");
                    outcome.skipped += 1;
                }
                Err(EngineError::ReferenceNotFound { kind, id }) => {
                    warn!(kind, id, "import row references unknown employee; skipped");
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(imported = outcome.imported, skipped = outcome.skipped, "punch import finished");
        Ok(outcome)
    }

    pub async fn record_leave(&self, new: NewLeave) -> Result<LeaveRequest, EngineError> {
        if new.start_date > new.end_date {
            return Err(EngineError::Validation(
                "leave start date must not be after its end date".into(),
            ));
        }
        if new.days <= 0.0 {
            return Err(EngineError::Validation("leave must cover at least part of a day".into()));
        }
        if self.read_cache().employee(new.employee_id).is_none() {
            return Err(EngineError::not_found("employee", new.employee_id));
        }

        let leave = self.store.insert_leave(&new).await?;
        self.apply_write(|cache| cache.add_leave(&leave));
        Ok(leave)
    }

    /// Approves or rejects a pending request. Decided requests are final;
    /// the store refuses a second transition with a conflict.
    pub async fn decide_leave(
        &self,
        id: u64,
        decision: LeaveDecision,
    ) -> Result<LeaveRequest, EngineError> {
        let status = if decision.approve { LeaveStatus::Approved } else { LeaveStatus::Rejected };
        let leave = self
            .store
            .set_leave_status(id, status, decision.approver_id)
            .await
            .map_err(|e| lookup(e, "leave", id))?;

        self.apply_write(|cache| match leave.status {
            LeaveStatus::Rejected => {
                cache.remove_leave(leave.employee_id, leave.start_date, leave.end_date)
            }
            _ => cache.add_leave(&leave),
        });
        Ok(leave)
    }

    pub async fn delete_leave(&self, id: u64) -> Result<LeaveRequest, EngineError> {
        let leave = self.store.delete_leave(id).await.map_err(|e| lookup(e, "leave", id))?;
        self.apply_write(|cache| {
            cache.remove_leave(leave.employee_id, leave.start_date, leave.end_date)
        });
        Ok(leave)
    }

    pub async fn save_rule(&self, input: RuleInput) -> Result<AttendanceRule, EngineError> {
        if input.checkin_late_time < input.checkin_time {
            return Err(EngineError::Validation(
                "late threshold must not precede the checkin time".into(),
            ));
        }
        if input.checkout_early_time > input.checkout_time {
            return Err(EngineError::Validation(
                "early threshold must not follow the checkout time".into(),
            ));
        }
        let rule = self.store.save_rule(&input).await?;
        self.apply_write(|cache| cache.upsert_rule(rule.clone()));
        Ok(rule)
    }

    pub async fn upsert_employee(&self, input: EmployeeInput) -> Result<Employee, EngineError> {
        let employee = self.store.upsert_employee(&input).await?;
        self.apply_write(|cache| cache.upsert_employee(employee.clone()));
        Ok(employee)
    }

    /// Deletes an employee and every cached day record and leave coverage
    /// that belonged to it.
    pub async fn delete_employee(&self, id: u64) -> Result<(), EngineError> {
        self.store.delete_employee(id).await.map_err(|e| lookup(e, "employee", id))?;
        self.apply_write(|cache| cache.remove_employee(id));
        Ok(())
    }

    pub async fn upsert_department(
        &self,
        input: DepartmentInput,
    ) -> Result<Department, EngineError> {
        let department = self.store.upsert_department(&input).await?;
        self.apply_write(|cache| cache.upsert_department(department.clone()));
        Ok(department)
    }

    pub async fn delete_department(&self, id: u64) -> Result<(), EngineError> {
        self.store.delete_department(id).await.map_err(|e| lookup(e, "department", id))?;
        self.apply_write(|cache| cache.remove_department(id));
        Ok(())
    }

    // ---------- cached reports ----------

    /// Reconciled work hours per employee and period over a date range.
    pub fn work_hours(&self, query: &WorkHoursQuery) -> Result<WorkHoursReport, EngineError> {
        if query.range.start > query.range.end {
            return Err(EngineError::Validation("range start is after its end".into()));
        }
        let key = QueryCache::cache_key(query);
        self.cached(OP_WORK_HOURS, key, || self.compute_work_hours(query))
    }

    /// Headcounts and the bounded anomaly list for the current day.
    pub fn today_stats(&self) -> Result<TodayReport, EngineError> {
        self.today_stats_on(Local::now().date_naive())
    }

    pub fn today_stats_on(&self, date: NaiveDate) -> Result<TodayReport, EngineError> {
        let key = QueryCache::cache_key(&date);
        self.cached(OP_TODAY_STATS, key, || {
            Ok(today_report(
                &self.read_cache(),
                date,
                self.config.anomaly_limit,
                self.config.absent_limit,
            ))
        })
    }

    /// Punch-level trend tables over a range, optionally per department.
    pub fn stats(&self, query: &StatsQuery) -> Result<TrendReport, EngineError> {
        if query.range.start > query.range.end {
            return Err(EngineError::Validation("range start is after its end".into()));
        }
        let key = QueryCache::cache_key(query);
        self.cached(OP_STATS, key, || Ok(trend_report(&self.read_cache(), query)))
    }

    fn compute_work_hours(&self, query: &WorkHoursQuery) -> Result<WorkHoursReport, EngineError> {
        let cache = self.read_cache();

        let employee_ids = if query.employee_ids.is_empty() {
            cache.employee_ids()
        } else {
            for &id in &query.employee_ids {
                if cache.employee(id).is_none() {
                    return Err(EngineError::not_found("employee", id));
                }
            }
            query.employee_ids.clone()
        };

        let mut details = Vec::new();
        for &id in &employee_ids {
            for date in query.range.days() {
                let today = cache.attendance(id, date);
                let leave = cache.leave(id, date);
                if !query.include_weekends
                    && is_weekend(date)
                    && today.is_none()
                    && leave.is_none()
                {
                    continue;
                }
                let ctx = DayContext {
                    employee_id: id,
                    date,
                    today,
                    prev_day: date.pred_opt().and_then(|d| cache.attendance(id, d)),
                    next_day: date.succ_opt().and_then(|d| cache.attendance(id, d)),
                    leave,
                };
                details.push(reconcile_day(&ctx, self.config.night_shift_boundary_hour));
            }
        }

        Ok(WorkHoursReport {
            employee_ids,
            employee_stats: aggregate::employee_stats(&details),
            summary: aggregate::global_summary(&details),
            period_stats: aggregate::aggregate_periods(&details, query.group_by),
        })
    }

    // ---------- internals ----------

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, CacheStore> {
        self.cache.read().expect("cache lock poisoned")
    }

    /// Mirrors a committed write and drops derived query results. A
    /// poisoned mirror is logged and left for the next resync to repair;
    /// the store commit already succeeded, so the caller never sees this.
    fn apply_write(&self, update: impl FnOnce(&mut CacheStore)) {
        match self.cache.write() {
            Ok(mut cache) => update(&mut cache),
            Err(e) => error!(error = %e, "cache mirror update skipped; next resync will repair"),
        }
        self.queries.invalidate_reports();
    }

    fn cached<T, F>(&self, op: &'static str, key: String, compute: F) -> Result<T, EngineError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, EngineError>,
    {
        if let Some(hit) = self.queries.get(op, &key) {
            if let Ok(value) = serde_json::from_value(hit.as_ref().clone()) {
                return Ok(value);
            }
        }
        let value = compute()?;
        match serde_json::to_value(&value) {
            Ok(json) => self.queries.insert(op, key, json),
            Err(e) => warn!(op, error = %e, "query result not cacheable"),
        }
        Ok(value)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn lookup(err: StoreError, kind: &'static str, id: u64) -> EngineError {
    match err {
        StoreError::NotFound => EngineError::not_found(kind, id),
        other => other.into(),
    }
}
