use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use timeclock::model::{
    DateRange, DayStatus, EmployeeInput, GroupBy, LeaveDecision, NewLeave, NewPunch, PunchKind,
    PunchRequest, PunchStatus, StatsQuery, WorkHoursQuery,
};
use timeclock::{AttendanceService, BackingStore, EngineConfig, EngineError, MemoryStore};

// Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_hms_opt(h, m, 0).unwrap()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        // Long enough that the timer never fires inside a test.
        sync_interval: Duration::from_secs(3600),
        ..EngineConfig::default()
    }
}

fn employee_input(no: u64) -> EmployeeInput {
    EmployeeInput {
        id: None,
        name: format!("employee {no}"),
        employee_no: format!("EMP-{no:03}"),
        department_id: None,
        position: None,
        phone: None,
        tags: None,
    }
}

fn punch(employee_id: u64, kind: PunchKind, time: NaiveDateTime) -> PunchRequest {
    PunchRequest { employee_id, kind, punch_time: time, address: None, longitude: None, latitude: None }
}

/// Started service over a fresh in-memory store with `n` employees whose
/// ids are 1..=n.
async fn service_with_employees(n: u64) -> (AttendanceService, Arc<MemoryStore>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    let service = AttendanceService::new(store.clone(), test_config());
    service.start().await.unwrap();
    for i in 1..=n {
        let employee = service.upsert_employee(employee_input(i)).await.unwrap();
        assert_eq!(employee.id, i);
    }
    (service, store)
}

#[tokio::test]
async fn punch_round_trip_reads_own_write() {
    let (service, _) = service_with_employees(1).await;

    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    service.record_punch(punch(1, PunchKind::Checkout, at(monday(), 18, 0))).await.unwrap();

    let day = service.attendance(1, monday()).unwrap();
    assert_eq!(day.checkins.len(), 1);
    assert_eq!(day.checkouts.len(), 1);
    assert_eq!(day.checkins[0].status, PunchStatus::Normal);

    // No intervening write, same answer.
    assert_eq!(service.attendance(1, monday()).unwrap(), day);
}

#[tokio::test]
async fn duplicate_punch_is_rejected() {
    let (service, _) = service_with_employees(1).await;

    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    let err = service
        .record_punch(punch(1, PunchKind::Checkin, at(monday(), 10, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // The losing write left no trace in the mirror.
    assert_eq!(service.attendance(1, monday()).unwrap().checkins.len(), 1);
}

#[tokio::test]
async fn punch_for_unknown_employee_is_rejected() {
    let (service, _) = service_with_employees(1).await;
    let err =
        service.record_punch(punch(42, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap_err();
    assert!(matches!(err, EngineError::ReferenceNotFound { kind: "employee", id: 42 }));
}

#[tokio::test]
async fn punctuality_is_stamped_against_the_default_rule() {
    let (service, _) = service_with_employees(3).await;

    // Built-in fallback rule: late after 09:15, early before 17:45.
    let late = service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 20))).await.unwrap();
    assert_eq!(late.status, PunchStatus::Late);
    assert_eq!(late.late_minutes, 5);

    let early =
        service.record_punch(punch(1, PunchKind::Checkout, at(monday(), 17, 30))).await.unwrap();
    assert_eq!(early.status, PunchStatus::Early);
    assert_eq!(early.early_minutes, 15);

    // Exactly on the threshold is still on time.
    let on_time =
        service.record_punch(punch(2, PunchKind::Checkin, at(monday(), 9, 15))).await.unwrap();
    assert_eq!(on_time.status, PunchStatus::Normal);
    assert_eq!(on_time.late_minutes, 0);
}

#[tokio::test]
async fn import_skips_duplicates_and_unknown_employees() {
    let (service, _) = service_with_employees(2).await;
    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();

    let outcome = service
        .import_punches(vec![
            punch(1, PunchKind::Checkin, at(monday(), 9, 5)), // duplicate
            punch(2, PunchKind::Checkin, at(monday(), 8, 55)),
            punch(99, PunchKind::Checkin, at(monday(), 9, 0)), // unknown
        ])
        .await
        .unwrap();

    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 2);
}

#[tokio::test]
async fn today_stats_split_present_leave_and_absent() {
    let (service, _) = service_with_employees(5).await;

    for id in 1..=3 {
        service.record_punch(punch(id, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    }
    let leave = service
        .record_leave(NewLeave {
            employee_id: 4,
            leave_type: "annual".into(),
            start_date: monday(),
            end_date: monday(),
            days: 1.0,
            reason: None,
        })
        .await
        .unwrap();
    service
        .decide_leave(leave.id, LeaveDecision { approve: true, approver_id: Some(1) })
        .await
        .unwrap();

    let report = service.today_stats_on(monday()).unwrap();
    assert_eq!(report.expected, 5);
    assert_eq!(report.present, 3);
    assert_eq!(report.on_leave, 1);
    assert_eq!(report.pending_leave, 0);
    assert_eq!(report.absent, 1);
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].employee_id, 5);
}

#[tokio::test]
async fn rejected_leave_no_longer_covers_the_day() {
    let (service, _) = service_with_employees(1).await;

    let leave = service
        .record_leave(NewLeave {
            employee_id: 1,
            leave_type: "sick".into(),
            start_date: monday(),
            end_date: monday(),
            days: 1.0,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(service.today_stats_on(monday()).unwrap().pending_leave, 1);

    service
        .decide_leave(leave.id, LeaveDecision { approve: false, approver_id: Some(1) })
        .await
        .unwrap();

    let report = service.today_stats_on(monday()).unwrap();
    assert_eq!(report.pending_leave, 0);
    assert_eq!(report.absent, 1);

    // Terminal state: deciding again conflicts.
    let err = service
        .decide_leave(leave.id, LeaveDecision { approve: true, approver_id: Some(1) })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn work_hours_roll_up_per_day_and_employee() {
    let (service, _) = service_with_employees(1).await;
    let tuesday = monday().succ_opt().unwrap();

    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    service.record_punch(punch(1, PunchKind::Checkout, at(monday(), 18, 0))).await.unwrap();
    service.record_punch(punch(1, PunchKind::Checkin, at(tuesday, 9, 0))).await.unwrap();
    service.record_punch(punch(1, PunchKind::Checkout, at(tuesday, 17, 0))).await.unwrap();

    let report = service
        .work_hours(&WorkHoursQuery {
            employee_ids: vec![1],
            range: DateRange { start: monday(), end: tuesday },
            group_by: GroupBy::Day,
            include_weekends: false,
        })
        .unwrap();

    assert_eq!(report.employee_stats.len(), 1);
    let stats = &report.employee_stats[0];
    assert_eq!(stats.work_days, 2);
    assert_eq!(stats.total_seconds, 17 * 3600);
    assert!((stats.average_hours - 8.5).abs() < 1e-9);

    // Most recent period first.
    assert_eq!(report.period_stats.len(), 2);
    assert_eq!(report.period_stats[0].period, "2026-03-03");
    assert_eq!(report.period_stats[0].details[0].status, DayStatus::EarlyOut);
    assert_eq!(report.period_stats[1].details[0].status, DayStatus::Normal);
}

#[tokio::test]
async fn empty_weekends_are_skipped_unless_requested() {
    let (service, _) = service_with_employees(1).await;
    let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();

    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    service.record_punch(punch(1, PunchKind::Checkout, at(monday(), 18, 0))).await.unwrap();

    let query = |include_weekends| WorkHoursQuery {
        employee_ids: vec![1],
        range: DateRange { start: monday(), end: sunday },
        group_by: GroupBy::Week,
        include_weekends,
    };

    let weekdays = service.work_hours(&query(false)).unwrap();
    assert_eq!(weekdays.summary.days, 5);
    assert_eq!(weekdays.summary.absent_days, 4);

    let full_week = service.work_hours(&query(true)).unwrap();
    assert_eq!(full_week.summary.days, 7);
    assert_eq!(full_week.summary.absent_days, 6);
}

#[tokio::test]
async fn work_hours_reject_unknown_employees() {
    let (service, _) = service_with_employees(1).await;
    let err = service
        .work_hours(&WorkHoursQuery {
            employee_ids: vec![99],
            range: DateRange { start: monday(), end: monday() },
            group_by: GroupBy::Day,
            include_weekends: false,
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::ReferenceNotFound { kind: "employee", id: 99 }));
}

#[tokio::test]
async fn reports_are_cached_until_a_write_invalidates() {
    let (service, store) = service_with_employees(1).await;

    let before = service.today_stats_on(monday()).unwrap();
    assert_eq!(before.present, 0);

    // Out-of-band store write: the cached report and the mirror both miss
    // it until a resync.
    store
        .insert_punch(&NewPunch {
            employee_id: 1,
            kind: PunchKind::Checkin,
            punch_time: at(monday(), 9, 0),
            status: PunchStatus::Normal,
            late_minutes: 0,
            early_minutes: 0,
            address: None,
            longitude: None,
            latitude: None,
        })
        .await
        .unwrap();
    assert_eq!(service.today_stats_on(monday()).unwrap().present, 0);

    service.resync().await.unwrap();
    assert_eq!(service.today_stats_on(monday()).unwrap().present, 1);

    // A write-through mutation invalidates immediately, no resync needed.
    service.record_punch(punch(1, PunchKind::Checkout, at(monday(), 18, 0))).await.unwrap();
    let report = service.today_stats_on(monday()).unwrap();
    assert_eq!(report.present, 1);
    assert!(service.attendance(1, monday()).unwrap().checkouts.len() == 1);
}

#[tokio::test]
async fn failed_resync_keeps_serving_stale_data() {
    let (service, store) = service_with_employees(2).await;

    store.set_offline(true);
    assert!(service.resync().await.is_err());

    // Stale but available beats a hard failure.
    assert_eq!(service.employees().len(), 2);
    assert_eq!(service.today_stats_on(monday()).unwrap().expected, 2);

    store.set_offline(false);
    service.resync().await.unwrap();
    assert_eq!(service.employees().len(), 2);
}

#[tokio::test]
async fn trend_stats_count_punch_statuses() {
    let (service, _) = service_with_employees(2).await;

    service.record_punch(punch(1, PunchKind::Checkin, at(monday(), 9, 30))).await.unwrap();
    service.record_punch(punch(2, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();
    service.record_punch(punch(2, PunchKind::Checkout, at(monday(), 18, 0))).await.unwrap();

    let report = service
        .stats(&StatsQuery {
            range: DateRange { start: monday(), end: monday() },
            department_id: None,
        })
        .unwrap();

    assert_eq!(report.daily_trend.len(), 1);
    assert_eq!(report.daily_trend[0].counts.checkin_count, 2);
    assert_eq!(report.daily_trend[0].counts.late_count, 1);
    assert_eq!(report.abnormal_stats.len(), 1);
    assert_eq!(report.abnormal_stats[0].employee_id, 1);
    assert_eq!(report.abnormal_stats[0].total_late_minutes, 15);
}

#[tokio::test]
async fn deleting_an_employee_cascades_through_reports() {
    let (service, _) = service_with_employees(2).await;
    service.record_punch(punch(2, PunchKind::Checkin, at(monday(), 9, 0))).await.unwrap();

    service.delete_employee(2).await.unwrap();

    assert!(matches!(service.employee(2), Err(EngineError::ReferenceNotFound { .. })));
    assert!(service.attendance(2, monday()).is_none());
    let report = service.today_stats_on(monday()).unwrap();
    assert_eq!(report.expected, 1);
    assert_eq!(report.present, 0);
}

#[tokio::test]
async fn service_stops_cleanly() {
    let (service, _) = service_with_employees(1).await;
    service.stop().await;
    // Reads keep working off the last snapshot after shutdown.
    assert_eq!(service.employees().len(), 1);
}
