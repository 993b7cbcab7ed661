use chrono::NaiveDate;

use crate::cache::CacheStore;
use crate::model::{AlertLevel, AnomalyEntry, DayStatus, LeaveStatus, PunchStatus, TodayReport};

/// Snapshot of "today": headcounts plus a bounded anomaly list. Late and
/// early entries come first (capped at `anomaly_limit`), then absentees
/// (capped at `absent_limit`); the alert counts are never capped.
pub fn today_report(
    cache: &CacheStore,
    date: NaiveDate,
    anomaly_limit: usize,
    absent_limit: usize,
) -> TodayReport {
    let employees = cache.employees();
    let expected = employees.len();

    let mut present = 0;
    let mut on_leave = 0;
    let mut pending_leave = 0;
    let mut late_count = 0;
    let mut early_count = 0;
    let mut punctuality_anomalies = Vec::new();
    let mut absentees = Vec::new();

    for employee in &employees {
        let department = employee
            .department_id
            .and_then(|id| cache.department(id))
            .map(|d| d.name.clone());
        let day = cache.attendance(employee.id, date);
        let is_present = day.is_some_and(|d| !d.checkins.is_empty());

        if is_present {
            present += 1;
        }

        if let Some(day) = day {
            if let Some(checkin) = day.earliest_checkin() {
                if checkin.status == PunchStatus::Late {
                    late_count += 1;
                    punctuality_anomalies.push(AnomalyEntry {
                        employee_id: employee.id,
                        name: employee.name.clone(),
                        department: department.clone(),
                        status: DayStatus::Late,
                        punch_time: Some(checkin.punch_time),
                        minutes: checkin.late_minutes,
                    });
                }
            }
            if let Some(checkout) = day.latest_checkout() {
                if checkout.status == PunchStatus::Early {
                    early_count += 1;
                    punctuality_anomalies.push(AnomalyEntry {
                        employee_id: employee.id,
                        name: employee.name.clone(),
                        department: department.clone(),
                        status: DayStatus::EarlyOut,
                        punch_time: Some(checkout.punch_time),
                        minutes: checkout.early_minutes,
                    });
                }
            }
        }

        let coverage = cache.leave(employee.id, date);
        match coverage.map(|c| c.status) {
            Some(LeaveStatus::Approved) => on_leave += 1,
            Some(LeaveStatus::Pending) => pending_leave += 1,
            _ => {}
        }

        let covered = matches!(
            coverage.map(|c| c.status),
            Some(LeaveStatus::Approved) | Some(LeaveStatus::Pending)
        );
        if !is_present && !covered {
            absentees.push(AnomalyEntry {
                employee_id: employee.id,
                name: employee.name.clone(),
                department,
                status: DayStatus::Absent,
                punch_time: None,
                minutes: 0,
            });
        }
    }

    let absent = absentees.len();

    let mut anomalies = punctuality_anomalies;
    anomalies.truncate(anomaly_limit);
    anomalies.extend(absentees.into_iter().take(absent_limit));

    let (alert, alert_text) = compose_alert(absent, late_count, early_count);

    TodayReport {
        date,
        expected,
        present,
        absent,
        on_leave,
        pending_leave,
        anomalies,
        alert,
        alert_text,
    }
}

fn compose_alert(absent: usize, late: usize, early: usize) -> (AlertLevel, String) {
    if absent + late + early == 0 {
        return (AlertLevel::Normal, "attendance normal".into());
    }
    let mut parts = Vec::new();
    if absent > 0 {
        parts.push(format!("{absent} absent"));
    }
    if late > 0 {
        parts.push(format!("{late} late"));
    }
    if early > 0 {
        parts.push(format!("{early} early leave"));
    }
    (AlertLevel::Warning, parts.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Employee, LeaveRequest, PunchEvent, PunchKind};
    use chrono::NaiveDateTime;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, 0).unwrap()
    }

    fn employee(id: u64) -> Employee {
        Employee {
            id,
            name: format!("employee {id}"),
            employee_no: format!("EMP-{id:03}"),
            department_id: None,
            position: None,
            phone: None,
            tags: None,
        }
    }

    fn punch(
        employee_id: u64,
        kind: PunchKind,
        t: NaiveDateTime,
        status: PunchStatus,
        minutes: i64,
    ) -> PunchEvent {
        let (late, early) = match status {
            PunchStatus::Late => (minutes, 0),
            PunchStatus::Early => (0, minutes),
            PunchStatus::Normal => (0, 0),
        };
        PunchEvent {
            id: 0,
            employee_id,
            kind,
            punch_time: t,
            status,
            late_minutes: late,
            early_minutes: early,
            address: None,
            longitude: None,
            latitude: None,
        }
    }

    fn approved_leave(employee_id: u64) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id,
            leave_type: "annual".into(),
            start_date: date(),
            end_date: date(),
            days: 1.0,
            reason: None,
            status: LeaveStatus::Approved,
            approver_id: None,
            approve_remark: None,
        }
    }

    #[test]
    fn headcounts_split_present_leave_absent() {
        // 5 employees: 3 checked in, 1 on approved leave, 1 neither.
        let mut cache = CacheStore::default();
        for id in 1..=5 {
            cache.upsert_employee(employee(id));
        }
        for id in 1..=3 {
            cache.add_punch(&punch(id, PunchKind::Checkin, at(9, 0), PunchStatus::Normal, 0));
        }
        cache.add_leave(&approved_leave(4));

        let report = today_report(&cache, date(), 50, 100);
        assert_eq!(report.expected, 5);
        assert_eq!(report.present, 3);
        assert_eq!(report.on_leave, 1);
        assert_eq!(report.absent, 1);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].employee_id, 5);
        assert_eq!(report.anomalies[0].status, DayStatus::Absent);
        assert_eq!(report.alert, AlertLevel::Warning);
        assert_eq!(report.alert_text, "1 absent");
    }

    #[test]
    fn late_and_early_entries_precede_absentees() {
        let mut cache = CacheStore::default();
        for id in 1..=3 {
            cache.upsert_employee(employee(id));
        }
        cache.add_punch(&punch(1, PunchKind::Checkin, at(9, 20), PunchStatus::Late, 5));
        cache.add_punch(&punch(2, PunchKind::Checkin, at(9, 0), PunchStatus::Normal, 0));
        cache.add_punch(&punch(2, PunchKind::Checkout, at(17, 30), PunchStatus::Early, 15));

        let report = today_report(&cache, date(), 50, 100);
        assert_eq!(report.anomalies.len(), 3);
        assert_eq!(report.anomalies[0].status, DayStatus::Late);
        assert_eq!(report.anomalies[0].minutes, 5);
        assert_eq!(report.anomalies[1].status, DayStatus::EarlyOut);
        assert_eq!(report.anomalies[1].minutes, 15);
        assert_eq!(report.anomalies[2].status, DayStatus::Absent);
        assert_eq!(report.alert_text, "1 absent | 1 late | 1 early leave");
    }

    #[test]
    fn anomaly_list_is_bounded_but_counts_are_not() {
        let mut cache = CacheStore::default();
        for id in 1..=10 {
            cache.upsert_employee(employee(id));
        }
        let report = today_report(&cache, date(), 50, 4);
        assert_eq!(report.absent, 10);
        assert_eq!(report.anomalies.len(), 4);
    }

    #[test]
    fn quiet_day_is_normal() {
        let mut cache = CacheStore::default();
        cache.upsert_employee(employee(1));
        cache.add_punch(&punch(1, PunchKind::Checkin, at(8, 55), PunchStatus::Normal, 0));

        let report = today_report(&cache, date(), 50, 100);
        assert_eq!(report.alert, AlertLevel::Normal);
        assert_eq!(report.alert_text, "attendance normal");
        assert!(report.anomalies.is_empty());
    }
}
