use chrono::{Duration, NaiveDate, Timelike};

use crate::model::{
    DayPunch, DayRecord, DaySummary, DayStatus, LeaveCoverage, LeaveStatus, PunchStatus,
};

const DAY_SECONDS: i64 = 24 * 3600;

/// Everything needed to reconcile one employee-day: the day's punches,
/// the neighboring days (for shifts spanning midnight) and leave coverage.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub today: Option<&'a DayRecord>,
    pub prev_day: Option<&'a DayRecord>,
    pub next_day: Option<&'a DayRecord>,
    pub leave: Option<&'a LeaveCoverage>,
}

/// Reconciles raw punches into a single daily status and work duration.
///
/// The earliest checkin and latest checkout are canonical for the day. A
/// missing side may be borrowed from the adjacent day when the punch hours
/// straddle `boundary_hour` (night-shift heuristic); a borrowed or
/// mislabeled checkout on the next calendar day yields a night-shift or
/// cross-day record. Days that still cannot be reconciled become status
/// values, never errors.
pub fn reconcile_day(ctx: &DayContext<'_>, boundary_hour: u32) -> DaySummary {
    let mut checkin = ctx.today.and_then(DayRecord::earliest_checkin).cloned();
    let mut checkout = ctx.today.and_then(DayRecord::latest_checkout).cloned();

    // Night-shift borrow: checkin late in the day, checkout early on the
    // next calendar day.
    if let (Some(ci), None) = (&checkin, &checkout) {
        if ci.punch_time.hour() >= boundary_hour {
            if let Some(next) = ctx.next_day.and_then(DayRecord::earliest_checkout) {
                if next.punch_time.hour() < boundary_hour {
                    checkout = Some(next.clone());
                }
            }
        }
    }

    // Symmetric borrow from the previous day's latest checkin when only a
    // checkout is present. Skipped when the previous day is checkin-only
    // and would claim this checkout itself via the forward borrow: the
    // interval must reconcile into a single record on the checkin's day.
    if let (None, Some(co)) = (&checkin, &checkout) {
        if co.punch_time.hour() < boundary_hour {
            if let Some(prev) = ctx.prev_day {
                let claimed_by_prev = prev.checkouts.is_empty()
                    && prev
                        .earliest_checkin()
                        .is_some_and(|p| p.punch_time.hour() >= boundary_hour)
                    && ctx
                        .today
                        .and_then(DayRecord::earliest_checkout)
                        .is_some_and(|p| p.punch_time.hour() < boundary_hour);
                if !claimed_by_prev {
                    if let Some(pci) = prev.latest_checkin() {
                        if pci.punch_time.hour() >= boundary_hour {
                            checkin = Some(pci.clone());
                        }
                    }
                }
            }
        }
    }

    match (checkin, checkout) {
        (Some(ci), Some(co)) => reconcile_interval(ctx, &ci, &co, boundary_hour),
        (Some(ci), None) => summary(ctx, Some(ci.punch_time), None, 0, DayStatus::MissingCheckout),
        (None, Some(co)) => summary(ctx, None, Some(co.punch_time), 0, DayStatus::MissingCheckin),
        (None, None) => no_punches(ctx),
    }
}

fn reconcile_interval(
    ctx: &DayContext<'_>,
    ci: &DayPunch,
    co: &DayPunch,
    boundary_hour: u32,
) -> DaySummary {
    let in_t = ci.punch_time;
    let out_t = co.punch_time;
    let same_day = in_t.date() == out_t.date();

    // A checkout recorded on the checkin's date but with a clock hour that
    // jumps backwards across the boundary is a mislabeled next-day checkout.
    let mislabeled = same_day
        && out_t.hour() < in_t.hour()
        && in_t.hour() >= boundary_hour
        && out_t.hour() < boundary_hour;

    if same_day && !mislabeled {
        let duration = (out_t - in_t).num_seconds();
        if duration > 0 && duration <= DAY_SECONDS {
            let status = punctuality(ci, co);
            return summary(ctx, Some(in_t), Some(out_t), duration, status);
        }
        return summary(ctx, Some(in_t), Some(out_t), 0, DayStatus::DataAnomaly);
    }

    let out_adjusted = if mislabeled { out_t + Duration::days(1) } else { out_t };
    let gap = (out_adjusted - in_t).num_seconds();
    let next_day = in_t.date().succ_opt().expect("date overflow");

    if out_adjusted.date() == next_day && gap > 0 && gap <= DAY_SECONDS {
        if in_t.hour() >= boundary_hour && out_adjusted.hour() < boundary_hour {
            // Overnight shift: split at midnight and sum the segments.
            let midnight = next_day.and_hms_opt(0, 0, 0).expect("valid midnight");
            let evening = (midnight - in_t).num_seconds();
            let morning = (out_adjusted - midnight).num_seconds();
            return summary(
                ctx,
                Some(in_t),
                Some(out_adjusted),
                evening + morning,
                DayStatus::NightShift,
            );
        }
        return summary(ctx, Some(in_t), Some(out_adjusted), gap, DayStatus::CrossDay);
    }

    summary(ctx, Some(in_t), Some(out_adjusted), 0, DayStatus::CrossDayAnomaly)
}

/// Late checkin and early checkout compose; either alone stands by itself.
fn punctuality(ci: &DayPunch, co: &DayPunch) -> DayStatus {
    match (ci.status == PunchStatus::Late, co.status == PunchStatus::Early) {
        (true, true) => DayStatus::LateEarlyOut,
        (true, false) => DayStatus::Late,
        (false, true) => DayStatus::EarlyOut,
        (false, false) => DayStatus::Normal,
    }
}

fn no_punches(ctx: &DayContext<'_>) -> DaySummary {
    let (status, leave_type) = match ctx.leave {
        Some(leave) if leave.status == LeaveStatus::Approved => {
            (DayStatus::OnLeave, Some(leave.leave_type.clone()))
        }
        Some(leave) if leave.status == LeaveStatus::Pending => {
            (DayStatus::LeavePending, Some(leave.leave_type.clone()))
        }
        _ => (DayStatus::Absent, None),
    };
    DaySummary {
        employee_id: ctx.employee_id,
        date: ctx.date,
        checkin_time: None,
        checkout_time: None,
        work_seconds: 0,
        status,
        leave_type,
    }
}

fn summary(
    ctx: &DayContext<'_>,
    checkin_time: Option<chrono::NaiveDateTime>,
    checkout_time: Option<chrono::NaiveDateTime>,
    work_seconds: i64,
    status: DayStatus,
) -> DaySummary {
    DaySummary {
        employee_id: ctx.employee_id,
        date: ctx.date,
        checkin_time,
        checkout_time,
        work_seconds,
        status,
        leave_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NIGHT_SHIFT_BOUNDARY_HOUR;
    use crate::model::PunchKind;
    use chrono::NaiveDateTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    fn punch(t: NaiveDateTime, status: PunchStatus) -> DayPunch {
        let (late, early) = match status {
            PunchStatus::Late => (5, 0),
            PunchStatus::Early => (0, 15),
            PunchStatus::Normal => (0, 0),
        };
        DayPunch { punch_time: t, status, late_minutes: late, early_minutes: early }
    }

    fn day(employee_id: u64, d: u32, punches: &[(PunchKind, NaiveDateTime, PunchStatus)]) -> DayRecord {
        let mut record = DayRecord::new(employee_id, date(d));
        for (kind, t, status) in punches {
            record.push(*kind, punch(*t, *status));
        }
        record
    }

    fn ctx<'a>(
        d: u32,
        today: Option<&'a DayRecord>,
        prev: Option<&'a DayRecord>,
        next: Option<&'a DayRecord>,
        leave: Option<&'a LeaveCoverage>,
    ) -> DayContext<'a> {
        DayContext { employee_id: 1, date: date(d), today, prev_day: prev, next_day: next, leave }
    }

    fn reconcile(c: &DayContext<'_>) -> DaySummary {
        reconcile_day(c, NIGHT_SHIFT_BOUNDARY_HOUR)
    }

    #[test]
    fn same_day_duration_is_exact() {
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 9, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 18, 30), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.work_seconds, (9 * 3600) + (30 * 60));
        assert_eq!(s.status, DayStatus::Normal);
    }

    #[test]
    fn earliest_checkin_latest_checkout_are_canonical() {
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 10, 0), PunchStatus::Normal),
                (PunchKind::Checkin, at(2, 8, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 12, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 17, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.checkin_time, Some(at(2, 8, 0)));
        assert_eq!(s.checkout_time, Some(at(2, 17, 0)));
        assert_eq!(s.work_seconds, 9 * 3600);
    }

    #[test]
    fn night_shift_borrows_next_day_checkout() {
        let today = day(1, 2, &[(PunchKind::Checkin, at(2, 22, 0), PunchStatus::Normal)]);
        let next = day(1, 3, &[(PunchKind::Checkout, at(3, 6, 0), PunchStatus::Normal)]);
        let s = reconcile(&ctx(2, Some(&today), None, Some(&next), None));
        assert_eq!(s.status, DayStatus::NightShift);
        assert_eq!(s.work_seconds, 8 * 3600);
        assert_eq!(s.checkout_time, Some(at(3, 6, 0)));
    }

    #[test]
    fn morning_checkin_does_not_borrow() {
        let today = day(1, 2, &[(PunchKind::Checkin, at(2, 9, 0), PunchStatus::Normal)]);
        let next = day(1, 3, &[(PunchKind::Checkout, at(3, 6, 0), PunchStatus::Normal)]);
        let s = reconcile(&ctx(2, Some(&today), None, Some(&next), None));
        assert_eq!(s.status, DayStatus::MissingCheckout);
        assert_eq!(s.work_seconds, 0);
    }

    #[test]
    fn checkout_only_borrows_previous_evening_checkin() {
        // Previous day worked a normal shift and then re-entered at 21:30;
        // its own reconciliation keeps 09:00-18:00, so the re-entry is free
        // to pair with this morning's checkout.
        let today = day(1, 3, &[(PunchKind::Checkout, at(3, 5, 30), PunchStatus::Normal)]);
        let prev = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 9, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 18, 0), PunchStatus::Normal),
                (PunchKind::Checkin, at(2, 21, 30), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(3, Some(&today), Some(&prev), None, None));
        assert_eq!(s.status, DayStatus::NightShift);
        assert_eq!(s.work_seconds, 8 * 3600);
    }

    #[test]
    fn night_shift_reconciles_into_a_single_record() {
        // 22:00 day 2 -> 06:00 day 3. Day 2 claims the interval; day 3 must
        // not count the same eight hours again.
        let d2 = day(1, 2, &[(PunchKind::Checkin, at(2, 22, 0), PunchStatus::Normal)]);
        let d3 = day(1, 3, &[(PunchKind::Checkout, at(3, 6, 0), PunchStatus::Normal)]);

        let s2 = reconcile(&ctx(2, Some(&d2), None, Some(&d3), None));
        assert_eq!(s2.status, DayStatus::NightShift);
        assert_eq!(s2.work_seconds, 8 * 3600);

        let s3 = reconcile(&ctx(3, Some(&d3), Some(&d2), None, None));
        assert_eq!(s3.status, DayStatus::MissingCheckin);
        assert_eq!(s3.work_seconds, 0);
    }

    #[test]
    fn checkout_only_without_donor_is_missing_checkin() {
        let today = day(1, 3, &[(PunchKind::Checkout, at(3, 17, 0), PunchStatus::Normal)]);
        let s = reconcile(&ctx(3, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::MissingCheckin);
    }

    #[test]
    fn mislabeled_same_date_checkout_is_treated_as_next_day() {
        // Checkin 21:00, checkout stamped 05:00 the same date: clock hour
        // jumped backwards across the boundary, so it belongs to day+1.
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 21, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 5, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::NightShift);
        assert_eq!(s.work_seconds, 8 * 3600);
        assert_eq!(s.checkout_time, Some(at(3, 5, 0)));
    }

    #[test]
    fn cross_day_without_boundary_straddle() {
        // 14:00 -> 13:00 next day: one day later and under 24h, but both
        // ends are on the same side of the boundary, so plain cross-day.
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 14, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(3, 13, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::CrossDay);
        assert_eq!(s.work_seconds, 23 * 3600);
    }

    #[test]
    fn gap_over_a_day_is_cross_day_anomaly() {
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 9, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(4, 9, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::CrossDayAnomaly);
        assert_eq!(s.work_seconds, 0);
    }

    #[test]
    fn same_day_checkout_before_checkin_is_anomaly() {
        // 10:00 -> 09:00 the same morning; no boundary straddle, so this
        // is bad data rather than a mislabeled night shift.
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 10, 0), PunchStatus::Normal),
                (PunchKind::Checkout, at(2, 9, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::DataAnomaly);
        assert_eq!(s.work_seconds, 0);
    }

    #[test]
    fn late_and_early_compose() {
        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 9, 20), PunchStatus::Late),
                (PunchKind::Checkout, at(2, 17, 30), PunchStatus::Early),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::LateEarlyOut);

        let today = day(
            1,
            2,
            &[
                (PunchKind::Checkin, at(2, 9, 20), PunchStatus::Late),
                (PunchKind::Checkout, at(2, 18, 0), PunchStatus::Normal),
            ],
        );
        let s = reconcile(&ctx(2, Some(&today), None, None, None));
        assert_eq!(s.status, DayStatus::Late);
    }

    #[test]
    fn no_punches_consults_leave_coverage() {
        let approved = LeaveCoverage {
            employee_id: 1,
            date: date(2),
            leave_type: "annual".into(),
            status: LeaveStatus::Approved,
            days: 1.0,
        };
        let s = reconcile(&ctx(2, None, None, None, Some(&approved)));
        assert_eq!(s.status, DayStatus::OnLeave);
        assert_eq!(s.leave_type.as_deref(), Some("annual"));

        let pending = LeaveCoverage { status: LeaveStatus::Pending, ..approved.clone() };
        let s = reconcile(&ctx(2, None, None, None, Some(&pending)));
        assert_eq!(s.status, DayStatus::LeavePending);

        let s = reconcile(&ctx(2, None, None, None, None));
        assert_eq!(s.status, DayStatus::Absent);
        assert_eq!(s.work_seconds, 0);
    }
}
