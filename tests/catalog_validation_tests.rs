mod common;

use common::*;
use pool_schedule::{
    DayScheduleId, ExceptionDayDefinition, ExceptionDayId, ReferenceDay, ScheduleCatalog,
    ScheduleError, TimePeriod,
};

fn rejects(snapshot: pool_schedule::CatalogSnapshot, needle: &str) {
    match ScheduleCatalog::from_snapshot(snapshot) {
        Err(ScheduleError::Validation(message)) => assert!(
            message.contains(needle),
            "expected '{needle}' in '{message}'"
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn fixture_is_valid_and_intact() {
    let catalog = pool_catalog();
    assert!(catalog.integrity_report().is_empty());
    assert_eq!(catalog.templates().count(), 1);
}

#[test]
fn duplicate_day_schedule_ids_are_rejected() {
    let mut snapshot = pool_snapshot();
    let copy = snapshot.day_schedules[0].clone();
    snapshot.day_schedules.push(copy);
    rejects(snapshot, "duplicate day schedule id 1");
}

#[test]
fn overlapping_periods_are_rejected() {
    let mut snapshot = pool_snapshot();
    snapshot.day_schedules[0]
        .periods
        .push(TimePeriod::new(t(21, 0), t(23, 0), 26.0));
    rejects(snapshot, "overlapping");
}

#[test]
fn inverted_period_is_rejected() {
    let mut snapshot = pool_snapshot();
    snapshot.day_schedules[2].periods = vec![TimePeriod::new(t(17, 0), t(9, 0), 30.0)];
    rejects(snapshot, "ending at or before its start");
}

#[test]
fn target_outside_band_is_rejected() {
    let mut snapshot = pool_snapshot();
    snapshot.day_schedules[0].periods[0] =
        TimePeriod::new(t(6, 0), t(22, 0), 28.0).with_band(29.0, 31.0);
    rejects(snapshot, "min_temp");
}

#[test]
fn reserved_day_schedule_id_is_rejected() {
    let mut snapshot = pool_snapshot();
    snapshot.day_schedules[3].id = DayScheduleId::UNASSIGNED;
    rejects(snapshot, "reserved id 0");
}

#[test]
fn invalid_fixed_exception_day_is_rejected() {
    let mut snapshot = pool_snapshot();
    snapshot
        .exception_days
        .push(ExceptionDayDefinition::fixed(ExceptionDayId(9), "Nonsense", 2, 30));
    rejects(snapshot, "exception day 9");
}

#[test]
fn duplicate_template_exception_link_is_rejected() {
    let mut snapshot = pool_snapshot();
    let link = snapshot.template_exceptions[0].clone();
    snapshot.template_exceptions.push(link);
    rejects(snapshot, "more than once");
}

#[test]
fn mismatched_pinned_reference_year_is_rejected() {
    let mut snapshot = pool_snapshot();
    let mut easter = ReferenceDay::easter();
    easter.overrides.insert(2025, d(2024, 3, 31));
    snapshot.reference_days = vec![easter];
    rejects(snapshot, "under year 2025");
}

#[test]
fn dangling_references_load_but_are_reported() {
    let mut snapshot = pool_snapshot();
    snapshot.week_schedules[0].days[1] = Some(DayScheduleId(77));
    snapshot.date_ranges[0].week_schedule_id = pool_schedule::WeekScheduleId(404);
    snapshot
        .exception_days
        .push(ExceptionDayDefinition::moving(ExceptionDayId(9), "Orthodox Easter", "orthodox_easter", 0));

    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let report = catalog.integrity_report();
    assert_eq!(report.len(), 3);
    assert_eq!(report.iter().filter(|e| e.is_broken_reference()).count(), 2);
    assert!(report
        .iter()
        .any(|e| matches!(e, ScheduleError::Configuration { .. })));
}

#[test]
fn snapshot_round_trips_through_catalog() {
    let snapshot = pool_snapshot();
    let catalog = ScheduleCatalog::from_snapshot(snapshot.clone()).unwrap();
    let back = catalog.to_snapshot();
    assert_eq!(back.templates, snapshot.templates);
    assert_eq!(back.exception_days.len(), snapshot.exception_days.len());
    assert_eq!(back.template_exceptions.len(), snapshot.template_exceptions.len());
    // Periods come back normalised.
    let summer = back.day_schedules.iter().find(|d| d.id == SUMMER).unwrap();
    assert!(summer.periods[0].start < summer.periods[1].start);
}
