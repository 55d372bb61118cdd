mod common;

use common::*;
use chrono::Weekday;
use pool_schedule::{
    ActivePeriod, CalendarDateRange, DateRangeId, DayScheduleId, EntityKind, GapPolicy,
    ResolutionSource, Resolver, ScheduleCatalog, ScheduleError, TemplateId, WeekSchedule,
    WeekScheduleId,
};

#[test]
fn summer_range_beats_base_week_on_a_july_monday() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    assert_eq!(d(2025, 7, 14).format("%A").to_string(), "Monday");
    assert_eq!(resolver.resolve_day_schedule(POOL, d(2025, 7, 14)).unwrap(), SUMMER);
}

#[test]
fn base_week_applies_outside_every_range() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    let resolution = resolver.resolve(POOL, d(2025, 12, 15)).unwrap();
    assert_eq!(resolution.day_schedule_id(), STANDARD);
    assert_eq!(resolution.source, ResolutionSource::BaseWeek);
    assert!(resolution.matched_range.is_none());
}

#[test]
fn good_friday_resolves_to_holiday_plan() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    let resolution = resolver.resolve(POOL, d(2025, 4, 18)).unwrap();
    assert_eq!(resolution.day_schedule_id(), HOLIDAY);
    assert_eq!(
        resolution.source,
        ResolutionSource::Exception {
            exception_day_id: GOOD_FRIDAY
        }
    );
}

#[test]
fn exception_override_beats_high_priority_range() {
    let mut snapshot = pool_snapshot();
    let mut spring = CalendarDateRange::new(
        DateRangeId(201),
        POOL,
        md(3, 1),
        md(4, 30),
        99,
        SUMMER_WEEK,
    );
    spring.name = "Spring gala".into();
    snapshot.date_ranges.push(spring);
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let resolver = Resolver::new(&catalog);

    assert_eq!(resolver.resolve_day_schedule(POOL, d(2025, 4, 18)).unwrap(), HOLIDAY);
    // The day before still goes through the range.
    assert_eq!(resolver.resolve_day_schedule(POOL, d(2025, 4, 17)).unwrap(), SUMMER);
}

#[test]
fn matched_exception_without_override_falls_through() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    // Palm Sunday 2025 is April 13, a Sunday with no slot in the standard week.
    let resolution = resolver.resolve(POOL, d(2025, 4, 13)).unwrap();
    assert_eq!(resolution.source, ResolutionSource::BaseWeek);
    assert_eq!(resolution.matched_exception.map(|e| e.id), Some(PALM_SUNDAY));
    assert_eq!(resolution.day_schedule_id(), DayScheduleId::UNASSIGNED);
    assert!(resolution.day_schedule.is_closed);
}

#[test]
fn exception_for_another_template_is_ignored() {
    let mut snapshot = pool_snapshot();
    let other = TemplateId(101);
    snapshot
        .templates
        .push(pool_schedule::ScheduleTemplate::new(other, "Lido", STANDARD_WEEK));
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let resolver = Resolver::new(&catalog);
    assert_eq!(resolver.resolve_day_schedule(other, d(2025, 4, 18)).unwrap(), STANDARD);
}

#[test]
fn resolution_is_idempotent() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    for date in [d(2025, 4, 18), d(2025, 7, 14), d(2025, 12, 25), d(2025, 12, 15)] {
        let first = resolver.resolve_day_schedule(POOL, date).unwrap();
        let second = resolver.resolve_day_schedule(POOL, date).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn equal_priority_ranges_pick_lowest_id_every_time() {
    let mut snapshot = pool_snapshot();
    let alt_week = WeekScheduleId(30);
    snapshot
        .week_schedules
        .push(WeekSchedule::uniform(alt_week, "Alt week", HOLIDAY));
    snapshot.date_ranges.push(CalendarDateRange::new(
        DateRangeId(150),
        POOL,
        md(7, 1),
        md(7, 31),
        1,
        alt_week,
    ));
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let resolver = Resolver::new(&catalog);

    for _ in 0..5 {
        let resolution = resolver.resolve(POOL, d(2025, 7, 14)).unwrap();
        assert_eq!(resolution.matched_range.map(|r| r.id), Some(DateRangeId(150)));
        assert_eq!(resolution.week_schedule.map(|w| w.id), Some(alt_week));
    }
}

#[test]
fn dangling_week_slot_is_a_broken_reference() {
    let mut snapshot = pool_snapshot();
    snapshot.week_schedules[0].set_slot(Weekday::Tue, Some(DayScheduleId(77)));
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let resolver = Resolver::new(&catalog);

    // 2025-12-16 is a Tuesday.
    let err = resolver.resolve(POOL, d(2025, 12, 16)).unwrap_err();
    match err {
        ScheduleError::BrokenReference { entity, id, .. } => {
            assert_eq!(entity, EntityKind::DaySchedule);
            assert_eq!(id, "77");
        }
        other => panic!("expected broken reference, got {other:?}"),
    }
    // Other weekdays are unaffected.
    assert!(resolver.resolve(POOL, d(2025, 12, 15)).is_ok());
}

#[test]
fn range_pointing_at_missing_week_is_a_broken_reference() {
    let mut snapshot = pool_snapshot();
    snapshot.date_ranges[0].week_schedule_id = WeekScheduleId(404);
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let err = Resolver::new(&catalog).resolve(POOL, d(2025, 7, 14)).unwrap_err();
    assert!(err.is_broken_reference());
    assert!(err.to_string().contains("404"));
}

#[test]
fn template_without_base_week_is_a_broken_reference() {
    let mut snapshot = pool_snapshot();
    snapshot.templates[0].base_week_schedule_id = None;
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let resolver = Resolver::new(&catalog);

    let err = resolver.resolve(POOL, d(2025, 12, 15)).unwrap_err();
    assert_eq!(err, ScheduleError::MissingBaseWeekSchedule(POOL));
    // Range and exception layers still resolve.
    assert_eq!(resolver.resolve_day_schedule(POOL, d(2025, 7, 14)).unwrap(), SUMMER);
}

#[test]
fn exception_override_to_missing_day_is_a_broken_reference() {
    let mut snapshot = pool_snapshot();
    snapshot.template_exceptions[0].day_schedule_id = Some(DayScheduleId(55));
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let err = Resolver::new(&catalog).resolve(POOL, d(2025, 4, 18)).unwrap_err();
    assert!(err.is_broken_reference());
}

#[test]
fn unknown_template_is_not_found() {
    let catalog = pool_catalog();
    let err = Resolver::new(&catalog)
        .resolve(TemplateId(999), d(2025, 1, 1))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { entity: EntityKind::Template, .. }));
}

#[test]
fn explain_reports_each_layer() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);

    let summer = resolver.explain(POOL, d(2025, 7, 14)).unwrap();
    assert_eq!(summer.weekday, "Mon");
    assert_eq!(summer.matched_range.as_ref().map(|r| r.id), Some(SUMMER_RANGE));
    assert_eq!(summer.week_schedule.as_ref().map(|w| w.id), Some(SUMMER_WEEK));
    assert_eq!(summer.day_schedule.id, SUMMER);
    assert!(summer.matched_exception.is_none());

    let holiday = resolver.explain(POOL, d(2025, 4, 18)).unwrap();
    let exception = holiday.matched_exception.expect("good friday");
    assert_eq!(exception.name, "Good Friday");
    assert!(exception.applied);
    assert!(holiday.week_schedule.is_none());

    let palm = resolver.explain(POOL, d(2025, 4, 13)).unwrap();
    assert!(!palm.matched_exception.expect("palm sunday").applied);
    assert!(palm.day_is_closed);
    assert!(palm.warnings.is_empty());
}

#[test]
fn explain_carries_ambiguity_warning() {
    let mut snapshot = pool_snapshot();
    snapshot.exception_days.push(
        pool_schedule::ExceptionDayDefinition::fixed(
            pool_schedule::ExceptionDayId(400),
            "Pool anniversary",
            4,
            18,
        ),
    );
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let explanation = Resolver::new(&catalog).explain(POOL, d(2025, 4, 18)).unwrap();
    assert_eq!(explanation.day_schedule.id, HOLIDAY);
    assert_eq!(explanation.warnings.len(), 1);
}

#[test]
fn instant_queries_follow_the_resolved_plan() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);

    assert_eq!(resolver.target_temperature(POOL, dt(2025, 12, 15, 10, 0)).unwrap(), Some(28.0));
    assert_eq!(resolver.target_temperature(POOL, dt(2025, 12, 15, 23, 0)).unwrap(), None);
    assert!(resolver.is_open(POOL, dt(2025, 7, 14, 15, 30)).unwrap());
    assert!(!resolver.is_open(POOL, dt(2025, 7, 14, 13, 0)).unwrap());
    assert!(!resolver.is_open(POOL, dt(2025, 12, 25, 10, 0)).unwrap());
}

#[test]
fn active_period_by_day_schedule_id() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    match resolver.active_period(STANDARD, t(10, 0)).unwrap() {
        ActivePeriod::Open(period) => assert_eq!(period.target_temp, 28.0),
        other => panic!("expected open, got {other:?}"),
    }
    assert_eq!(resolver.active_period(STANDARD, t(23, 0)).unwrap(), ActivePeriod::Closed);
    assert!(resolver.active_period(DayScheduleId(999), t(10, 0)).is_err());
}

#[test]
fn hold_previous_policy_applies_through_resolver() {
    let mut snapshot = pool_snapshot();
    for day in &mut snapshot.day_schedules {
        if day.id == SUMMER {
            day.gap_policy = GapPolicy::HoldPrevious;
        }
    }
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let active = Resolver::new(&catalog)
        .active_period_at(POOL, dt(2025, 7, 14, 13, 0))
        .unwrap();
    assert_eq!(active.label(), "holding");
    assert_eq!(active.target_temp(), Some(27.0));
}

#[test]
fn next_opening_same_day_and_across_closed_days() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);

    let opening = resolver
        .next_opening(POOL, dt(2025, 7, 14, 12, 30), 30)
        .unwrap()
        .unwrap();
    assert_eq!(opening.at, dt(2025, 7, 14, 14, 0));
    assert_eq!(opening.day_schedule_id, SUMMER);

    // Christmas Eve evening: Christmas is closed, so Boxing Day opens at 06:00.
    let opening = resolver
        .next_opening(POOL, dt(2025, 12, 24, 22, 30), 30)
        .unwrap()
        .unwrap();
    assert_eq!(opening.at, dt(2025, 12, 26, 6, 0));
}

#[test]
fn next_opening_gives_up_after_horizon() {
    let mut snapshot = pool_snapshot();
    snapshot.week_schedules[0].days = [None; 7];
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let opening = Resolver::new(&catalog)
        .next_opening(POOL, dt(2025, 12, 1, 8, 0), 10)
        .unwrap();
    assert!(opening.is_none());
}

#[test]
fn span_resolves_every_date_in_order() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    let days = resolver.resolve_span(POOL, d(2025, 4, 28), d(2025, 5, 4)).unwrap();

    assert_eq!(days.len(), 7);
    assert_eq!(days.first().unwrap().date, d(2025, 4, 28));
    assert_eq!(days.last().unwrap().date, d(2025, 5, 4));
    assert_eq!(days[0].day_schedule_id, STANDARD);
    assert_eq!(days[3].day_schedule_id, SUMMER);
    assert_eq!(days[3].date_range_id, Some(SUMMER_RANGE));
    assert_eq!(days[0].open_minutes, 16 * 60);
    for pair in days.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
}

#[test]
fn span_rejects_reversed_bounds() {
    let catalog = pool_catalog();
    let err = Resolver::new(&catalog)
        .resolve_span(POOL, d(2025, 5, 4), d(2025, 4, 28))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));
}

#[test]
fn span_longer_than_limit_is_rejected_before_resolving() {
    let catalog = pool_catalog();
    let err = Resolver::new(&catalog)
        .resolve_span(POOL, d(1, 1, 1), d(2999, 12, 31))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let resolver = Resolver::new(&catalog).with_max_span_days(7);
    assert_eq!(
        resolver.resolve_span(POOL, d(2025, 4, 14), d(2025, 4, 20)).unwrap().len(),
        7
    );
    let err = resolver
        .resolve_span(POOL, d(2025, 4, 14), d(2025, 4, 21))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(ref msg) if msg.contains("8 days")));
}

#[test]
fn span_propagates_broken_references() {
    let mut snapshot = pool_snapshot();
    snapshot.week_schedules[0].set_slot(Weekday::Wed, Some(DayScheduleId(77)));
    let catalog = ScheduleCatalog::from_snapshot(snapshot).unwrap();
    let err = Resolver::new(&catalog)
        .resolve_span(POOL, d(2025, 12, 15), d(2025, 12, 21))
        .unwrap_err();
    assert!(err.is_broken_reference());
}

#[test]
fn resolver_reports_reference_dates_and_holidays() {
    let catalog = pool_catalog();
    let resolver = Resolver::new(&catalog);
    assert_eq!(
        resolver
            .reference_date(&pool_schedule::ReferenceDayId::easter(), 2024)
            .unwrap(),
        d(2024, 3, 31)
    );
    let holidays = resolver.exception_calendar(2024).unwrap();
    assert_eq!(holidays.len(), 3);
    assert_eq!(holidays[0].date, d(2024, 3, 24));
}
