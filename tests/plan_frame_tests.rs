mod common;

use common::*;
use pool_schedule::{
    DayScheduleId, EntityKind, PlanFrameError, Resolver, ScheduleError, day_frame, hourly_frame,
};

#[test]
fn day_frame_has_one_row_per_date() {
    let catalog = pool_catalog();
    let days = Resolver::new(&catalog)
        .resolve_span(POOL, d(2025, 4, 17), d(2025, 4, 20))
        .unwrap();
    let df = day_frame(&days).unwrap();

    assert_eq!(df.height(), 4);
    let ids = df.column("day_schedule_id").unwrap().i64().unwrap();
    let sources = df.column("source").unwrap().str().unwrap();
    let closed = df.column("is_closed").unwrap().bool().unwrap();
    let exceptions = df.column("exception_day_id").unwrap().i64().unwrap();

    assert_eq!(ids.get(0), Some(STANDARD.get()));
    assert_eq!(ids.get(1), Some(HOLIDAY.get()));
    assert_eq!(sources.get(1), Some("exception"));
    assert_eq!(exceptions.get(1), Some(GOOD_FRIDAY.get()));
    assert_eq!(exceptions.get(0), None);
    // Easter Sunday falls on the empty Sunday slot.
    assert_eq!(closed.get(3), Some(true));

    // 2025-04-17 is 20195 days after the Unix epoch.
    let dates = df.column("date").unwrap().date().unwrap();
    assert_eq!(dates.get(0), Some(20195));
}

#[test]
fn hourly_frame_samples_each_hour() {
    let catalog = pool_catalog();
    let days = Resolver::new(&catalog)
        .resolve_span(POOL, d(2025, 7, 14), d(2025, 7, 15))
        .unwrap();
    let df = hourly_frame(&catalog, &days).unwrap();

    assert_eq!(df.height(), 48);
    let states = df.column("state").unwrap().str().unwrap();
    let targets = df.column("target_temp").unwrap().f64().unwrap();
    let mins = df.column("min_temp").unwrap().f64().unwrap();

    assert_eq!(states.get(6), Some("closed"));
    assert_eq!(states.get(7), Some("open"));
    assert_eq!(targets.get(7), Some(27.0));
    assert_eq!(mins.get(7), Some(26.0));
    assert_eq!(states.get(12), Some("closed"));
    assert_eq!(targets.get(15), Some(29.0));
    assert_eq!(mins.get(15), None);
    assert_eq!(targets.get(21), None);
}

#[test]
fn hourly_frame_rejects_unknown_day_schedule() {
    let catalog = pool_catalog();
    let mut days = Resolver::new(&catalog)
        .resolve_span(POOL, d(2025, 7, 14), d(2025, 7, 15))
        .unwrap();
    days[1].day_schedule_id = DayScheduleId(999);

    let err = hourly_frame(&catalog, &days).unwrap_err();
    match err {
        PlanFrameError::Schedule(ScheduleError::NotFound { entity, id }) => {
            assert_eq!(entity, EntityKind::DaySchedule);
            assert_eq!(id, "999");
        }
        other => panic!("expected missing day schedule, got {other:?}"),
    }
}

#[test]
fn empty_span_gives_empty_frames() {
    let catalog = pool_catalog();
    let df = day_frame(&[]).unwrap();
    assert_eq!(df.height(), 0);
    let df = hourly_frame(&catalog, &[]).unwrap();
    assert_eq!(df.height(), 0);
}
