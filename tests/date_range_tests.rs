mod common;

use common::{d, md};
use pool_schedule::{CalendarDateRange, DateRangeId, TemplateId, WeekScheduleId, select_range};

fn range(id: i64, start: (u32, u32), end: (u32, u32), priority: i32) -> CalendarDateRange {
    CalendarDateRange::new(
        DateRangeId(id),
        TemplateId(1),
        md(start.0, start.1),
        md(end.0, end.1),
        priority,
        WeekScheduleId(id * 10),
    )
}

#[test]
fn boundaries_are_inclusive() {
    let summer = range(1, (5, 1), (9, 30), 1);
    assert!(summer.matches(d(2025, 5, 1)));
    assert!(summer.matches(d(2025, 9, 30)));
    assert!(!summer.matches(d(2025, 4, 30)));
    assert!(!summer.matches(d(2025, 10, 1)));
}

#[test]
fn year_is_ignored() {
    let summer = range(1, (5, 1), (9, 30), 1);
    assert!(summer.matches(d(1999, 7, 14)));
    assert!(summer.matches(d(2042, 7, 14)));
}

#[test]
fn wrapping_range_spans_new_year() {
    let winter = range(1, (11, 1), (2, 28), 1);
    assert!(winter.wraps_year());
    assert!(winter.matches(d(2025, 12, 25)));
    assert!(winter.matches(d(2026, 1, 1)));
    assert!(winter.matches(d(2026, 2, 28)));
    assert!(winter.matches(d(2025, 11, 1)));
    assert!(!winter.matches(d(2025, 6, 1)));
    assert!(!winter.matches(d(2025, 3, 1)));
}

#[test]
fn single_day_range_matches_only_that_day() {
    let gala = range(1, (8, 15), (8, 15), 5);
    assert!(gala.matches(d(2025, 8, 15)));
    assert!(!gala.matches(d(2025, 8, 16)));
}

#[test]
fn inactive_range_never_matches() {
    let mut summer = range(1, (5, 1), (9, 30), 1);
    summer.is_active = false;
    assert!(summer.contains(d(2025, 7, 14)));
    assert!(!summer.matches(d(2025, 7, 14)));
}

#[test]
fn highest_priority_wins() {
    let ranges = vec![range(1, (5, 1), (9, 30), 1), range(2, (7, 1), (7, 31), 5)];
    let picked = select_range(d(2025, 7, 14), &ranges).unwrap();
    assert_eq!(picked.id, DateRangeId(2));
    let picked = select_range(d(2025, 8, 14), &ranges).unwrap();
    assert_eq!(picked.id, DateRangeId(1));
}

#[test]
fn equal_priority_goes_to_lowest_id_regardless_of_order() {
    let forward = vec![range(3, (6, 1), (8, 31), 2), range(8, (7, 1), (7, 31), 2)];
    let backward: Vec<_> = forward.iter().rev().cloned().collect();
    for _ in 0..3 {
        assert_eq!(select_range(d(2025, 7, 4), &forward).unwrap().id, DateRangeId(3));
        assert_eq!(select_range(d(2025, 7, 4), &backward).unwrap().id, DateRangeId(3));
    }
}

#[test]
fn nothing_matches_outside_all_ranges() {
    let ranges = vec![range(1, (5, 1), (9, 30), 1)];
    assert!(select_range(d(2025, 12, 15), &ranges).is_none());
}
