#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use pool_schedule::{
    CalendarDateRange, CatalogSnapshot, DateRangeId, DaySchedule, DayScheduleId,
    ExceptionDayDefinition, ExceptionDayId, MonthDay, ReferenceDay, ScheduleCatalog,
    ScheduleTemplate, ScheduleTemplateException, TemplateId, TimePeriod, WeekSchedule,
    WeekScheduleId,
};

pub const POOL: TemplateId = TemplateId(100);

pub const STANDARD: DayScheduleId = DayScheduleId(1);
pub const SUMMER: DayScheduleId = DayScheduleId(2);
pub const HOLIDAY: DayScheduleId = DayScheduleId(3);
pub const CLOSED: DayScheduleId = DayScheduleId(4);

pub const STANDARD_WEEK: WeekScheduleId = WeekScheduleId(10);
pub const SUMMER_WEEK: WeekScheduleId = WeekScheduleId(20);

pub const SUMMER_RANGE: DateRangeId = DateRangeId(200);

pub const GOOD_FRIDAY: ExceptionDayId = ExceptionDayId(300);
pub const CHRISTMAS: ExceptionDayId = ExceptionDayId(301);
pub const PALM_SUNDAY: ExceptionDayId = ExceptionDayId(302);

pub fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn dt(y: i32, mo: u32, day: u32, h: u32, mi: u32) -> NaiveDateTime {
    d(y, mo, day).and_time(t(h, mi))
}

pub fn md(month: u32, day: u32) -> MonthDay {
    MonthDay::new(month, day).unwrap()
}

/// Municipal pool: Standard plan Monday to Saturday, nothing on Sundays, a
/// summer season from May to September, Good Friday on the holiday plan and
/// Christmas closed. Palm Sunday is linked without an override.
pub fn pool_snapshot() -> CatalogSnapshot {
    let mut template = ScheduleTemplate::new(POOL, "Municipal pool", STANDARD_WEEK);
    template.is_default = true;

    let mut summer_range = CalendarDateRange::new(
        SUMMER_RANGE,
        POOL,
        md(5, 1),
        md(9, 30),
        1,
        SUMMER_WEEK,
    );
    summer_range.name = "Summer".into();

    CatalogSnapshot {
        templates: vec![template],
        week_schedules: vec![
            WeekSchedule::uniform(STANDARD_WEEK, "Standard week", STANDARD)
                .with_slot(Weekday::Sun, None),
            WeekSchedule::uniform(SUMMER_WEEK, "Summer week", SUMMER),
        ],
        day_schedules: vec![
            DaySchedule::new(
                STANDARD,
                "Standard",
                vec![TimePeriod::new(t(6, 0), t(22, 0), 28.0)],
            ),
            DaySchedule::new(
                SUMMER,
                "Summer",
                vec![
                    TimePeriod::new(t(14, 0), t(21, 0), 29.0),
                    TimePeriod::new(t(7, 0), t(12, 0), 27.0).with_band(26.0, 28.0),
                ],
            ),
            DaySchedule::new(
                HOLIDAY,
                "Holiday",
                vec![TimePeriod::new(t(9, 0), t(17, 0), 30.0)],
            ),
            DaySchedule::closed(CLOSED, "Closed"),
        ],
        date_ranges: vec![summer_range],
        exception_days: vec![
            ExceptionDayDefinition::moving(GOOD_FRIDAY, "Good Friday", "easter", -2),
            ExceptionDayDefinition::fixed(CHRISTMAS, "Christmas Day", 12, 25),
            ExceptionDayDefinition::moving(PALM_SUNDAY, "Palm Sunday", "easter", -7),
        ],
        template_exceptions: vec![
            ScheduleTemplateException::new(POOL, GOOD_FRIDAY, HOLIDAY),
            ScheduleTemplateException::new(POOL, CHRISTMAS, CLOSED),
            ScheduleTemplateException {
                template_id: POOL,
                exception_day_id: PALM_SUNDAY,
                day_schedule_id: None,
            },
        ],
        reference_days: vec![ReferenceDay::easter()],
    }
}

pub fn pool_catalog() -> ScheduleCatalog {
    ScheduleCatalog::from_snapshot(pool_snapshot()).expect("fixture catalog is valid")
}
