//! Tabular views of resolved plans for simulation drivers and reports.

use crate::catalog::ScheduleCatalog;
use crate::error::ScheduleError;
use crate::resolver::ResolvedDay;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanFrameError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),
}

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Days from 0001-01-01 to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_column(name: &'static str, dates: Vec<i32>) -> PolarsResult<Column> {
    Ok(Series::new(PlSmallStr::from_static(name), dates)
        .cast(&DataType::Date)?
        .into_column())
}

/// One row per resolved date.
///
/// Columns: `date`, `weekday`, `day_schedule_id`, `day_schedule`, `is_closed`,
/// `source`, `exception_day_id`, `date_range_id`, `week_schedule_id`,
/// `open_minutes`.
pub fn day_frame(days: &[ResolvedDay]) -> PolarsResult<DataFrame> {
    let dates: Vec<i32> = days.iter().map(|day| date_to_i32(day.date)).collect();
    let weekdays: Vec<String> = days.iter().map(|day| day.date.weekday().to_string()).collect();
    let day_ids: Vec<i64> = days.iter().map(|day| day.day_schedule_id.get()).collect();
    let day_names: Vec<&str> = days.iter().map(|day| day.day_schedule_name.as_str()).collect();
    let closed: Vec<bool> = days.iter().map(|day| day.is_closed).collect();
    let sources: Vec<&str> = days.iter().map(|day| day.source.label()).collect();
    let exceptions: Vec<Option<i64>> = days
        .iter()
        .map(|day| day.exception_day_id.map(|id| id.get()))
        .collect();
    let ranges: Vec<Option<i64>> = days
        .iter()
        .map(|day| day.date_range_id.map(|id| id.get()))
        .collect();
    let weeks: Vec<Option<i64>> = days
        .iter()
        .map(|day| day.week_schedule_id.map(|id| id.get()))
        .collect();
    let open_minutes: Vec<i64> = days.iter().map(|day| day.open_minutes).collect();

    DataFrame::new(vec![
        date_column("date", dates)?,
        Series::new(PlSmallStr::from_static("weekday"), weekdays).into_column(),
        Series::new(PlSmallStr::from_static("day_schedule_id"), day_ids).into_column(),
        Series::new(PlSmallStr::from_static("day_schedule"), day_names).into_column(),
        Series::new(PlSmallStr::from_static("is_closed"), closed).into_column(),
        Series::new(PlSmallStr::from_static("source"), sources).into_column(),
        Series::new(PlSmallStr::from_static("exception_day_id"), exceptions).into_column(),
        Series::new(PlSmallStr::from_static("date_range_id"), ranges).into_column(),
        Series::new(PlSmallStr::from_static("week_schedule_id"), weeks).into_column(),
        Series::new(PlSmallStr::from_static("open_minutes"), open_minutes).into_column(),
    ])
}

/// Hourly samples of each resolved day, evaluated on the hour.
///
/// Columns: `date`, `hour`, `state`, `target_temp`, `min_temp`, `max_temp`.
/// A day whose schedule is missing from `catalog` fails the whole frame with
/// [`ScheduleError::NotFound`].
pub fn hourly_frame(
    catalog: &ScheduleCatalog,
    days: &[ResolvedDay],
) -> Result<DataFrame, PlanFrameError> {
    let capacity = days.len() * 24;
    let mut dates = Vec::with_capacity(capacity);
    let mut hours = Vec::with_capacity(capacity);
    let mut states = Vec::with_capacity(capacity);
    let mut targets = Vec::with_capacity(capacity);
    let mut mins = Vec::with_capacity(capacity);
    let mut maxes = Vec::with_capacity(capacity);

    for day in days {
        let schedule = catalog.day_schedule(day.day_schedule_id)?;
        for hour in 0..24 {
            let active = schedule.active_period(NaiveTime::MIN + Duration::hours(hour));
            let period = active.period();
            dates.push(date_to_i32(day.date));
            hours.push(hour as i32);
            states.push(active.label());
            targets.push(period.map(|p| p.target_temp));
            mins.push(period.and_then(|p| p.min_temp));
            maxes.push(period.and_then(|p| p.max_temp));
        }
    }

    let frame = DataFrame::new(vec![
        date_column("date", dates)?,
        Series::new(PlSmallStr::from_static("hour"), hours).into_column(),
        Series::new(PlSmallStr::from_static("state"), states).into_column(),
        Series::new(PlSmallStr::from_static("target_temp"), targets).into_column(),
        Series::new(PlSmallStr::from_static("min_temp"), mins).into_column(),
        Series::new(PlSmallStr::from_static("max_temp"), maxes).into_column(),
    ])?;
    Ok(frame)
}
