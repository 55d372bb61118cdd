//! Picks the authoritative day plan for a template and date.
//!
//! Precedence, first hit wins:
//!
//! 1. an exception day the template links to a day schedule,
//! 2. the active matching date range with the highest priority (lowest id on
//!    ties), read through its week schedule,
//! 3. the template's base week schedule.
//!
//! An empty weekday slot resolves to the shared closed schedule. Dangling ids
//! abort the call with [`ScheduleError::BrokenReference`]; nothing is silently
//! defaulted.

use crate::catalog::ScheduleCatalog;
use crate::date_range::{CalendarDateRange, select_range};
use crate::day_schedule::{ActivePeriod, DaySchedule, TimePeriod};
use crate::error::{AmbiguousException, ScheduleError, ScheduleResult};
use crate::exception_day::{
    ExceptionDayDefinition, ExceptionOccurrence, exception_calendar, matching_exception_day,
};
use crate::ids::{
    DateRangeId, DayScheduleId, ExceptionDayId, ReferenceDayId, TemplateId, WeekScheduleId,
};
use crate::week_schedule::WeekSchedule;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use serde::Serialize;

/// Which layer produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum ResolutionSource {
    Exception { exception_day_id: ExceptionDayId },
    DateRange { date_range_id: DateRangeId },
    BaseWeek,
}

impl ResolutionSource {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionSource::Exception { .. } => "exception",
            ResolutionSource::DateRange { .. } => "date_range",
            ResolutionSource::BaseWeek => "base_week",
        }
    }
}

/// A resolved day, borrowing from the catalog.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub template_id: TemplateId,
    pub date: NaiveDate,
    pub source: ResolutionSource,
    /// The exception day `date` falls on, whether or not the template links it.
    pub matched_exception: Option<&'a ExceptionDayDefinition>,
    pub matched_range: Option<&'a CalendarDateRange>,
    /// `None` when an exception override decided the day.
    pub week_schedule: Option<&'a WeekSchedule>,
    pub day_schedule: &'a DaySchedule,
    pub ambiguity: Option<AmbiguousException>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionTrace {
    pub id: ExceptionDayId,
    pub name: String,
    /// False when the template has no override for this exception day.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeTrace {
    pub id: DateRangeId,
    pub name: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRef<Id> {
    pub id: Id,
    pub name: String,
}

/// Diagnostic trace answering "why did this date resolve this way".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub template_id: TemplateId,
    pub date: NaiveDate,
    pub weekday: String,
    pub source: ResolutionSource,
    pub matched_exception: Option<ExceptionTrace>,
    pub matched_range: Option<RangeTrace>,
    pub week_schedule: Option<ScheduleRef<WeekScheduleId>>,
    pub day_schedule: ScheduleRef<DayScheduleId>,
    pub day_is_closed: bool,
    pub warnings: Vec<String>,
}

impl Resolution<'_> {
    pub fn day_schedule_id(&self) -> DayScheduleId {
        self.day_schedule.id
    }

    pub fn explain(&self) -> Explanation {
        let exception_applied = matches!(self.source, ResolutionSource::Exception { .. });
        Explanation {
            template_id: self.template_id,
            date: self.date,
            weekday: self.date.weekday().to_string(),
            source: self.source,
            matched_exception: self.matched_exception.map(|exception| ExceptionTrace {
                id: exception.id,
                name: exception.name.clone(),
                applied: exception_applied,
            }),
            matched_range: self.matched_range.map(|range| RangeTrace {
                id: range.id,
                name: range.name.clone(),
                priority: range.priority,
            }),
            week_schedule: self.week_schedule.map(|week| ScheduleRef {
                id: week.id,
                name: week.name.clone(),
            }),
            day_schedule: ScheduleRef {
                id: self.day_schedule.id,
                name: self.day_schedule.name.clone(),
            },
            day_is_closed: self.day_schedule.is_closed,
            warnings: self
                .ambiguity
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Flat, owned summary of one resolved date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    pub day_schedule_id: DayScheduleId,
    pub day_schedule_name: String,
    pub is_closed: bool,
    pub source: ResolutionSource,
    pub exception_day_id: Option<ExceptionDayId>,
    pub date_range_id: Option<DateRangeId>,
    pub week_schedule_id: Option<WeekScheduleId>,
    pub open_minutes: i64,
}

impl From<&Resolution<'_>> for ResolvedDay {
    fn from(resolution: &Resolution<'_>) -> Self {
        Self {
            date: resolution.date,
            day_schedule_id: resolution.day_schedule.id,
            day_schedule_name: resolution.day_schedule.name.clone(),
            is_closed: resolution.day_schedule.is_closed,
            source: resolution.source,
            exception_day_id: match resolution.source {
                ResolutionSource::Exception { exception_day_id } => Some(exception_day_id),
                _ => None,
            },
            date_range_id: resolution.matched_range.map(|range| range.id),
            week_schedule_id: resolution.week_schedule.map(|week| week.id),
            open_minutes: resolution.day_schedule.open_duration().num_minutes(),
        }
    }
}

/// The next time a template's plan opens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opening {
    pub at: NaiveDateTime,
    pub day_schedule_id: DayScheduleId,
    pub period: TimePeriod,
}

/// Longest span [`Resolver::resolve_span`] accepts unless overridden.
pub const DEFAULT_MAX_SPAN_DAYS: u32 = 3660;

/// Stateless resolver over a borrowed catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a ScheduleCatalog,
    max_span_days: u32,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a ScheduleCatalog) -> Self {
        Self {
            catalog,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
        }
    }

    pub fn with_max_span_days(mut self, max_span_days: u32) -> Self {
        self.max_span_days = max_span_days;
        self
    }

    pub fn catalog(&self) -> &'a ScheduleCatalog {
        self.catalog
    }

    pub fn resolve(&self, template_id: TemplateId, date: NaiveDate) -> ScheduleResult<Resolution<'a>> {
        let catalog = self.catalog;
        let template = catalog.template(template_id)?;

        let matched = matching_exception_day(date, catalog.exception_days(), catalog.reference_days())?;
        let (matched_exception, ambiguity) = match matched {
            Some(found) => (Some(found.definition), found.ambiguity),
            None => (None, None),
        };

        if let Some(exception) = matched_exception {
            if let Some(day_id) = catalog.exception_override(template_id, exception.id) {
                let day_schedule = catalog.referenced_day_schedule(day_id, || {
                    format!("template exception ({template_id}, {})", exception.id)
                })?;
                tracing::debug!(%template_id, %date, exception = %exception.id, day = %day_id, "resolved by exception day");
                return Ok(Resolution {
                    template_id,
                    date,
                    source: ResolutionSource::Exception {
                        exception_day_id: exception.id,
                    },
                    matched_exception,
                    matched_range: None,
                    week_schedule: None,
                    day_schedule,
                    ambiguity,
                });
            }
        }

        let matched_range = select_range(date, catalog.date_ranges_for(template_id));
        let (source, week_schedule) = match matched_range {
            Some(range) => {
                let week = catalog.referenced_week_schedule(range.week_schedule_id, || {
                    format!("date range {}", range.id)
                })?;
                (
                    ResolutionSource::DateRange {
                        date_range_id: range.id,
                    },
                    week,
                )
            }
            None => {
                let base = template
                    .base_week_schedule_id
                    .ok_or(ScheduleError::MissingBaseWeekSchedule(template_id))?;
                let week = catalog
                    .referenced_week_schedule(base, || format!("template {template_id}"))?;
                (ResolutionSource::BaseWeek, week)
            }
        };

        let weekday = date.weekday();
        let day_schedule = match week_schedule.slot(weekday) {
            Some(day_id) => catalog.referenced_day_schedule(day_id, || {
                format!("week schedule {} ({weekday})", week_schedule.id)
            })?,
            None => DaySchedule::unassigned(),
        };

        tracing::debug!(
            %template_id,
            %date,
            source = source.label(),
            week = %week_schedule.id,
            day = %day_schedule.id,
            "resolved day schedule"
        );

        Ok(Resolution {
            template_id,
            date,
            source,
            matched_exception,
            matched_range,
            week_schedule: Some(week_schedule),
            day_schedule,
            ambiguity,
        })
    }

    pub fn resolve_day_schedule(
        &self,
        template_id: TemplateId,
        date: NaiveDate,
    ) -> ScheduleResult<DayScheduleId> {
        Ok(self.resolve(template_id, date)?.day_schedule_id())
    }

    pub fn explain(&self, template_id: TemplateId, date: NaiveDate) -> ScheduleResult<Explanation> {
        Ok(self.resolve(template_id, date)?.explain())
    }

    pub fn active_period(
        &self,
        day_schedule_id: DayScheduleId,
        time: NaiveTime,
    ) -> ScheduleResult<ActivePeriod> {
        Ok(self.catalog.day_schedule(day_schedule_id)?.active_period(time))
    }

    pub fn active_period_at(
        &self,
        template_id: TemplateId,
        at: NaiveDateTime,
    ) -> ScheduleResult<ActivePeriod> {
        let resolution = self.resolve(template_id, at.date())?;
        Ok(resolution.day_schedule.active_period(at.time()))
    }

    /// Target water temperature in effect, `None` while closed.
    pub fn target_temperature(
        &self,
        template_id: TemplateId,
        at: NaiveDateTime,
    ) -> ScheduleResult<Option<f64>> {
        Ok(self.active_period_at(template_id, at)?.target_temp())
    }

    pub fn is_open(&self, template_id: TemplateId, at: NaiveDateTime) -> ScheduleResult<bool> {
        Ok(!self.active_period_at(template_id, at)?.is_closed())
    }

    /// Scans forward from `from` for the next period start, looking at most
    /// `horizon_days` days past the starting date.
    pub fn next_opening(
        &self,
        template_id: TemplateId,
        from: NaiveDateTime,
        horizon_days: u32,
    ) -> ScheduleResult<Option<Opening>> {
        let today = self.resolve(template_id, from.date())?;
        if let Some(period) = today.day_schedule.next_opening_after(from.time()) {
            return Ok(Some(Opening {
                at: from.date().and_time(period.start),
                day_schedule_id: today.day_schedule.id,
                period: period.clone(),
            }));
        }

        for offset in 1..=i64::from(horizon_days) {
            let Some(date) = from.date().checked_add_signed(Duration::days(offset)) else {
                break;
            };
            let resolution = self.resolve(template_id, date)?;
            if let Some(period) = resolution.day_schedule.first_opening() {
                return Ok(Some(Opening {
                    at: date.and_time(period.start),
                    day_schedule_id: resolution.day_schedule.id,
                    period: period.clone(),
                }));
            }
        }
        Ok(None)
    }

    /// Resolves every date in `[start, end]`, at most `max_span_days` dates.
    /// Dates are independent, so they are resolved in parallel; the result
    /// keeps date order.
    pub fn resolve_span(
        &self,
        template_id: TemplateId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<Vec<ResolvedDay>> {
        if start > end {
            return Err(ScheduleError::validation(format!(
                "span start {start} is after end {end}"
            )));
        }
        let span_days = (end - start).num_days() + 1;
        if span_days > i64::from(self.max_span_days) {
            return Err(ScheduleError::validation(format!(
                "span {start}..={end} covers {span_days} days, limit is {}",
                self.max_span_days
            )));
        }
        self.catalog.template(template_id)?;
        let dates: Vec<NaiveDate> = start.iter_days().take_while(|date| *date <= end).collect();
        dates
            .par_iter()
            .map(|date| {
                self.resolve(template_id, *date)
                    .map(|resolution| ResolvedDay::from(&resolution))
            })
            .collect()
    }

    pub fn exception_calendar(&self, year: i32) -> ScheduleResult<Vec<ExceptionOccurrence>> {
        exception_calendar(year, self.catalog.exception_days(), self.catalog.reference_days())
    }

    pub fn reference_date(
        &self,
        reference_day: &ReferenceDayId,
        year: i32,
    ) -> ScheduleResult<NaiveDate> {
        self.catalog
            .reference_days()
            .compute_reference_date(reference_day, year)
    }
}
