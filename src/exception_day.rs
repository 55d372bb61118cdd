//! Named holiday / exception days, fixed or anchored to a reference day.

use crate::date_range::MonthDay;
use crate::error::{AmbiguousException, ScheduleError, ScheduleResult};
use crate::ids::{ExceptionDayId, ReferenceDayId};
use crate::reference_day::ReferenceDays;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExceptionRule {
    /// Same month and day every year, e.g. Christmas Day.
    Fixed { month: u32, day: u32 },
    /// A signed day offset from a reference day, e.g. Easter - 2 for Good Friday.
    Moving {
        reference_day: ReferenceDayId,
        offset_days: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDayDefinition {
    pub id: ExceptionDayId,
    pub name: String,
    #[serde(flatten)]
    pub rule: ExceptionRule,
}

impl ExceptionDayDefinition {
    pub fn fixed(id: ExceptionDayId, name: impl Into<String>, month: u32, day: u32) -> Self {
        Self {
            id,
            name: name.into(),
            rule: ExceptionRule::Fixed { month, day },
        }
    }

    pub fn moving(
        id: ExceptionDayId,
        name: impl Into<String>,
        reference_day: impl Into<ReferenceDayId>,
        offset_days: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rule: ExceptionRule::Moving {
                reference_day: reference_day.into(),
                offset_days,
            },
        }
    }

    /// The concrete date this exception day falls on in `year`.
    ///
    /// `None` when a fixed Feb 29 meets a common year, or when a moving offset
    /// carries the day out of `year`.
    pub fn date_in_year(
        &self,
        year: i32,
        reference_days: &ReferenceDays,
    ) -> ScheduleResult<Option<NaiveDate>> {
        match &self.rule {
            ExceptionRule::Fixed { month, day } => Ok(NaiveDate::from_ymd_opt(year, *month, *day)),
            ExceptionRule::Moving {
                reference_day,
                offset_days,
            } => {
                let anchor = reference_days.compute_reference_date(reference_day, year)?;
                Ok(anchor
                    .checked_add_signed(Duration::days(i64::from(*offset_days)))
                    .filter(|date| date.year() == year))
            }
        }
    }

    pub fn matches(&self, date: NaiveDate, reference_days: &ReferenceDays) -> ScheduleResult<bool> {
        match &self.rule {
            ExceptionRule::Fixed { month, day } => Ok(date.month() == *month && date.day() == *day),
            ExceptionRule::Moving { .. } => {
                Ok(self.date_in_year(date.year(), reference_days)? == Some(date))
            }
        }
    }

    pub(crate) fn validate(&self) -> ScheduleResult<()> {
        if self.name.trim().is_empty() {
            return Err(ScheduleError::validation(format!(
                "exception day {} requires a non-empty name",
                self.id
            )));
        }
        if let ExceptionRule::Fixed { month, day } = self.rule {
            MonthDay::new(month, day).map_err(|err| {
                ScheduleError::validation(format!("exception day {}: {err}", self.id))
            })?;
        }
        Ok(())
    }
}

/// Outcome of matching a date against the exception day table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionMatch<'a> {
    pub definition: &'a ExceptionDayDefinition,
    /// Set when more than one definition landed on the date.
    pub ambiguity: Option<AmbiguousException>,
}

/// Finds the exception day definition that `date` falls on.
///
/// Several matches are a data-quality problem, not a failure: the lowest id is
/// returned and the collision is logged and attached to the match.
pub fn matching_exception_day<'a>(
    date: NaiveDate,
    definitions: &'a [ExceptionDayDefinition],
    reference_days: &ReferenceDays,
) -> ScheduleResult<Option<ExceptionMatch<'a>>> {
    let mut hits: Vec<&'a ExceptionDayDefinition> = Vec::new();
    for definition in definitions {
        if definition.matches(date, reference_days)? {
            hits.push(definition);
        }
    }
    hits.sort_by_key(|definition| definition.id);

    let Some(first) = hits.first().copied() else {
        return Ok(None);
    };
    let ambiguity = (hits.len() > 1).then(|| AmbiguousException {
        date,
        chosen: first.id,
        candidates: hits.iter().map(|definition| definition.id).collect(),
    });
    if let Some(report) = &ambiguity {
        tracing::warn!(%date, chosen = %first.id, "{report}");
    }

    Ok(Some(ExceptionMatch {
        definition: first,
        ambiguity,
    }))
}

/// One exception day placed on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionOccurrence {
    pub date: NaiveDate,
    pub exception_day_id: ExceptionDayId,
    pub name: String,
}

/// Every definition's date in `year`, ordered by date then id.
pub fn exception_calendar(
    year: i32,
    definitions: &[ExceptionDayDefinition],
    reference_days: &ReferenceDays,
) -> ScheduleResult<Vec<ExceptionOccurrence>> {
    let mut occurrences = Vec::with_capacity(definitions.len());
    for definition in definitions {
        if let Some(date) = definition.date_in_year(year, reference_days)? {
            occurrences.push(ExceptionOccurrence {
                date,
                exception_day_id: definition.id,
                name: definition.name.clone(),
            });
        }
    }
    occurrences.sort_by_key(|occurrence| (occurrence.date, occurrence.exception_day_id));
    Ok(occurrences)
}
