use crate::ids::{ExceptionDayId, ReferenceDayId, TemplateId};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of catalog row an error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Template,
    WeekSchedule,
    DaySchedule,
    ExceptionDay,
    DateRange,
    ReferenceDay,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Template => "template",
            EntityKind::WeekSchedule => "week schedule",
            EntityKind::DaySchedule => "day schedule",
            EntityKind::ExceptionDay => "exception day",
            EntityKind::DateRange => "date range",
            EntityKind::ReferenceDay => "reference day",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Malformed input rejected before resolution starts.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: reference day '{reference_day}': {reason}")]
    Configuration {
        reference_day: ReferenceDayId,
        reason: String,
    },

    #[error("broken reference: {entity} {id} referenced by {referrer} does not exist")]
    BrokenReference {
        entity: EntityKind,
        id: String,
        referrer: String,
    },

    #[error("broken reference: template {0} has no base week schedule")]
    MissingBaseWeekSchedule(TemplateId),

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },
}

impl ScheduleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScheduleError::Validation(message.into())
    }

    pub fn broken(entity: EntityKind, id: impl fmt::Display, referrer: impl Into<String>) -> Self {
        ScheduleError::BrokenReference {
            entity,
            id: id.to_string(),
            referrer: referrer.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        ScheduleError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_broken_reference(&self) -> bool {
        matches!(
            self,
            ScheduleError::BrokenReference { .. } | ScheduleError::MissingBaseWeekSchedule(_)
        )
    }

    /// Stable machine-readable code, used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::Validation(_) => "validation_error",
            ScheduleError::Configuration { .. } => "configuration_error",
            ScheduleError::BrokenReference { .. } | ScheduleError::MissingBaseWeekSchedule(_) => {
                "broken_reference"
            }
            ScheduleError::NotFound { .. } => "not_found",
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Two or more exception day definitions land on the same date.
///
/// Reported next to a successful match; resolution continues with `chosen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error(
    "{date} matches {} exception day definitions ({}); using {chosen}",
    .candidates.len(),
    join_ids(.candidates)
)]
pub struct AmbiguousException {
    pub date: NaiveDate,
    pub chosen: ExceptionDayId,
    pub candidates: Vec<ExceptionDayId>,
}

fn join_ids(ids: &[ExceptionDayId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
