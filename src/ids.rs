//! Typed identifiers for catalog rows.
//!
//! Row ids come straight from the relational store, so they wrap `i64` and
//! serialise as bare numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

typed_id! {
    /// A named, versioned bundle of scheduling rules.
    pub struct TemplateId;
}

typed_id! {
    pub struct WeekScheduleId;
}

typed_id! {
    pub struct DayScheduleId;
}

typed_id! {
    /// Global exception day definition (shared by every template).
    pub struct ExceptionDayId;
}

typed_id! {
    pub struct DateRangeId;
}

impl DayScheduleId {
    /// Id of the synthetic "closed" schedule used for unassigned weekday slots.
    /// Stored day schedules may not use it.
    pub const UNASSIGNED: DayScheduleId = DayScheduleId(0);
}

/// Identifier of a yearly anchor such as Easter Sunday.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceDayId(pub String);

impl ReferenceDayId {
    pub const EASTER: &'static str = "easter";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn easter() -> Self {
        Self(Self::EASTER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceDayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceDayId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
