use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::{DateRangeId, TemplateId, WeekScheduleId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A recurring calendar day, ordered by (month, day).
///
/// Written as `MM-DD`. An absolute `YYYY-MM-DD` date is accepted on input and
/// its year dropped, which gives stored absolute ranges the every-year reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// February 29 is allowed: recurring days are checked against a leap year.
    pub fn new(month: u32, day: u32) -> ScheduleResult<Self> {
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(ScheduleError::validation(format!(
                "invalid month/day {month:02}-{day:02}"
            )));
        }
        Ok(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn day(self) -> u32 {
        self.day
    }

    /// The concrete date in `year`, or `None` for Feb 29 in a common year.
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('-').collect();
        let (month, day) = match parts.as_slice() {
            [month, day] => (*month, *day),
            [_year, month, day] => (*month, *day),
            _ => {
                return Err(ScheduleError::validation(format!(
                    "invalid month/day '{s}' (MM-DD or YYYY-MM-DD)"
                )));
            }
        };
        let month = month
            .parse::<u32>()
            .map_err(|_| ScheduleError::validation(format!("invalid month in '{s}'")))?;
        let day = day
            .parse::<u32>()
            .map_err(|_| ScheduleError::validation(format!("invalid day in '{s}'")))?;
        MonthDay::new(month, day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

fn default_active() -> bool {
    true
}

/// A seasonal override layered above a template's base week schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDateRange {
    pub id: DateRangeId,
    pub template_id: TemplateId,
    #[serde(default)]
    pub name: String,
    pub start: MonthDay,
    pub end: MonthDay,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub week_schedule_id: WeekScheduleId,
}

impl CalendarDateRange {
    pub fn new(
        id: DateRangeId,
        template_id: TemplateId,
        start: MonthDay,
        end: MonthDay,
        priority: i32,
        week_schedule_id: WeekScheduleId,
    ) -> Self {
        Self {
            id,
            template_id,
            name: String::new(),
            start,
            end,
            priority,
            is_active: true,
            week_schedule_id,
        }
    }

    /// True for ranges such as Nov 1 - Feb 28 that run across New Year.
    pub fn wraps_year(&self) -> bool {
        self.start > self.end
    }

    /// Calendar containment only; the year of `date` is ignored and both ends
    /// are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let candidate = MonthDay::of(date);
        if self.wraps_year() {
            candidate >= self.start || candidate <= self.end
        } else {
            self.start <= candidate && candidate <= self.end
        }
    }

    /// Inactive ranges never match.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.is_active && self.contains(date)
    }
}

/// Picks the matching range with the highest priority; equal priorities go to
/// the lowest range id.
pub fn select_range<'a, I>(date: NaiveDate, ranges: I) -> Option<&'a CalendarDateRange>
where
    I: IntoIterator<Item = &'a CalendarDateRange>,
{
    ranges
        .into_iter()
        .filter(|range| range.matches(date))
        .min_by(|a, b| match b.priority.cmp(&a.priority) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        })
}
