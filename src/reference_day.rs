//! Yearly anchor dates (Easter Sunday and friends).

use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::ReferenceDayId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule used to place a reference day inside a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRule {
    GregorianEaster,
}

impl ReferenceRule {
    pub fn date_in_year(self, year: i32) -> Option<NaiveDate> {
        match self {
            ReferenceRule::GregorianEaster => gregorian_easter(year),
        }
    }
}

/// Easter Sunday by the anonymous Gregorian (Meeus/Jones/Butcher) algorithm.
///
/// Uses floored division throughout so years before 1 AD still produce a
/// date. Returns `None` only when the year lies outside chrono's range.
pub fn gregorian_easter(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c.div_euclid(4);
    let k = c.rem_euclid(4);
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l).div_euclid(451);
    let month = (h + l - 7 * m + 114).div_euclid(31);
    let day = (h + l - 7 * m + 114).rem_euclid(31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDay {
    pub id: ReferenceDayId,
    pub name: String,
    pub rule: ReferenceRule,
    /// Pinned dates that take precedence over `rule` for their year.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<i32, NaiveDate>,
}

impl ReferenceDay {
    pub fn new(id: impl Into<ReferenceDayId>, name: impl Into<String>, rule: ReferenceRule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rule,
            overrides: BTreeMap::new(),
        }
    }

    pub fn easter() -> Self {
        Self::new(ReferenceDayId::easter(), "Easter Sunday", ReferenceRule::GregorianEaster)
    }

    pub fn date_in_year(&self, year: i32) -> ScheduleResult<NaiveDate> {
        if let Some(date) = self.overrides.get(&year) {
            return Ok(*date);
        }
        self.rule
            .date_in_year(year)
            .ok_or_else(|| ScheduleError::Configuration {
                reference_day: self.id.clone(),
                reason: format!("year {year} is outside the supported calendar range"),
            })
    }

    pub(crate) fn validate(&self) -> ScheduleResult<()> {
        for (year, date) in &self.overrides {
            if date.year() != *year {
                return Err(ScheduleError::validation(format!(
                    "reference day '{}' pins {date} under year {year}",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Registry of reference days injected into every resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceDays {
    days: BTreeMap<ReferenceDayId, ReferenceDay>,
}

impl ReferenceDays {
    pub fn new<I>(days: I) -> Self
    where
        I: IntoIterator<Item = ReferenceDay>,
    {
        Self {
            days: days.into_iter().map(|day| (day.id.clone(), day)).collect(),
        }
    }

    /// Registry containing only Easter Sunday.
    pub fn with_defaults() -> Self {
        Self::new([ReferenceDay::easter()])
    }

    pub fn get(&self, id: &ReferenceDayId) -> Option<&ReferenceDay> {
        self.days.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceDay> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn compute_reference_date(&self, id: &ReferenceDayId, year: i32) -> ScheduleResult<NaiveDate> {
        let day = self.get(id).ok_or_else(|| ScheduleError::Configuration {
            reference_day: id.clone(),
            reason: "no rule is registered for this reference day".to_string(),
        })?;
        day.date_in_year(year)
    }
}
