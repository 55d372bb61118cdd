//! Daily heating plans and the evaluator that reads them at a time of day.

use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::DayScheduleId;
use crate::parse::time_of_day;
use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// A sub-interval `[start, end)` of one day with its temperature band.
///
/// An `end` of `00:00` stands for midnight at the close of the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    #[serde(with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end: NaiveTime,
    pub target_temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    /// Tie-break between periods that start at the same time.
    #[serde(default)]
    pub order: i32,
}

impl TimePeriod {
    pub fn new(start: NaiveTime, end: NaiveTime, target_temp: f64) -> Self {
        Self {
            start,
            end,
            target_temp,
            min_temp: None,
            max_temp: None,
            order: 0,
        }
    }

    pub fn with_band(mut self, min_temp: f64, max_temp: f64) -> Self {
        self.min_temp = Some(min_temp);
        self.max_temp = Some(max_temp);
        self
    }

    pub fn start_seconds(&self) -> u32 {
        self.start.num_seconds_from_midnight()
    }

    pub fn end_seconds(&self) -> u32 {
        match self.end.num_seconds_from_midnight() {
            0 => SECONDS_PER_DAY,
            secs => secs,
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let at = time.num_seconds_from_midnight();
        self.start_seconds() <= at && at < self.end_seconds()
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::from(self.end_seconds().saturating_sub(self.start_seconds())))
    }

    fn sort_key(&self) -> (u32, i32) {
        (self.start_seconds(), self.order)
    }
}

/// What a day plan does with instants no period covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    #[default]
    Closed,
    /// Keep the most recent period that already ended.
    HoldPrevious,
}

/// Result of evaluating a day plan at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "period", rename_all = "snake_case")]
pub enum ActivePeriod {
    Open(TimePeriod),
    /// Inside a gap, holding the previous period under [`GapPolicy::HoldPrevious`].
    Holding(TimePeriod),
    Closed,
}

impl ActivePeriod {
    pub fn period(&self) -> Option<&TimePeriod> {
        match self {
            ActivePeriod::Open(period) | ActivePeriod::Holding(period) => Some(period),
            ActivePeriod::Closed => None,
        }
    }

    pub fn target_temp(&self) -> Option<f64> {
        self.period().map(|period| period.target_temp)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ActivePeriod::Closed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivePeriod::Open(_) => "open",
            ActivePeriod::Holding(_) => "holding",
            ActivePeriod::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Open,
    Close,
}

/// A change of plan within a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    /// Seconds after midnight; 86400 marks the end of the day.
    pub at_seconds: u32,
    pub kind: TransitionKind,
    pub target_temp: Option<f64>,
    pub from_temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub id: DayScheduleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub gap_policy: GapPolicy,
    #[serde(default)]
    pub periods: Vec<TimePeriod>,
}

static UNASSIGNED: LazyLock<DaySchedule> = LazyLock::new(|| DaySchedule {
    id: DayScheduleId::UNASSIGNED,
    name: "Closed (no plan)".to_string(),
    description: "Weekday slot without a day schedule".to_string(),
    is_closed: true,
    gap_policy: GapPolicy::Closed,
    periods: Vec::new(),
});

impl DaySchedule {
    /// Builds an open day plan; periods are put in start order.
    pub fn new(id: DayScheduleId, name: impl Into<String>, periods: Vec<TimePeriod>) -> Self {
        let mut schedule = Self {
            id,
            name: name.into(),
            description: String::new(),
            is_closed: false,
            gap_policy: GapPolicy::Closed,
            periods,
        };
        schedule.normalize();
        schedule
    }

    pub fn closed(id: DayScheduleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            is_closed: true,
            gap_policy: GapPolicy::Closed,
            periods: Vec::new(),
        }
    }

    /// Shared stand-in for weekday slots that carry no day schedule.
    pub fn unassigned() -> &'static DaySchedule {
        &UNASSIGNED
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    /// Sorts periods by start time, `order` breaking ties.
    pub fn normalize(&mut self) {
        self.periods.sort_by_key(TimePeriod::sort_key);
    }

    pub fn active_period(&self, time: NaiveTime) -> ActivePeriod {
        if self.is_closed {
            return ActivePeriod::Closed;
        }
        if let Some(period) = self.periods.iter().find(|period| period.contains(time)) {
            return ActivePeriod::Open(period.clone());
        }
        match self.gap_policy {
            GapPolicy::Closed => ActivePeriod::Closed,
            GapPolicy::HoldPrevious => {
                let at = time.num_seconds_from_midnight();
                self.periods
                    .iter()
                    .filter(|period| period.end_seconds() <= at)
                    .max_by_key(|period| (period.end_seconds(), period.start_seconds()))
                    .map(|period| ActivePeriod::Holding(period.clone()))
                    .unwrap_or(ActivePeriod::Closed)
            }
        }
    }

    /// Total time covered by periods; zero for a closed day.
    pub fn open_duration(&self) -> Duration {
        if self.is_closed {
            return Duration::zero();
        }
        self.periods
            .iter()
            .fold(Duration::zero(), |total, period| total + period.duration())
    }

    /// First period starting strictly after `time`.
    pub fn next_opening_after(&self, time: NaiveTime) -> Option<&TimePeriod> {
        if self.is_closed {
            return None;
        }
        let at = time.num_seconds_from_midnight();
        self.periods.iter().find(|period| period.start_seconds() > at)
    }

    pub fn first_opening(&self) -> Option<&TimePeriod> {
        if self.is_closed {
            return None;
        }
        self.periods.first()
    }

    /// Open/close transitions in time order. Every open after the first
    /// carries the previous period's target in `from_temp`, across gaps too;
    /// back-to-back periods produce a single open transition.
    pub fn transitions(&self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if self.is_closed {
            return transitions;
        }
        let mut previous: Option<&TimePeriod> = None;
        for (idx, period) in self.periods.iter().enumerate() {
            let from_temp = previous.map(|prev| prev.target_temp);
            transitions.push(Transition {
                at_seconds: period.start_seconds(),
                kind: TransitionKind::Open,
                target_temp: Some(period.target_temp),
                from_temp,
            });
            let continues = self
                .periods
                .get(idx + 1)
                .is_some_and(|next| next.start_seconds() == period.end_seconds());
            if !continues {
                transitions.push(Transition {
                    at_seconds: period.end_seconds(),
                    kind: TransitionKind::Close,
                    target_temp: None,
                    from_temp: Some(period.target_temp),
                });
            }
            previous = Some(period);
        }
        transitions
    }

    pub(crate) fn validate(&self) -> ScheduleResult<()> {
        if self.id == DayScheduleId::UNASSIGNED {
            return Err(ScheduleError::validation(format!(
                "day schedule '{}' uses reserved id {}",
                self.name,
                DayScheduleId::UNASSIGNED
            )));
        }
        for period in &self.periods {
            self.validate_period(period)?;
        }
        let mut ordered: Vec<&TimePeriod> = self.periods.iter().collect();
        ordered.sort_by_key(|period| period.sort_key());
        for pair in ordered.windows(2) {
            if pair[1].start_seconds() < pair[0].end_seconds() {
                return Err(ScheduleError::validation(format!(
                    "day schedule {} has overlapping periods {}-{} and {}-{}",
                    self.id,
                    pair[0].start.format("%H:%M"),
                    pair[0].end.format("%H:%M"),
                    pair[1].start.format("%H:%M"),
                    pair[1].end.format("%H:%M"),
                )));
            }
        }
        Ok(())
    }

    fn validate_period(&self, period: &TimePeriod) -> ScheduleResult<()> {
        if period.start_seconds() >= period.end_seconds() {
            return Err(ScheduleError::validation(format!(
                "day schedule {} has a period ending at or before its start ({})",
                self.id,
                period.start.format("%H:%M")
            )));
        }
        let temps = [Some(period.target_temp), period.min_temp, period.max_temp];
        if temps.iter().flatten().any(|temp| !temp.is_finite()) {
            return Err(ScheduleError::validation(format!(
                "day schedule {} has a non-finite temperature",
                self.id
            )));
        }
        if let Some(min) = period.min_temp {
            if min > period.target_temp {
                return Err(ScheduleError::validation(format!(
                    "day schedule {} has min_temp {min} above target {}",
                    self.id, period.target_temp
                )));
            }
        }
        if let Some(max) = period.max_temp {
            if max < period.target_temp {
                return Err(ScheduleError::validation(format!(
                    "day schedule {} has max_temp {max} below target {}",
                    self.id, period.target_temp
                )));
            }
        }
        Ok(())
    }
}
