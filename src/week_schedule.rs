use crate::ids::{DayScheduleId, WeekScheduleId};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Seven weekday slots, Monday first. An empty slot means no plan that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub id: WeekScheduleId,
    pub name: String,
    pub days: [Option<DayScheduleId>; 7],
}

impl WeekSchedule {
    pub const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new(id: WeekScheduleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            days: [None; 7],
        }
    }

    /// Every weekday mapped to the same day schedule.
    pub fn uniform(id: WeekScheduleId, name: impl Into<String>, day: DayScheduleId) -> Self {
        Self {
            id,
            name: name.into(),
            days: [Some(day); 7],
        }
    }

    pub fn with_slot(mut self, weekday: Weekday, day: Option<DayScheduleId>) -> Self {
        self.set_slot(weekday, day);
        self
    }

    pub fn slot(&self, weekday: Weekday) -> Option<DayScheduleId> {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set_slot(&mut self, weekday: Weekday, day: Option<DayScheduleId>) {
        self.days[weekday.num_days_from_monday() as usize] = day;
    }

    pub fn assigned(&self) -> impl Iterator<Item = (Weekday, DayScheduleId)> + '_ {
        Self::WEEKDAYS
            .iter()
            .zip(self.days.iter())
            .filter_map(|(weekday, slot)| slot.map(|day| (*weekday, day)))
    }
}
