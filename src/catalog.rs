//! The read-only tables a resolution runs against.
//!
//! A [`ScheduleCatalog`] is an immutable snapshot: callers load it once (from
//! JSON, SQLite or by hand), then share it freely across threads. Nothing in
//! the engine reaches for global state.

use crate::catalog_validation;
use crate::date_range::CalendarDateRange;
use crate::day_schedule::DaySchedule;
use crate::error::{EntityKind, ScheduleError, ScheduleResult};
use crate::exception_day::{ExceptionDayDefinition, ExceptionRule};
use crate::ids::{DayScheduleId, ExceptionDayId, TemplateId, WeekScheduleId};
use crate::reference_day::{ReferenceDay, ReferenceDays};
use crate::template::{ScheduleTemplate, ScheduleTemplateException};
use crate::week_schedule::WeekSchedule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_reference_days() -> Vec<ReferenceDay> {
    vec![ReferenceDay::easter()]
}

/// Serialisable form of every table the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub templates: Vec<ScheduleTemplate>,
    #[serde(default)]
    pub week_schedules: Vec<WeekSchedule>,
    #[serde(default)]
    pub day_schedules: Vec<DaySchedule>,
    #[serde(default)]
    pub date_ranges: Vec<CalendarDateRange>,
    #[serde(default)]
    pub exception_days: Vec<ExceptionDayDefinition>,
    #[serde(default)]
    pub template_exceptions: Vec<ScheduleTemplateException>,
    #[serde(default = "default_reference_days")]
    pub reference_days: Vec<ReferenceDay>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            week_schedules: Vec::new(),
            day_schedules: Vec::new(),
            date_ranges: Vec::new(),
            exception_days: Vec::new(),
            template_exceptions: Vec::new(),
            reference_days: default_reference_days(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleCatalog {
    templates: BTreeMap<TemplateId, ScheduleTemplate>,
    week_schedules: BTreeMap<WeekScheduleId, WeekSchedule>,
    day_schedules: BTreeMap<DayScheduleId, DaySchedule>,
    date_ranges: Vec<CalendarDateRange>,
    exception_days: Vec<ExceptionDayDefinition>,
    template_exceptions: BTreeMap<(TemplateId, ExceptionDayId), Option<DayScheduleId>>,
    reference_days: ReferenceDays,
}

impl Default for ScheduleCatalog {
    /// An empty catalog that still knows about Easter.
    fn default() -> Self {
        Self {
            templates: BTreeMap::new(),
            week_schedules: BTreeMap::new(),
            day_schedules: BTreeMap::new(),
            date_ranges: Vec::new(),
            exception_days: Vec::new(),
            template_exceptions: BTreeMap::new(),
            reference_days: ReferenceDays::with_defaults(),
        }
    }
}

impl ScheduleCatalog {
    /// Validates the snapshot and indexes it. Periods are put in start order.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> ScheduleResult<Self> {
        catalog_validation::validate_snapshot(&snapshot)?;

        let mut date_ranges = snapshot.date_ranges;
        date_ranges.sort_by_key(|range| range.id);
        let mut exception_days = snapshot.exception_days;
        exception_days.sort_by_key(|exception| exception.id);

        let catalog = Self {
            templates: snapshot
                .templates
                .into_iter()
                .map(|template| (template.id, template))
                .collect(),
            week_schedules: snapshot
                .week_schedules
                .into_iter()
                .map(|week| (week.id, week))
                .collect(),
            day_schedules: snapshot
                .day_schedules
                .into_iter()
                .map(|mut day| {
                    day.normalize();
                    (day.id, day)
                })
                .collect(),
            date_ranges,
            exception_days,
            template_exceptions: snapshot
                .template_exceptions
                .into_iter()
                .map(|link| {
                    (
                        (link.template_id, link.exception_day_id),
                        link.day_schedule_id,
                    )
                })
                .collect(),
            reference_days: ReferenceDays::new(snapshot.reference_days),
        };

        for problem in catalog.integrity_report() {
            tracing::warn!("catalog integrity: {problem}");
        }
        Ok(catalog)
    }

    pub fn to_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            templates: self.templates.values().cloned().collect(),
            week_schedules: self.week_schedules.values().cloned().collect(),
            day_schedules: self.day_schedules.values().cloned().collect(),
            date_ranges: self.date_ranges.clone(),
            exception_days: self.exception_days.clone(),
            template_exceptions: self
                .template_exceptions
                .iter()
                .map(|((template_id, exception_day_id), day_schedule_id)| {
                    ScheduleTemplateException {
                        template_id: *template_id,
                        exception_day_id: *exception_day_id,
                        day_schedule_id: *day_schedule_id,
                    }
                })
                .collect(),
            reference_days: self.reference_days.iter().cloned().collect(),
        }
    }

    pub fn templates(&self) -> impl Iterator<Item = &ScheduleTemplate> {
        self.templates.values()
    }

    /// Looks up a caller-selected template.
    pub fn template(&self, id: TemplateId) -> ScheduleResult<&ScheduleTemplate> {
        self.templates
            .get(&id)
            .ok_or_else(|| ScheduleError::not_found(EntityKind::Template, id))
    }

    /// Looks up a caller-selected day schedule.
    pub fn day_schedule(&self, id: DayScheduleId) -> ScheduleResult<&DaySchedule> {
        if id == DayScheduleId::UNASSIGNED {
            return Ok(DaySchedule::unassigned());
        }
        self.day_schedules
            .get(&id)
            .ok_or_else(|| ScheduleError::not_found(EntityKind::DaySchedule, id))
    }

    pub fn day_schedules(&self) -> impl Iterator<Item = &DaySchedule> {
        self.day_schedules.values()
    }

    pub(crate) fn referenced_week_schedule(
        &self,
        id: WeekScheduleId,
        referrer: impl FnOnce() -> String,
    ) -> ScheduleResult<&WeekSchedule> {
        self.week_schedules
            .get(&id)
            .ok_or_else(|| ScheduleError::broken(EntityKind::WeekSchedule, id, referrer()))
    }

    pub(crate) fn referenced_day_schedule(
        &self,
        id: DayScheduleId,
        referrer: impl FnOnce() -> String,
    ) -> ScheduleResult<&DaySchedule> {
        self.day_schedules
            .get(&id)
            .ok_or_else(|| ScheduleError::broken(EntityKind::DaySchedule, id, referrer()))
    }

    pub fn week_schedule(&self, id: WeekScheduleId) -> Option<&WeekSchedule> {
        self.week_schedules.get(&id)
    }

    /// Date ranges owned by `template`, in id order.
    pub fn date_ranges_for(
        &self,
        template: TemplateId,
    ) -> impl Iterator<Item = &CalendarDateRange> {
        self.date_ranges
            .iter()
            .filter(move |range| range.template_id == template)
    }

    /// Exception day definitions in id order.
    pub fn exception_days(&self) -> &[ExceptionDayDefinition] {
        &self.exception_days
    }

    /// The override linked to `(template, exception)`, if the pair is linked
    /// to a day schedule at all.
    pub fn exception_override(
        &self,
        template: TemplateId,
        exception: ExceptionDayId,
    ) -> Option<DayScheduleId> {
        self.template_exceptions
            .get(&(template, exception))
            .copied()
            .flatten()
    }

    pub fn reference_days(&self) -> &ReferenceDays {
        &self.reference_days
    }

    /// Every dangling id in the catalog, in table order.
    pub fn integrity_report(&self) -> Vec<ScheduleError> {
        let mut problems = Vec::new();

        for template in self.templates.values() {
            match template.base_week_schedule_id {
                None => problems.push(ScheduleError::MissingBaseWeekSchedule(template.id)),
                Some(week) if !self.week_schedules.contains_key(&week) => {
                    problems.push(ScheduleError::broken(
                        EntityKind::WeekSchedule,
                        week,
                        format!("template {}", template.id),
                    ));
                }
                Some(_) => {}
            }
        }

        for week in self.week_schedules.values() {
            for (weekday, day) in week.assigned() {
                if !self.day_schedules.contains_key(&day) {
                    problems.push(ScheduleError::broken(
                        EntityKind::DaySchedule,
                        day,
                        format!("week schedule {} ({weekday})", week.id),
                    ));
                }
            }
        }

        for range in &self.date_ranges {
            if !self.templates.contains_key(&range.template_id) {
                problems.push(ScheduleError::broken(
                    EntityKind::Template,
                    range.template_id,
                    format!("date range {}", range.id),
                ));
            }
            if !self.week_schedules.contains_key(&range.week_schedule_id) {
                problems.push(ScheduleError::broken(
                    EntityKind::WeekSchedule,
                    range.week_schedule_id,
                    format!("date range {}", range.id),
                ));
            }
        }

        for exception in &self.exception_days {
            if let ExceptionRule::Moving { reference_day, .. } = &exception.rule {
                if self.reference_days.get(reference_day).is_none() {
                    problems.push(ScheduleError::Configuration {
                        reference_day: reference_day.clone(),
                        reason: format!(
                            "no rule is registered (used by exception day {})",
                            exception.id
                        ),
                    });
                }
            }
        }

        for ((template, exception), day) in &self.template_exceptions {
            let referrer = || format!("template exception ({template}, {exception})");
            if !self.templates.contains_key(template) {
                problems.push(ScheduleError::broken(EntityKind::Template, template, referrer()));
            }
            if self.exception_days.iter().all(|e| e.id != *exception) {
                problems.push(ScheduleError::broken(
                    EntityKind::ExceptionDay,
                    exception,
                    referrer(),
                ));
            }
            if let Some(day) = day {
                if !self.day_schedules.contains_key(day) {
                    problems.push(ScheduleError::broken(EntityKind::DaySchedule, day, referrer()));
                }
            }
        }

        problems
    }
}
