use crate::ids::{DayScheduleId, ExceptionDayId, TemplateId, WeekScheduleId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Priority-0 plan that applies whenever no range matches.
    pub base_week_schedule_id: Option<WeekScheduleId>,
    /// The system default template cannot be deleted by administrators.
    #[serde(default)]
    pub is_default: bool,
}

impl ScheduleTemplate {
    pub fn new(id: TemplateId, name: impl Into<String>, base: WeekScheduleId) -> Self {
        Self {
            id,
            name: name.into(),
            version: "1".to_string(),
            description: String::new(),
            base_week_schedule_id: Some(base),
            is_default: false,
        }
    }
}

/// Links a template to an exception day with the day plan to use on it.
///
/// A `None` day schedule is the explicit "not special for this template" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTemplateException {
    pub template_id: TemplateId,
    pub exception_day_id: ExceptionDayId,
    pub day_schedule_id: Option<DayScheduleId>,
}

impl ScheduleTemplateException {
    pub fn new(
        template_id: TemplateId,
        exception_day_id: ExceptionDayId,
        day_schedule_id: DayScheduleId,
    ) -> Self {
        Self {
            template_id,
            exception_day_id,
            day_schedule_id: Some(day_schedule_id),
        }
    }
}
