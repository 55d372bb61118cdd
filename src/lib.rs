pub mod catalog;
pub(crate) mod catalog_validation;
pub mod config;
pub mod date_range;
pub mod day_schedule;
pub mod error;
pub mod exception_day;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ids;
pub mod parse;
pub mod persistence;
pub mod plan_frame;
pub mod reference_day;
pub mod resolver;
pub mod template;
pub mod week_schedule;

pub use catalog::{CatalogSnapshot, ScheduleCatalog};
pub use config::{ConfigError, EngineConfig};
pub use date_range::{CalendarDateRange, MonthDay, select_range};
pub use day_schedule::{
    ActivePeriod, DaySchedule, GapPolicy, TimePeriod, Transition, TransitionKind,
};
pub use error::{AmbiguousException, EntityKind, ScheduleError, ScheduleResult};
pub use exception_day::{
    ExceptionDayDefinition, ExceptionOccurrence, ExceptionRule, exception_calendar,
    matching_exception_day,
};
pub use ids::{
    DateRangeId, DayScheduleId, ExceptionDayId, ReferenceDayId, TemplateId, WeekScheduleId,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteCatalogStore;
pub use persistence::{
    CatalogStore, PersistenceError, PersistenceResult, load_catalog_from_json,
    load_exception_days_from_csv, save_catalog_to_json, save_resolved_days_to_csv,
};
pub use plan_frame::{PlanFrameError, day_frame, hourly_frame};
pub use reference_day::{ReferenceDay, ReferenceDays, ReferenceRule, gregorian_easter};
pub use resolver::{
    Explanation, Opening, Resolution, ResolutionSource, ResolvedDay, Resolver,
};
pub use template::{ScheduleTemplate, ScheduleTemplateException};
pub use week_schedule::WeekSchedule;
