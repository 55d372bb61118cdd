use super::{PersistenceError, PersistenceResult};
use crate::catalog::{CatalogSnapshot, ScheduleCatalog};
use crate::exception_day::{ExceptionDayDefinition, ExceptionRule};
use crate::ids::{ExceptionDayId, ReferenceDayId};
use crate::resolver::ResolvedDay;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_catalog_to_json<P: AsRef<Path>>(
    catalog: &ScheduleCatalog,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &catalog.to_snapshot())?;
    Ok(())
}

/// Reads and validates a catalog snapshot written by [`save_catalog_to_json`].
pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ScheduleCatalog> {
    let file = File::open(path)?;
    let snapshot: CatalogSnapshot = serde_json::from_reader(file)?;
    Ok(ScheduleCatalog::from_snapshot(snapshot)?)
}

/// Bulk-import row: `kind` is `fixed` (month/day) or `moving`
/// (reference_day/offset_days); unused columns stay empty.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExceptionDayCsvRecord {
    id: i64,
    name: String,
    kind: String,
    #[serde(default)]
    month: String,
    #[serde(default)]
    day: String,
    #[serde(default)]
    reference_day: String,
    #[serde(default)]
    offset_days: String,
}

impl ExceptionDayCsvRecord {
    fn into_definition(self) -> PersistenceResult<ExceptionDayDefinition> {
        let rule = match self.kind.trim().to_ascii_lowercase().as_str() {
            "fixed" => ExceptionRule::Fixed {
                month: parse_number(&self.month, "month", self.id)?,
                day: parse_number(&self.day, "day", self.id)?,
            },
            "moving" => {
                let reference_day = self.reference_day.trim();
                if reference_day.is_empty() {
                    return Err(PersistenceError::InvalidData(format!(
                        "exception day {} is moving but has no reference_day",
                        self.id
                    )));
                }
                ExceptionRule::Moving {
                    reference_day: ReferenceDayId::new(reference_day),
                    offset_days: parse_number(&self.offset_days, "offset_days", self.id)?,
                }
            }
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "exception day {} has unknown kind '{other}' (fixed|moving)",
                    self.id
                )));
            }
        };
        Ok(ExceptionDayDefinition {
            id: ExceptionDayId(self.id),
            name: self.name,
            rule,
        })
    }
}

fn parse_number<T: std::str::FromStr>(input: &str, column: &str, id: i64) -> PersistenceResult<T> {
    input.trim().parse::<T>().map_err(|_| {
        PersistenceError::InvalidData(format!(
            "exception day {id} has invalid {column} '{input}'"
        ))
    })
}

pub fn load_exception_days_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<ExceptionDayDefinition>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut definitions = Vec::new();
    for record in reader.deserialize::<ExceptionDayCsvRecord>() {
        let definition = record?.into_definition()?;
        definition.validate()?;
        definitions.push(definition);
    }
    if definitions.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no exception days".into(),
        ));
    }
    Ok(definitions)
}

#[derive(Debug, Serialize)]
struct ResolvedDayCsvRecord<'a> {
    date: String,
    weekday: String,
    day_schedule_id: i64,
    day_schedule: &'a str,
    is_closed: bool,
    source: &'static str,
    exception_day_id: Option<i64>,
    date_range_id: Option<i64>,
    week_schedule_id: Option<i64>,
    open_minutes: i64,
}

impl<'a> From<&'a ResolvedDay> for ResolvedDayCsvRecord<'a> {
    fn from(day: &'a ResolvedDay) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            weekday: day.date.weekday().to_string(),
            day_schedule_id: day.day_schedule_id.get(),
            day_schedule: &day.day_schedule_name,
            is_closed: day.is_closed,
            source: day.source.label(),
            exception_day_id: day.exception_day_id.map(|id| id.get()),
            date_range_id: day.date_range_id.map(|id| id.get()),
            week_schedule_id: day.week_schedule_id.map(|id| id.get()),
            open_minutes: day.open_minutes,
        }
    }
}

pub fn save_resolved_days_to_csv<P: AsRef<Path>>(
    days: &[ResolvedDay],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for day in days {
        writer.serialize(ResolvedDayCsvRecord::from(day))?;
    }
    writer.flush()?;
    Ok(())
}
