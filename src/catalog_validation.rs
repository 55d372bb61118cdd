use crate::catalog::CatalogSnapshot;
use crate::error::{ScheduleError, ScheduleResult};
use std::collections::HashSet;
use std::fmt::Display;

fn ensure_unique<I, K>(label: &str, ids: I) -> ScheduleResult<()>
where
    I: IntoIterator<Item = K>,
    K: Display,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.to_string()) {
            return Err(ScheduleError::validation(format!("duplicate {label} id {id}")));
        }
    }
    Ok(())
}

/// Structural checks on a snapshot. Dangling references are left to the
/// resolver, which reports them with the offending id.
pub fn validate_snapshot(snapshot: &CatalogSnapshot) -> ScheduleResult<()> {
    ensure_unique("template", snapshot.templates.iter().map(|t| t.id))?;
    ensure_unique("week schedule", snapshot.week_schedules.iter().map(|w| w.id))?;
    ensure_unique("day schedule", snapshot.day_schedules.iter().map(|d| d.id))?;
    ensure_unique("date range", snapshot.date_ranges.iter().map(|r| r.id))?;
    ensure_unique("exception day", snapshot.exception_days.iter().map(|e| e.id))?;
    ensure_unique(
        "reference day",
        snapshot.reference_days.iter().map(|r| r.id.clone()),
    )?;

    for template in &snapshot.templates {
        if template.name.trim().is_empty() {
            return Err(ScheduleError::validation(format!(
                "template {} requires a non-empty name",
                template.id
            )));
        }
    }

    for day in &snapshot.day_schedules {
        day.validate()?;
    }

    for exception in &snapshot.exception_days {
        exception.validate()?;
    }

    for reference in &snapshot.reference_days {
        reference.validate()?;
    }

    let mut links = HashSet::with_capacity(snapshot.template_exceptions.len());
    for link in &snapshot.template_exceptions {
        if !links.insert((link.template_id, link.exception_day_id)) {
            return Err(ScheduleError::validation(format!(
                "template {} links exception day {} more than once",
                link.template_id, link.exception_day_id
            )));
        }
    }

    Ok(())
}
