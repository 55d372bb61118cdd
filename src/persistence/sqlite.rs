use super::{CatalogStore, PersistenceError, PersistenceResult};
use crate::catalog::CatalogSnapshot;
use crate::date_range::{CalendarDateRange, MonthDay};
use crate::day_schedule::{DaySchedule, GapPolicy, TimePeriod};
use crate::exception_day::{ExceptionDayDefinition, ExceptionRule};
use crate::ids::{
    DateRangeId, DayScheduleId, ExceptionDayId, ReferenceDayId, TemplateId, WeekScheduleId,
};
use crate::parse::{format_time_of_day, parse_date, parse_time_of_day};
use crate::reference_day::{ReferenceDay, ReferenceRule};
use crate::template::{ScheduleTemplate, ScheduleTemplateException};
use crate::week_schedule::WeekSchedule;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteCatalogStore {
    connection: Mutex<Connection>,
}

const WEEKDAY_COLUMNS: &str = "monday, tuesday, wednesday, thursday, friday, saturday, sunday";

impl SqliteCatalogStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS catalog_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS reference_days (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                rule TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS reference_day_overrides (
                reference_day_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                date TEXT NOT NULL,
                PRIMARY KEY (reference_day_id, year)
            );
            CREATE TABLE IF NOT EXISTS exception_days (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                month INTEGER,
                day INTEGER,
                reference_day TEXT,
                offset_days INTEGER
            );
            CREATE TABLE IF NOT EXISTS day_schedules (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_closed INTEGER NOT NULL DEFAULT 0,
                gap_policy TEXT NOT NULL DEFAULT 'closed'
            );
            CREATE TABLE IF NOT EXISTS day_schedule_periods (
                day_schedule_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                target_temp REAL NOT NULL,
                min_temp REAL,
                max_temp REAL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (day_schedule_id, position)
            );
            CREATE TABLE IF NOT EXISTS week_schedules (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                monday INTEGER,
                tuesday INTEGER,
                wednesday INTEGER,
                thursday INTEGER,
                friday INTEGER,
                saturday INTEGER,
                sunday INTEGER
            );
            CREATE TABLE IF NOT EXISTS schedule_templates (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                base_week_schedule_id INTEGER,
                is_default INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS calendar_date_ranges (
                id INTEGER PRIMARY KEY,
                template_id INTEGER NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                start_day TEXT NOT NULL,
                end_day TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                week_schedule_id INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS template_exceptions (
                template_id INTEGER NOT NULL,
                exception_day_id INTEGER NOT NULL,
                day_schedule_id INTEGER,
                PRIMARY KEY (template_id, exception_day_id)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn clear(tx: &Transaction) -> PersistenceResult<()> {
        tx.execute_batch(
            r#"
            DELETE FROM catalog_metadata;
            DELETE FROM reference_days;
            DELETE FROM reference_day_overrides;
            DELETE FROM exception_days;
            DELETE FROM day_schedules;
            DELETE FROM day_schedule_periods;
            DELETE FROM week_schedules;
            DELETE FROM schedule_templates;
            DELETE FROM calendar_date_ranges;
            DELETE FROM template_exceptions;
        "#,
        )?;
        Ok(())
    }

    fn save_reference_days(tx: &Transaction, days: &[ReferenceDay]) -> PersistenceResult<()> {
        let mut day_stmt =
            tx.prepare("INSERT INTO reference_days (id, name, rule) VALUES (?1, ?2, ?3)")?;
        let mut override_stmt = tx.prepare(
            "INSERT INTO reference_day_overrides (reference_day_id, year, date) VALUES (?1, ?2, ?3)",
        )?;
        for day in days {
            day_stmt.execute(params![day.id.as_str(), day.name, rule_to_str(day.rule)])?;
            for (year, date) in &day.overrides {
                override_stmt.execute(params![
                    day.id.as_str(),
                    year,
                    date.format("%Y-%m-%d").to_string()
                ])?;
            }
        }
        Ok(())
    }

    fn save_exception_days(
        tx: &Transaction,
        days: &[ExceptionDayDefinition],
    ) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO exception_days (id, name, kind, month, day, reference_day, offset_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for exception in days {
            match &exception.rule {
                ExceptionRule::Fixed { month, day } => stmt.execute(params![
                    exception.id.get(),
                    exception.name,
                    "fixed",
                    month,
                    day,
                    Option::<String>::None,
                    Option::<i32>::None
                ])?,
                ExceptionRule::Moving {
                    reference_day,
                    offset_days,
                } => stmt.execute(params![
                    exception.id.get(),
                    exception.name,
                    "moving",
                    Option::<u32>::None,
                    Option::<u32>::None,
                    reference_day.as_str(),
                    offset_days
                ])?,
            };
        }
        Ok(())
    }

    fn save_day_schedules(tx: &Transaction, days: &[DaySchedule]) -> PersistenceResult<()> {
        let mut day_stmt = tx.prepare(
            "INSERT INTO day_schedules (id, name, description, is_closed, gap_policy)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut period_stmt = tx.prepare(
            "INSERT INTO day_schedule_periods
             (day_schedule_id, position, start_time, end_time, target_temp, min_temp, max_temp, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for day in days {
            day_stmt.execute(params![
                day.id.get(),
                day.name,
                day.description,
                day.is_closed,
                gap_policy_to_str(day.gap_policy)
            ])?;
            for (position, period) in day.periods.iter().enumerate() {
                period_stmt.execute(params![
                    day.id.get(),
                    position as i64,
                    format_time_of_day(period.start),
                    format_time_of_day(period.end),
                    period.target_temp,
                    period.min_temp,
                    period.max_temp,
                    period.order
                ])?;
            }
        }
        Ok(())
    }

    fn save_week_schedules(tx: &Transaction, weeks: &[WeekSchedule]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO week_schedules (id, name, {WEEKDAY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))?;
        for week in weeks {
            let slot = |index: usize| week.days[index].map(|id| id.get());
            stmt.execute(params![
                week.id.get(),
                week.name,
                slot(0),
                slot(1),
                slot(2),
                slot(3),
                slot(4),
                slot(5),
                slot(6)
            ])?;
        }
        Ok(())
    }

    fn save_templates(tx: &Transaction, snapshot: &CatalogSnapshot) -> PersistenceResult<()> {
        let mut template_stmt = tx.prepare(
            "INSERT INTO schedule_templates
             (id, name, version, description, base_week_schedule_id, is_default)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for template in &snapshot.templates {
            template_stmt.execute(params![
                template.id.get(),
                template.name,
                template.version,
                template.description,
                template.base_week_schedule_id.map(|id| id.get()),
                template.is_default
            ])?;
        }

        let mut range_stmt = tx.prepare(
            "INSERT INTO calendar_date_ranges
             (id, template_id, name, start_day, end_day, priority, is_active, week_schedule_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for range in &snapshot.date_ranges {
            range_stmt.execute(params![
                range.id.get(),
                range.template_id.get(),
                range.name,
                range.start.to_string(),
                range.end.to_string(),
                range.priority,
                range.is_active,
                range.week_schedule_id.get()
            ])?;
        }

        let mut link_stmt = tx.prepare(
            "INSERT INTO template_exceptions (template_id, exception_day_id, day_schedule_id)
             VALUES (?1, ?2, ?3)",
        )?;
        for link in &snapshot.template_exceptions {
            link_stmt.execute(params![
                link.template_id.get(),
                link.exception_day_id.get(),
                link.day_schedule_id.map(|id| id.get())
            ])?;
        }
        Ok(())
    }

    fn load_reference_days(conn: &Connection) -> PersistenceResult<Vec<ReferenceDay>> {
        let mut overrides: BTreeMap<String, BTreeMap<i32, chrono::NaiveDate>> = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT reference_day_id, year, date FROM reference_day_overrides ORDER BY reference_day_id, year",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (id, year, date) = row?;
            overrides.entry(id).or_default().insert(year, parse_date(&date)?);
        }

        let mut stmt = conn.prepare("SELECT id, name, rule FROM reference_days ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut days = Vec::new();
        for row in rows {
            let (id, name, rule) = row?;
            let mut day = ReferenceDay::new(ReferenceDayId::new(id.as_str()), name, rule_from_str(&rule)?);
            day.overrides = overrides.remove(&id).unwrap_or_default();
            days.push(day);
        }
        Ok(days)
    }

    fn load_exception_days(conn: &Connection) -> PersistenceResult<Vec<ExceptionDayDefinition>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, kind, month, day, reference_day, offset_days
             FROM exception_days ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<u32>>(3)?,
                row.get::<_, Option<u32>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<i32>>(6)?,
            ))
        })?;
        let mut days = Vec::new();
        for row in rows {
            let (id, name, kind, month, day, reference_day, offset_days) = row?;
            let rule = match (kind.as_str(), month, day, reference_day, offset_days) {
                ("fixed", Some(month), Some(day), _, _) => ExceptionRule::Fixed { month, day },
                ("moving", _, _, Some(reference_day), Some(offset_days)) => ExceptionRule::Moving {
                    reference_day: ReferenceDayId::new(reference_day),
                    offset_days,
                },
                _ => {
                    return Err(PersistenceError::InvalidData(format!(
                        "exception day {id} has an incomplete '{kind}' rule"
                    )));
                }
            };
            days.push(ExceptionDayDefinition {
                id: ExceptionDayId(id),
                name,
                rule,
            });
        }
        Ok(days)
    }

    fn load_day_schedules(conn: &Connection) -> PersistenceResult<Vec<DaySchedule>> {
        let mut periods: BTreeMap<i64, Vec<TimePeriod>> = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT day_schedule_id, start_time, end_time, target_temp, min_temp, max_temp, sort_order
             FROM day_schedule_periods ORDER BY day_schedule_id, position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, i32>(6)?,
            ))
        })?;
        for row in rows {
            let (day_id, start, end, target_temp, min_temp, max_temp, order) = row?;
            periods.entry(day_id).or_default().push(TimePeriod {
                start: parse_time_of_day(&start)?,
                end: parse_time_of_day(&end)?,
                target_temp,
                min_temp,
                max_temp,
                order,
            });
        }

        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_closed, gap_policy FROM day_schedules ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut days = Vec::new();
        for row in rows {
            let (id, name, description, is_closed, gap_policy) = row?;
            days.push(DaySchedule {
                id: DayScheduleId(id),
                name,
                description,
                is_closed,
                gap_policy: gap_policy_from_str(&gap_policy)?,
                periods: periods.remove(&id).unwrap_or_default(),
            });
        }
        Ok(days)
    }

    fn load_week_schedules(conn: &Connection) -> PersistenceResult<Vec<WeekSchedule>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, {WEEKDAY_COLUMNS} FROM week_schedules ORDER BY id"
        ))?;
        let rows = stmt.query_map([], |row| {
            let mut days = [None; 7];
            for (index, slot) in days.iter_mut().enumerate() {
                *slot = row.get::<_, Option<i64>>(index + 2)?.map(DayScheduleId);
            }
            Ok(WeekSchedule {
                id: WeekScheduleId(row.get(0)?),
                name: row.get(1)?,
                days,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_templates(conn: &Connection) -> PersistenceResult<Vec<ScheduleTemplate>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, version, description, base_week_schedule_id, is_default
             FROM schedule_templates ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ScheduleTemplate {
                id: TemplateId(row.get(0)?),
                name: row.get(1)?,
                version: row.get(2)?,
                description: row.get(3)?,
                base_week_schedule_id: row.get::<_, Option<i64>>(4)?.map(WeekScheduleId),
                is_default: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_date_ranges(conn: &Connection) -> PersistenceResult<Vec<CalendarDateRange>> {
        let mut stmt = conn.prepare(
            "SELECT id, template_id, name, start_day, end_day, priority, is_active, week_schedule_id
             FROM calendar_date_ranges ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?;
        let mut ranges = Vec::new();
        for row in rows {
            let (id, template_id, name, start, end, priority, is_active, week_id) = row?;
            ranges.push(CalendarDateRange {
                id: DateRangeId(id),
                template_id: TemplateId(template_id),
                name,
                start: start.parse::<MonthDay>()?,
                end: end.parse::<MonthDay>()?,
                priority,
                is_active,
                week_schedule_id: WeekScheduleId(week_id),
            });
        }
        Ok(ranges)
    }

    fn load_template_exceptions(
        conn: &Connection,
    ) -> PersistenceResult<Vec<ScheduleTemplateException>> {
        let mut stmt = conn.prepare(
            "SELECT template_id, exception_day_id, day_schedule_id
             FROM template_exceptions ORDER BY template_id, exception_day_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ScheduleTemplateException {
                template_id: TemplateId(row.get(0)?),
                exception_day_id: ExceptionDayId(row.get(1)?),
                day_schedule_id: row.get::<_, Option<i64>>(2)?.map(DayScheduleId),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn save_catalog(&self, snapshot: &CatalogSnapshot) -> PersistenceResult<()> {
        crate::catalog_validation::validate_snapshot(snapshot)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::clear(&tx)?;
        tx.execute(
            "INSERT INTO catalog_metadata (id, saved_at) VALUES (1, ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )?;
        Self::save_reference_days(&tx, &snapshot.reference_days)?;
        Self::save_exception_days(&tx, &snapshot.exception_days)?;
        Self::save_day_schedules(&tx, &snapshot.day_schedules)?;
        Self::save_week_schedules(&tx, &snapshot.week_schedules)?;
        Self::save_templates(&tx, snapshot)?;
        tx.commit()?;
        tracing::info!(
            templates = snapshot.templates.len(),
            day_schedules = snapshot.day_schedules.len(),
            exception_days = snapshot.exception_days.len(),
            "saved catalog to sqlite"
        );
        Ok(())
    }

    fn load_catalog(&self) -> PersistenceResult<Option<CatalogSnapshot>> {
        let conn = self.lock()?;

        let saved_at: Option<String> = conn
            .query_row("SELECT saved_at FROM catalog_metadata WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        if saved_at.is_none() {
            return Ok(None);
        }

        Ok(Some(CatalogSnapshot {
            templates: Self::load_templates(&conn)?,
            week_schedules: Self::load_week_schedules(&conn)?,
            day_schedules: Self::load_day_schedules(&conn)?,
            date_ranges: Self::load_date_ranges(&conn)?,
            exception_days: Self::load_exception_days(&conn)?,
            template_exceptions: Self::load_template_exceptions(&conn)?,
            reference_days: Self::load_reference_days(&conn)?,
        }))
    }
}

fn rule_to_str(rule: ReferenceRule) -> &'static str {
    match rule {
        ReferenceRule::GregorianEaster => "gregorian_easter",
    }
}

fn rule_from_str(input: &str) -> PersistenceResult<ReferenceRule> {
    match input {
        "gregorian_easter" => Ok(ReferenceRule::GregorianEaster),
        other => Err(PersistenceError::InvalidData(format!(
            "unknown reference rule '{other}'"
        ))),
    }
}

fn gap_policy_to_str(policy: GapPolicy) -> &'static str {
    match policy {
        GapPolicy::Closed => "closed",
        GapPolicy::HoldPrevious => "hold_previous",
    }
}

fn gap_policy_from_str(input: &str) -> PersistenceResult<GapPolicy> {
    match input {
        "closed" => Ok(GapPolicy::Closed),
        "hold_previous" => Ok(GapPolicy::HoldPrevious),
        other => Err(PersistenceError::InvalidData(format!(
            "unknown gap policy '{other}'"
        ))),
    }
}
