use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use pool_schedule::parse::{format_time_of_day, parse_date, parse_date_time, parse_time_of_day};
use pool_schedule::{
    ActivePeriod, CatalogStore, DayScheduleId, EngineConfig, ReferenceDayId, Resolver,
    ScheduleCatalog, SqliteCatalogStore, TemplateId, day_frame, load_catalog_from_json,
    save_catalog_to_json, save_resolved_days_to_csv,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: &AnyValue| -> String {
        match av {
            AnyValue::Null => String::new(),
            AnyValue::Int32(v) => v.to_string(),
            AnyValue::Int64(v) => v.to_string(),
            AnyValue::Float64(v) => format!("{v:.1}"),
            AnyValue::Boolean(v) => v.to_string(),
            AnyValue::String(s) => s.to_string(),
            _ => av.to_string(),
        }
    };

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        rows.push(
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell(&av)).unwrap_or_default())
                .collect(),
        );
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, value) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(value.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| -> String {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load json|sqlite <path>            Replace the catalog from a file\n  save json|sqlite <path>            Write the catalog to a file\n  templates                          List templates\n  use <template_id>                  Select the template for later commands\n  resolve <YYYY-MM-DD>               Day schedule id for a date\n  explain <YYYY-MM-DD>               Show why a date resolved the way it did\n  active <day_schedule_id> <HH:MM>   Active period of a day schedule\n  at <YYYY-MM-DD> <HH:MM>            Plan state and target temperature at an instant\n  next <YYYY-MM-DD> <HH:MM>          Next opening after an instant\n  reference <id> <year>              Compute a reference day (e.g. easter 2025)\n  holidays <year>                    Exception days falling in a year\n  calendar <start> <end>             Resolve every date in a span\n  export csv <start> <end> <path>    Write a resolved span to CSV\n  check                              Report dangling catalog references\n  quit|exit                          Exit"
    );
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn initial_catalog(config: &EngineConfig) -> ScheduleCatalog {
    if let Some(path) = &config.sqlite_path {
        match SqliteCatalogStore::new(path).and_then(|store| store.open_catalog()) {
            Ok(catalog) => return catalog,
            Err(e) => println!("Could not load {}: {}", path.display(), e),
        }
    }
    if let Some(path) = &config.catalog_path {
        match load_catalog_from_json(path) {
            Ok(catalog) => return catalog,
            Err(e) => println!("Could not load {}: {}", path.display(), e),
        }
    }
    ScheduleCatalog::default()
}

fn default_template(catalog: &ScheduleCatalog, configured: Option<TemplateId>) -> Option<TemplateId> {
    configured
        .or_else(|| catalog.templates().find(|t| t.is_default).map(|t| t.id))
        .or_else(|| catalog.templates().next().map(|t| t.id))
}

fn parse_span(start: Option<&str>, end: Option<&str>) -> Option<(NaiveDate, NaiveDate)> {
    let start = parse_date(start?).ok()?;
    let end = parse_date(end?).ok()?;
    Some((start, end))
}

fn describe_active(active: &ActivePeriod) -> String {
    match active.period() {
        Some(period) => format!(
            "{} {}-{} target {:.1}",
            active.label(),
            format_time_of_day(period.start),
            format_time_of_day(period.end),
            period.target_temp
        ),
        None => active.label().to_string(),
    }
}

fn main() {
    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            EngineConfig::default()
        }
    };
    init_tracing(&config.log_level);

    let mut catalog = initial_catalog(&config);
    let mut template = default_template(&catalog, config.default_template);

    println!("Pool Schedule (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let resolver = Resolver::new(&catalog).with_max_span_days(config.max_span_days);

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => {
                let loaded = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => load_catalog_from_json(path),
                    (Some("sqlite"), Some(path)) => {
                        SqliteCatalogStore::new(path).and_then(|store| store.open_catalog())
                    }
                    _ => {
                        println!("Usage: load json|sqlite <path>");
                        continue;
                    }
                };
                match loaded {
                    Ok(next) => {
                        catalog = next;
                        template = default_template(&catalog, config.default_template);
                        println!(
                            "Catalog loaded ({} templates, {} day schedules).",
                            catalog.templates().count(),
                            catalog.day_schedules().count()
                        );
                    }
                    Err(e) => println!("Load error: {}", e),
                }
            }
            "save" => {
                let saved = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => save_catalog_to_json(&catalog, path),
                    (Some("sqlite"), Some(path)) => SqliteCatalogStore::new(path)
                        .and_then(|store| store.save_catalog(&catalog.to_snapshot())),
                    _ => {
                        println!("Usage: save json|sqlite <path>");
                        continue;
                    }
                };
                match saved {
                    Ok(()) => println!("Catalog saved."),
                    Err(e) => println!("Save error: {}", e),
                }
            }
            "templates" => {
                for t in catalog.templates() {
                    let marker = if Some(t.id) == template { "*" } else { " " };
                    let base = t
                        .base_week_schedule_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{} {} {} (v{}, base week {})", marker, t.id, t.name, t.version, base);
                }
            }
            "use" => {
                let Some(id) = parts.next().and_then(|s| s.parse::<i64>().ok()) else {
                    println!("Usage: use <template_id>");
                    continue;
                };
                match catalog.template(TemplateId(id)) {
                    Ok(t) => {
                        template = Some(t.id);
                        println!("Using template {} ({}).", t.id, t.name);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "active" => {
                let id = parts.next().and_then(|s| s.parse::<i64>().ok());
                let time = parts.next().and_then(|s| parse_time_of_day(s).ok());
                match (id, time) {
                    (Some(id), Some(time)) => {
                        match resolver.active_period(DayScheduleId(id), time) {
                            Ok(active) => println!("{}", describe_active(&active)),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: active <day_schedule_id> <HH:MM>"),
                }
            }
            "reference" => {
                let id = parts.next();
                let year = parts.next().and_then(|s| s.parse::<i32>().ok());
                match (id, year) {
                    (Some(id), Some(year)) => {
                        match resolver.reference_date(&ReferenceDayId::new(id), year) {
                            Ok(date) => println!("{} {}: {}", id, year, date),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: reference <id> <year>"),
                }
            }
            "holidays" => {
                let Some(year) = parts.next().and_then(|s| s.parse::<i32>().ok()) else {
                    println!("Usage: holidays <year>");
                    continue;
                };
                match resolver.exception_calendar(year) {
                    Ok(days) if days.is_empty() => println!("No exception days in {}.", year),
                    Ok(days) => {
                        for day in days {
                            println!("{} {} ({})", day.date, day.name, day.exception_day_id);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "check" => {
                let problems = catalog.integrity_report();
                if problems.is_empty() {
                    println!("Catalog OK.");
                } else {
                    for problem in problems {
                        println!("{}", problem);
                    }
                }
            }
            "resolve" | "explain" | "at" | "next" | "calendar" | "export" => {
                let Some(template_id) = template else {
                    println!("No template selected. Use 'use <template_id>'.");
                    continue;
                };
                match cmd {
                    "resolve" => match parts.next().map(parse_date) {
                        Some(Ok(date)) => match resolver.resolve(template_id, date) {
                            Ok(resolution) => println!(
                                "{} -> day schedule {} ({}) via {}",
                                date,
                                resolution.day_schedule.id,
                                resolution.day_schedule.name,
                                resolution.source.label()
                            ),
                            Err(e) => println!("Error: {}", e),
                        },
                        _ => println!("Usage: resolve <YYYY-MM-DD>"),
                    },
                    "explain" => match parts.next().map(parse_date) {
                        Some(Ok(date)) => match resolver.explain(template_id, date) {
                            Ok(explanation) => match serde_json::to_string_pretty(&explanation) {
                                Ok(text) => println!("{}", text),
                                Err(e) => println!("Error: {}", e),
                            },
                            Err(e) => println!("Error: {}", e),
                        },
                        _ => println!("Usage: explain <YYYY-MM-DD>"),
                    },
                    "at" | "next" => {
                        let instant = match (parts.next(), parts.next()) {
                            (Some(date), Some(time)) => parse_date_time(&format!("{date} {time}")).ok(),
                            _ => None,
                        };
                        let Some(instant) = instant else {
                            println!("Usage: {} <YYYY-MM-DD> <HH:MM>", cmd);
                            continue;
                        };
                        if cmd == "at" {
                            match resolver.active_period_at(template_id, instant) {
                                Ok(active) => println!("{} {}", instant, describe_active(&active)),
                                Err(e) => println!("Error: {}", e),
                            }
                        } else {
                            match resolver.next_opening(template_id, instant, config.horizon_days) {
                                Ok(Some(opening)) => println!(
                                    "Next opening {} (day schedule {}, target {:.1})",
                                    opening.at, opening.day_schedule_id, opening.period.target_temp
                                ),
                                Ok(None) => println!(
                                    "No opening within {} days.",
                                    config.horizon_days
                                ),
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                    }
                    "calendar" => {
                        let Some((start, end)) = parse_span(parts.next(), parts.next()) else {
                            println!("Usage: calendar <start> <end>");
                            continue;
                        };
                        match resolver.resolve_span(template_id, start, end) {
                            Ok(days) => match day_frame(&days) {
                                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                                Err(e) => println!("Error: {}", e),
                            },
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => {
                        let format = parts.next();
                        let span = parse_span(parts.next(), parts.next());
                        let path = parts.next();
                        match (format, span, path) {
                            (Some("csv"), Some((start, end)), Some(path)) => {
                                let written = resolver
                                    .resolve_span(template_id, start, end)
                                    .map_err(|e| e.to_string())
                                    .and_then(|days| {
                                        save_resolved_days_to_csv(&days, path)
                                            .map(|_| days.len())
                                            .map_err(|e| e.to_string())
                                    });
                                match written {
                                    Ok(count) => println!("Exported {} days to {}", count, path),
                                    Err(e) => println!("Export error: {}", e),
                                }
                            }
                            _ => println!("Usage: export csv <start> <end> <path>"),
                        }
                    }
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
