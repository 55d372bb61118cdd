//! JSON surface over a shared catalog.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{DEFAULT_HORIZON_DAYS, DEFAULT_MAX_SPAN_DAYS};
use crate::parse::{parse_date, parse_date_time, parse_time_of_day};
use crate::{
    ActivePeriod, CatalogSnapshot, DayScheduleId, ExceptionOccurrence, Explanation, Opening,
    ReferenceDayId, ResolvedDay, Resolver, ScheduleCatalog, ScheduleError, ScheduleTemplate,
    TemplateId,
};

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<ScheduleCatalog>>,
    horizon_days: u32,
    max_span_days: u32,
}

impl AppState {
    pub fn new(catalog: ScheduleCatalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
        }
    }

    pub fn with_shared(catalog: Arc<RwLock<ScheduleCatalog>>) -> Self {
        Self {
            catalog,
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
        }
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_max_span_days(mut self, max_span_days: u32) -> Self {
        self.max_span_days = max_span_days;
        self
    }

    fn catalog(&self) -> Arc<RwLock<ScheduleCatalog>> {
        self.catalog.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Schedule(ScheduleError),
    Invalid(String),
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        ApiError::Schedule(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Schedule(err) => {
                let status = match &err {
                    ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
                    ScheduleError::NotFound { .. } => StatusCode::NOT_FOUND,
                    ScheduleError::Configuration { .. }
                    | ScheduleError::BrokenReference { .. }
                    | ScheduleError::MissingBaseWeekSchedule(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (status, err.code(), err.to_string())
            }
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
        };
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::warn!(error, "{message}");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog).put(replace_catalog))
        .route("/templates", get(list_templates))
        .route("/templates/:id/resolve/:date", get(resolve_day))
        .route("/templates/:id/explain/:date", get(explain_day))
        .route("/templates/:id/calendar", get(template_calendar))
        .route("/templates/:id/next-opening", get(next_opening))
        .route("/day-schedules/:id/active", get(active_period))
        .route("/reference-days/:id/:year", get(reference_date))
        .route("/exception-days/:year", get(exception_days))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pool schedule HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_catalog(State(state): State<AppState>) -> Json<CatalogSnapshot> {
    let catalog = state.catalog();
    let snapshot = catalog.read().to_snapshot();
    Json(snapshot)
}

async fn replace_catalog(
    State(state): State<AppState>,
    Json(snapshot): Json<CatalogSnapshot>,
) -> Result<Json<CatalogSnapshot>, ApiError> {
    let replacement = ScheduleCatalog::from_snapshot(snapshot)?;
    let current = replacement.to_snapshot();
    let catalog = state.catalog();
    *catalog.write() = replacement;
    tracing::info!(templates = current.templates.len(), "catalog replaced");
    Ok(Json(current))
}

async fn list_templates(State(state): State<AppState>) -> Json<Vec<ScheduleTemplate>> {
    let catalog = state.catalog();
    let templates = catalog.read().templates().cloned().collect();
    Json(templates)
}

#[derive(Debug, Serialize)]
struct ResolveBody {
    date: NaiveDate,
    day_schedule_id: DayScheduleId,
}

async fn resolve_day(
    State(state): State<AppState>,
    Path((template_id, date)): Path<(i64, String)>,
) -> Result<Json<ResolveBody>, ApiError> {
    let date = parse_date(&date)?;
    let catalog = state.catalog();
    let guard = catalog.read();
    let day_schedule_id = Resolver::new(&guard).resolve_day_schedule(TemplateId(template_id), date)?;
    Ok(Json(ResolveBody {
        date,
        day_schedule_id,
    }))
}

async fn explain_day(
    State(state): State<AppState>,
    Path((template_id, date)): Path<(i64, String)>,
) -> Result<Json<Explanation>, ApiError> {
    let date = parse_date(&date)?;
    let catalog = state.catalog();
    let guard = catalog.read();
    let explanation = Resolver::new(&guard).explain(TemplateId(template_id), date)?;
    Ok(Json(explanation))
}

#[derive(Debug, Deserialize)]
struct SpanQuery {
    start: String,
    end: String,
}

async fn template_calendar(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
    Query(query): Query<SpanQuery>,
) -> Result<Json<Vec<ResolvedDay>>, ApiError> {
    let start = parse_date(&query.start)?;
    let end = parse_date(&query.end)?;
    let catalog = state.catalog();
    let guard = catalog.read();
    let days = Resolver::new(&guard)
        .with_max_span_days(state.max_span_days)
        .resolve_span(TemplateId(template_id), start, end)?;
    Ok(Json(days))
}

#[derive(Debug, Deserialize)]
struct AtQuery {
    at: String,
}

async fn next_opening(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
    Query(query): Query<AtQuery>,
) -> Result<Json<Option<Opening>>, ApiError> {
    let from = parse_date_time(&query.at)?;
    let catalog = state.catalog();
    let guard = catalog.read();
    let opening =
        Resolver::new(&guard).next_opening(TemplateId(template_id), from, state.horizon_days)?;
    Ok(Json(opening))
}

#[derive(Debug, Deserialize)]
struct TimeQuery {
    time: Option<String>,
}

async fn active_period(
    State(state): State<AppState>,
    Path(day_schedule_id): Path<i64>,
    Query(query): Query<TimeQuery>,
) -> Result<Json<ActivePeriod>, ApiError> {
    let Some(time) = query.time else {
        return Err(ApiError::Invalid("query parameter 'time' is required".into()));
    };
    let time = parse_time_of_day(&time)?;
    let catalog = state.catalog();
    let guard = catalog.read();
    let active = Resolver::new(&guard).active_period(DayScheduleId(day_schedule_id), time)?;
    Ok(Json(active))
}

#[derive(Debug, Serialize)]
struct ReferenceDateBody {
    reference_day: ReferenceDayId,
    year: i32,
    date: NaiveDate,
}

async fn reference_date(
    State(state): State<AppState>,
    Path((reference_day, year)): Path<(String, i32)>,
) -> Result<Json<ReferenceDateBody>, ApiError> {
    let reference_day = ReferenceDayId::new(reference_day);
    let catalog = state.catalog();
    let guard = catalog.read();
    let date = Resolver::new(&guard).reference_date(&reference_day, year)?;
    Ok(Json(ReferenceDateBody {
        reference_day,
        year,
        date,
    }))
}

async fn exception_days(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<ExceptionOccurrence>>, ApiError> {
    let catalog = state.catalog();
    let guard = catalog.read();
    let occurrences = Resolver::new(&guard).exception_calendar(year)?;
    Ok(Json(occurrences))
}
