use crate::error::ApiError;
use crate::state::AppState;
use crate::Credential;
use crm_analytics::{AppointmentSummary, ItemList, MetricsResult};
use crm_core::error::CrmError;
use crm_core::DateWindow;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, MethodRouter};
use axum::{Extension, Router};
use serde::Deserialize;

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── Credentialed API ────────────────────────────────────────────────────

/// Metrics and lookup routes. With `cors` each path also answers OPTIONS.
pub fn api_routes(cors: bool) -> Router<AppState> {
    Router::new()
        .route("/ai-metrics", with_preflight(get(ai_metrics), cors))
        .route("/appointments", with_preflight(get(appointments), cors))
        .route("/calendars", with_preflight(get(calendars), cors))
        .route("/locations", with_preflight(get(locations), cors))
}

fn with_preflight(route: MethodRouter<AppState>, cors: bool) -> MethodRouter<AppState> {
    if cors {
        route.options(preflight)
    } else {
        route
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, CrmError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CrmError::validation(message))
}

/// Both dates must be present before either is parsed.
fn required_window<'a>(
    from: Option<&'a str>,
    to: Option<&'a str>,
) -> Result<(&'a str, &'a str), CrmError> {
    let from = required(from, "Missing from/to dates")?;
    let to = required(to, "Missing from/to dates")?;
    Ok((from, to))
}

// ── Metrics ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsQuery {
    from: Option<String>,
    to: Option<String>,
    location_id: Option<String>,
}

async fn ai_metrics(
    State(state): State<AppState>,
    Extension(Credential(credential)): Extension<Credential>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResult>, ApiError> {
    let (from, to) = required_window(query.from.as_deref(), query.to.as_deref())?;
    let location_id = required(query.location_id.as_deref(), "Missing locationId")?;
    let window = DateWindow::from_dates(from, to)?;

    let result = state
        .aggregator
        .aggregate(&credential, location_id, &window)
        .await?;
    Ok(Json(result))
}

// ── Appointments ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentsQuery {
    from: Option<String>,
    to: Option<String>,
    calendar_id: Option<String>,
}

async fn appointments(
    State(state): State<AppState>,
    Extension(Credential(credential)): Extension<Credential>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<AppointmentSummary>, ApiError> {
    let (from, to) = required_window(query.from.as_deref(), query.to.as_deref())?;
    let calendar_id = required(query.calendar_id.as_deref(), "Missing calendarId")?;
    let window = DateWindow::from_dates(from, to)?;

    let summary = state
        .catalog
        .appointments(&credential, calendar_id, &window)
        .await?;
    Ok(Json(summary))
}

// ── Calendars / locations ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarsQuery {
    location_id: Option<String>,
}

async fn calendars(
    State(state): State<AppState>,
    Extension(Credential(credential)): Extension<Credential>,
    Query(query): Query<CalendarsQuery>,
) -> Result<Json<ItemList>, ApiError> {
    let location_id = required(query.location_id.as_deref(), "Missing locationId")?;
    let items = state.catalog.calendars(&credential, location_id).await?;
    Ok(Json(items))
}

async fn locations(
    State(state): State<AppState>,
    Extension(Credential(credential)): Extension<Credential>,
) -> Result<Json<ItemList>, ApiError> {
    let items = state.catalog.locations(&credential).await?;
    Ok(Json(items))
}
