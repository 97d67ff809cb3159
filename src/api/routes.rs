use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::api::health::HealthState;
use crate::config::MAX_UPLOAD_BYTES;
use crate::error::AppError;
use crate::service::SalesService;
use crate::types::{Forecast, ImportResult, Report, Transaction};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<SalesService>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/report", get(get_report))
        .route("/forecast", get(get_forecast))
        .route("/transactions", get(get_transactions))
        .route("/health", get(get_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query params / responses
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AsOfQuery {
    /// ISO date; defaults to the server's local date.
    pub as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    fn resolve(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub db_ok: bool,
    pub stored_rows: Option<i64>,
    pub imports: u64,
    pub rows_imported: u64,
    pub rows_rejected: u64,
    pub last_import_at_ms: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn upload(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<ImportResult>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("upload body is empty".to_string()));
    }
    let result = state.service.ingest(&body).await?;
    state
        .health
        .record_import(result.imported_count, result.rejected_rows.len());
    Ok(Json(result))
}

async fn get_report(
    State(state): State<ApiState>,
    Query(params): Query<AsOfQuery>,
) -> Result<Json<Report>, AppError> {
    let report = state.service.build_report(params.resolve()).await?;
    Ok(Json(report))
}

async fn get_forecast(
    State(state): State<ApiState>,
    Query(params): Query<AsOfQuery>,
) -> Result<Json<Forecast>, AppError> {
    let forecast = state.service.forecast(params.resolve()).await?;
    Ok(Json(forecast))
}

async fn get_transactions(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions = state.service.transactions().await?;
    Ok(Json(transactions))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let stored_rows = match state.service.store().count().await {
        Ok(n) => Some(n),
        Err(e) => {
            error!("health check: {e}");
            None
        }
    };
    let health = &state.health;
    Json(HealthResponse {
        db_ok: stored_rows.is_some(),
        stored_rows,
        imports: health.imports(),
        rows_imported: health.rows_imported(),
        rows_rejected: health.rows_rejected(),
        last_import_at_ms: health.last_import_at_ms(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
