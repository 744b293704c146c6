use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use proctor_core::violation::domain::violation_record::{StoredViolation, ViolationRecord};
use proctor_core::violation::domain::violation_store::StoreError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogViolationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogViolationResponse {
    pub message: &'static str,
    pub violation: ViolationRecord,
}

/// POST /log-violation
///
/// Records a violation reported by the exam client (tab switch, screen
/// sharing stopped, ...).
async fn log_violation(
    State(state): State<AppState>,
    body: Result<Json<LogViolationRequest>, JsonRejection>,
) -> ApiResult<Json<LogViolationResponse>> {
    let kind = body
        .ok()
        .and_then(|Json(req)| req.kind)
        .map(|kind| kind.trim().to_string())
        .filter(|kind| !kind.is_empty())
        .ok_or(ApiError::MissingViolationType)?;

    let logger = state.logger.clone();
    let violation = tokio::task::spawn_blocking(move || logger.log(&kind))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(internal)?;

    Ok(Json(LogViolationResponse {
        message: "Violation logged",
        violation,
    }))
}

/// GET /violations
///
/// Every stored record, newest first.
async fn list_violations(State(state): State<AppState>) -> ApiResult<Json<Vec<StoredViolation>>> {
    let store = state.store.clone();
    let violations = tokio::task::spawn_blocking(move || {
        let mut store = store.lock().map_err(|_| StoreError::Poisoned)?;
        store.list_recent(None)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(internal)?;

    Ok(Json(violations))
}

fn internal(err: StoreError) -> ApiError {
    ApiError::Internal(err.to_string())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/log-violation", post(log_violation))
        .route("/violations", get(list_violations))
}
