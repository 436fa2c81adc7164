//! Health check handler

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, error_codes};
use crate::store::Store;

/// Health check response data
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    pub timestamp_ms: u64,
}

/// GET /health
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms}}
/// - Store unreachable: 503 + {code: 5001, msg: "unavailable"}
///
/// The store error itself is logged, never exposed.
pub async fn health_check<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse { timestamp_ms })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    code: error_codes::SERVICE_UNAVAILABLE,
                    msg: "unavailable".to_string(),
                    data: None,
                }),
            )
        }
    }
}
