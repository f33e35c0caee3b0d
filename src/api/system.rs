use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{ApiResponse, AuditEventDto, StatusDto};
use super::{ApiError, AppState};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatusDto>>, ApiError> {
    let database = match state.store().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!("Database ping failed: {e}");
            "error".to_string()
        }
    };

    let total_users = state.store().count_users().await?;
    let anonymized_users = state.store().count_anonymized_users().await?;

    Ok(Json(ApiResponse::success(StatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database,
        total_users,
        anonymized_users,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u64>,
    pub event_type: Option<String>,
}

/// GET /system/audit
pub async fn get_audit_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEventDto>>>, ApiError> {
    let limit = query.limit.unwrap_or(50).min(500);

    let events = state
        .store()
        .recent_audit_events(limit, query.event_type)
        .await?;

    Ok(Json(ApiResponse::success(
        events.into_iter().map(AuditEventDto::from).collect(),
    )))
}
