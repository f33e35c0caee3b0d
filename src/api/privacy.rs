//! The data-deletion admin endpoint (GDPR Art. 17).
//!
//! One endpoint, action-dispatched like the admin page it serves:
//! `GET` hands out the empty form state with a fresh CSRF token, `POST`
//! either searches by email or, for `action=anonymize_user`, performs the
//! confirmed scrub. A search parameter sent alongside a mutation action is
//! ignored so the response reflects the action, never a stale search.

use axum::{
    Extension, Form, Json,
    extract::State,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::{
    AnonymizedDto, ApiResponse, DeletionFormDto, DeletionPageDto, DeletionRequest, UserDto,
};
use super::{ApiError, AppState};
use crate::services::ANONYMIZE_ACTION;

const NOT_FOUND_NOTICE: &str = "No user found for this email address";

/// GET /privacy/data-deletion
pub async fn get_deletion_form(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DeletionFormDto>>, ApiError> {
    let csrf_token = state.tokens().issue(actor.id, ANONYMIZE_ACTION).await;

    Ok(Json(ApiResponse::success(DeletionFormDto { csrf_token })))
}

/// POST /privacy/data-deletion
pub async fn post_deletion_action(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<CurrentUser>,
    Form(payload): Form<DeletionRequest>,
) -> Result<Json<ApiResponse<DeletionPageDto>>, ApiError> {
    if payload.action.as_deref() == Some(ANONYMIZE_ACTION) {
        return anonymize(&state, &actor, &payload).await;
    }

    if let Some(action) = &payload.action {
        return Err(ApiError::validation(format!("Unknown action: {action}")));
    }

    let Some(email) = payload.email.as_deref() else {
        return Err(ApiError::validation("An email address is required"));
    };

    let user = state.privacy_service().search(email).await?;

    let page = match user {
        Some(user) => DeletionPageDto {
            user: Some(UserDto::from(user)),
            anonymized: None,
            notice: None,
        },
        None => DeletionPageDto {
            user: None,
            anonymized: None,
            notice: Some(NOT_FOUND_NOTICE.to_string()),
        },
    };

    Ok(Json(ApiResponse::success(page)))
}

async fn anonymize(
    state: &Arc<AppState>,
    actor: &CurrentUser,
    payload: &DeletionRequest,
) -> Result<Json<ApiResponse<DeletionPageDto>>, ApiError> {
    let Some(user_id) = payload.user_id else {
        return Err(ApiError::validation("A user id is required"));
    };
    if user_id <= 0 {
        return Err(ApiError::validation("A positive user id is required"));
    }

    // A missing token is treated exactly like a wrong one.
    let token = payload.csrf_token.as_deref().unwrap_or_default();

    let scrubbed = state
        .privacy_service()
        .anonymize(actor.id, user_id, token)
        .await?;

    let notice = format!("User {} has been anonymized", scrubbed.id);

    Ok(Json(ApiResponse::success(DeletionPageDto {
        user: None,
        anonymized: Some(AnonymizedDto {
            user_id: scrubbed.id,
            username: scrubbed.username,
            email: scrubbed.email,
            display_name: scrubbed.display_name,
        }),
        notice: Some(notice),
    })))
}
