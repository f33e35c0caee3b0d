use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub is_anonymized: bool,
}

impl From<crate::db::User> for UserDto {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            is_anonymized: user.is_anonymized,
        }
    }
}

/// Initial form state handed to the admin page: a fresh token for the
/// confirm step.
#[derive(Debug, Serialize)]
pub struct DeletionFormDto {
    pub csrf_token: String,
}

/// State of the data-deletion page after a POST. Exactly one of `user` /
/// `anonymized` is present for a successful action; `notice` carries the
/// informational message shown to the admin.
#[derive(Debug, Serialize)]
pub struct DeletionPageDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymized: Option<AnonymizedDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnonymizedDto {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

/// Form body of the single data-deletion endpoint. `action=anonymize_user`
/// takes precedence; otherwise a present `email` triggers a search.
#[derive(Debug, Deserialize)]
pub struct DeletionRequest {
    pub action: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<i32>,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusDto {
    pub version: String,
    pub uptime_seconds: u64,
    pub database: String,
    pub total_users: u64,
    pub anonymized_users: u64,
}

#[derive(Debug, Serialize)]
pub struct AuditEventDto {
    pub id: i64,
    pub event_type: String,
    pub level: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl From<crate::db::AuditEvent> for AuditEventDto {
    fn from(event: crate::db::AuditEvent) -> Self {
        Self {
            id: event.id,
            event_type: event.event_type,
            level: event.level,
            message: event.message,
            details: event.details,
            created_at: event.created_at,
        }
    }
}
