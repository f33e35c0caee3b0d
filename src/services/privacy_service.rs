//! Domain service for the data-deletion / anonymization workflow
//! (GDPR Art. 17, "right to be forgotten").
//!
//! The workflow is Search → Display → Confirm → Mutate: an admin looks up a
//! member by email, confirms, and the account's identifying fields are
//! irreversibly scrubbed. The row itself survives so historical order
//! records keep a valid user reference.

use thiserror::Error;

use crate::db::{AnonymizedUser, User};

/// CSRF action scope for the anonymization mutation.
pub const ANONYMIZE_ACTION: &str = "anonymize_user";

/// Reserved identifier of the admin account seeded by the initial
/// migration. Never a valid anonymization target.
pub const BOOTSTRAP_ADMIN_ID: i32 = 1;

/// Errors specific to privacy operations.
#[derive(Debug, Error)]
pub enum PrivacyError {
    /// Token missing, expired or mismatched. The request is aborted before
    /// any mutation.
    #[error("Security token validation failed")]
    CsrfRejected,

    /// Target is the bootstrap admin or the acting admin themselves.
    #[error("This account is protected and cannot be anonymized")]
    ProtectedAccount,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PrivacyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for the anonymization workflow.
#[async_trait::async_trait]
pub trait PrivacyService: Send + Sync {
    /// Exact-match lookup of a user by email. No side effects.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::Validation`] for an empty or malformed
    /// address. A well-formed address matching no user is `Ok(None)`, not an
    /// error.
    async fn search(&self, email: &str) -> Result<Option<User>, PrivacyError>;

    /// Irreversibly anonymizes the target account.
    ///
    /// Preconditions, checked in order:
    /// 1. `csrf_token` must be the live token for `(actor_id, anonymize_user)`.
    /// 2. `target_id` must not be [`BOOTSTRAP_ADMIN_ID`] or `actor_id`.
    ///
    /// On success the user row is rewritten (login/email to the
    /// `deleted_<id>_<unixtime>` pattern, display name to
    /// `Deleted User <id>`, credential to the disabled sentinel), all
    /// metadata rows are replaced by a single `is_anonymized = "1"` row, and
    /// an audit entry is recorded. There is no undo path.
    async fn anonymize(
        &self,
        actor_id: i32,
        target_id: i32,
        csrf_token: &str,
    ) -> Result<AnonymizedUser, PrivacyError>;
}
