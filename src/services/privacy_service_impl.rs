//! `SeaORM` implementation of the `PrivacyService` trait.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::db::{AnonymizedUser, Store, User};
use crate::services::privacy_service::{
    ANONYMIZE_ACTION, BOOTSTRAP_ADMIN_ID, PrivacyError, PrivacyService,
};
use crate::services::token_service::TokenService;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub struct SeaOrmPrivacyService {
    store: Store,
    tokens: Arc<dyn TokenService>,
}

impl SeaOrmPrivacyService {
    #[must_use]
    pub fn new(store: Store, tokens: Arc<dyn TokenService>) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl PrivacyService for SeaOrmPrivacyService {
    async fn search(&self, email: &str) -> Result<Option<User>, PrivacyError> {
        let email = email.trim();

        if email.is_empty() {
            return Err(PrivacyError::Validation(
                "An email address is required".to_string(),
            ));
        }

        if !EMAIL_RE.is_match(email) {
            return Err(PrivacyError::Validation(
                "Not a valid email address".to_string(),
            ));
        }

        let user = self.store.get_user_by_email(email).await?;
        Ok(user)
    }

    async fn anonymize(
        &self,
        actor_id: i32,
        target_id: i32,
        csrf_token: &str,
    ) -> Result<AnonymizedUser, PrivacyError> {
        // Token first: a bad token aborts before anything else is looked at.
        if !self
            .tokens
            .verify(actor_id, ANONYMIZE_ACTION, csrf_token)
            .await
        {
            warn!(actor_id, target_id, "Anonymization rejected: bad CSRF token");
            return Err(PrivacyError::CsrfRejected);
        }

        if target_id == BOOTSTRAP_ADMIN_ID || target_id == actor_id {
            return Err(PrivacyError::ProtectedAccount);
        }

        if self.store.get_user_by_id(target_id).await?.is_none() {
            return Err(PrivacyError::UserNotFound);
        }

        let scrubbed = self.store.anonymize_user(target_id).await?;

        metrics::counter!("anonymizations_total").increment(1);
        info!(
            actor_id,
            user_id = scrubbed.id,
            "User account anonymized"
        );

        self.store
            .add_audit_event(
                "user_anonymized",
                "info",
                &format!("User {} anonymized by admin {}", scrubbed.id, actor_id),
                Some(format!("new_email={}", scrubbed.email)),
            )
            .await?;

        Ok(scrubbed)
    }
}
