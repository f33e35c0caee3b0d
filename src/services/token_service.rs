//! Action-scoped CSRF tokens.
//!
//! Tokens are issued per (actor, action) pair, expire after a TTL and are
//! compared in constant time. Issuing a new token for a pair replaces the
//! previous one.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Issues and verifies request tokens for state-changing admin actions.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Issues a fresh token scoped to the actor and action.
    async fn issue(&self, actor_id: i32, action: &str) -> String;

    /// Returns true if the token matches the live token for (actor, action).
    /// Expired tokens are discarded and never match.
    async fn verify(&self, actor_id: i32, action: &str, token: &str) -> bool;
}

struct IssuedToken {
    token: String,
    issued_at: Instant,
}

/// Process-local token store. Admin sessions are served by a single process,
/// so tokens do not need to survive restarts.
pub struct InMemoryTokenService {
    ttl: Duration,
    tokens: RwLock<HashMap<(i32, String), IssuedToken>>,
}

impl InMemoryTokenService {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl TokenService for InMemoryTokenService {
    async fn issue(&self, actor_id: i32, action: &str) -> String {
        let token = generate_token();

        let mut tokens = self.tokens.write().await;
        tokens.insert(
            (actor_id, action.to_string()),
            IssuedToken {
                token: token.clone(),
                issued_at: Instant::now(),
            },
        );

        token
    }

    async fn verify(&self, actor_id: i32, action: &str, token: &str) -> bool {
        let key = (actor_id, action.to_string());

        let mut tokens = self.tokens.write().await;
        let Some(issued) = tokens.get(&key) else {
            return false;
        };

        if issued.issued_at.elapsed() > self.ttl {
            tokens.remove(&key);
            return false;
        }

        constant_time_eq(issued.token.as_bytes(), token.as_bytes())
    }
}

/// Generate a random token (64 character hex string)
fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_verifies() {
        let service = InMemoryTokenService::new(Duration::from_secs(3600));
        let token = service.issue(7, "anonymize_user").await;

        assert!(service.verify(7, "anonymize_user", &token).await);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let service = InMemoryTokenService::new(Duration::from_secs(3600));
        let _ = service.issue(7, "anonymize_user").await;

        assert!(!service.verify(7, "anonymize_user", "not-the-token").await);
    }

    #[tokio::test]
    async fn token_is_scoped_to_action_and_actor() {
        let service = InMemoryTokenService::new(Duration::from_secs(3600));
        let token = service.issue(7, "anonymize_user").await;

        assert!(!service.verify(7, "other_action", &token).await);
        assert!(!service.verify(8, "anonymize_user", &token).await);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let service = InMemoryTokenService::new(Duration::ZERO);
        let token = service.issue(7, "anonymize_user").await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!service.verify(7, "anonymize_user", &token).await);
    }

    #[tokio::test]
    async fn reissue_replaces_previous_token() {
        let service = InMemoryTokenService::new(Duration::from_secs(3600));
        let first = service.issue(7, "anonymize_user").await;
        let second = service.issue(7, "anonymize_user").await;

        assert!(!service.verify(7, "anonymize_user", &first).await);
        assert!(service.verify(7, "anonymize_user", &second).await);
    }
}
