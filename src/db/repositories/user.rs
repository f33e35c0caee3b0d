use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{user_meta, users};

/// Credential sentinel written by the anonymization scrub. It never parses
/// as an Argon2 hash, so password verification fails closed for anonymized
/// accounts.
pub const DISABLED_CREDENTIAL: &str = "!";

/// Meta key marking an anonymized account in `user_meta`.
pub const ANONYMIZED_META_KEY: &str = "is_anonymized";

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_anonymized: bool,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            is_admin: model.is_admin,
            is_anonymized: model.is_anonymized,
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields of a user record after the anonymization scrub.
#[derive(Debug, Clone)]
pub struct AnonymizedUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by exact email match
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// List all users, ordered by id
    pub async fn list_all(&self) -> Result<Vec<User>> {
        use sea_orm::QueryOrder;

        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Total number of user rows
    pub async fn count_all(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        let count = users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        Ok(count)
    }

    /// Number of users in the terminal anonymized state
    pub async fn count_anonymized(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        let count = users::Entity::find()
            .filter(users::Column::IsAnonymized.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count anonymized users")?;

        Ok(count)
    }

    /// Create a user with a freshly hashed password and random API key
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        display_name: &str,
        password: &str,
        is_admin: bool,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            display_name: Set(display_name.to_string()),
            is_admin: Set(is_admin),
            is_anonymized: Set(false),
            api_key: Set(generate_api_key()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            // An unparseable stored hash is the disabled sentinel, not an
            // operational error: the login simply fails.
            let Ok(parsed_hash) = PasswordHash::new(&password_hash) else {
                return false;
            };

            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await
        .context("Password verification task panicked")?;

        Ok(is_valid)
    }

    /// Update password for a user (hashes the new password)
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    /// Get API key for a user
    pub async fn get_api_key(&self, username: &str) -> Result<Option<String>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key")?;

        Ok(user.map(|u| u.api_key))
    }

    /// Regenerate API key for a user
    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }

    /// Irreversibly scrub the identifying fields of a user record.
    ///
    /// Runs as a single transaction: the user-row rewrite, the metadata
    /// purge and the sentinel insert commit together or not at all, so the
    /// metadata table for the id always ends up with exactly one
    /// `is_anonymized` row.
    ///
    /// The row itself is kept: historical order records keep referencing the
    /// id, which now points at anonymized data.
    pub async fn anonymize(&self, id: i32) -> Result<AnonymizedUser> {
        let scrubbed = self
            .conn
            .transaction::<_, AnonymizedUser, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let user = users::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            sea_orm::DbErr::RecordNotFound(format!("user {id} not found"))
                        })?;

                    let stamp = chrono::Utc::now().timestamp();
                    let username = format!("deleted_{id}_{stamp}");
                    let email = format!("{username}@anonymized.local");
                    let display_name = format!("Deleted User {id}");
                    let now = chrono::Utc::now().to_rfc3339();

                    let mut active: users::ActiveModel = user.into();
                    active.username = Set(username.clone());
                    active.email = Set(email.clone());
                    active.display_name = Set(display_name.clone());
                    active.password_hash = Set(DISABLED_CREDENTIAL.to_string());
                    active.is_anonymized = Set(true);
                    // Rotating the key to a value nobody holds revokes it.
                    active.api_key = Set(generate_api_key());
                    active.updated_at = Set(now);
                    active.update(txn).await?;

                    user_meta::Entity::delete_many()
                        .filter(user_meta::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;

                    let sentinel = user_meta::ActiveModel {
                        user_id: Set(id),
                        meta_key: Set(ANONYMIZED_META_KEY.to_string()),
                        meta_value: Set("1".to_string()),
                        ..Default::default()
                    };
                    sentinel.insert(txn).await?;

                    Ok(AnonymizedUser {
                        id,
                        username,
                        email,
                        display_name,
                    })
                })
            })
            .await
            .context("Anonymization transaction failed")?;

        Ok(scrubbed)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
