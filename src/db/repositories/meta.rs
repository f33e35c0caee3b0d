use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::entities::user_meta;

pub struct UserMetaRepository {
    conn: DatabaseConnection,
}

impl UserMetaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All metadata rows for a user
    pub async fn get_for_user(&self, user_id: i32) -> Result<Vec<user_meta::Model>> {
        let rows = user_meta::Entity::find()
            .filter(user_meta::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query user metadata")?;

        Ok(rows)
    }

    /// Insert one metadata row. Keys are not unique per user.
    pub async fn add(&self, user_id: i32, key: &str, value: &str) -> Result<()> {
        let active = user_meta::ActiveModel {
            user_id: Set(user_id),
            meta_key: Set(key.to_string()),
            meta_value: Set(value.to_string()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert user metadata")?;

        Ok(())
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = user_meta::Entity::find()
            .filter(user_meta::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count user metadata")?;

        Ok(count)
    }
}
