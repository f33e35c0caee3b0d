use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::entities::{audit_log, prelude::*};

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        let active_model = audit_log::ActiveModel {
            event_type: Set(event_type.to_string()),
            level: Set(level.to_string()),
            message: Set(message.to_string()),
            details: Set(details),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        AuditLog::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Most recent entries first, optionally filtered by event type
    pub async fn recent(
        &self,
        limit: u64,
        event_type_filter: Option<String>,
    ) -> Result<Vec<audit_log::Model>> {
        let mut query = AuditLog::find().order_by_desc(audit_log::Column::CreatedAt);

        if let Some(event_type) = event_type_filter {
            query = query.filter(audit_log::Column::EventType.eq(event_type));
        }

        let items = query.limit(limit).all(&self.conn).await?;
        Ok(items)
    }
}
