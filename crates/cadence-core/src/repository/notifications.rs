use crate::error::NotificationError;
use crate::notifications::{parse_fire_time, Notification, NotificationService};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: String,
    tag: String,
    fire_at: NaiveDateTime,
    message: String,
}

impl NotificationRecord {
    /// Rows with unreadable ids are skipped with a warning instead of failing the listing.
    fn into_notification(self) -> Option<Notification> {
        match (Uuid::parse_str(&self.id), Uuid::parse_str(&self.tag)) {
            (Ok(id), Ok(tag)) => Some(Notification {
                id,
                tag,
                fire_at: self.fire_at,
                message: self.message,
            }),
            _ => {
                tracing::warn!(id = %self.id, tag = %self.tag, "skipping notification with corrupt ids");
                None
            }
        }
    }
}

// The tag column is indexed, so cancelling a series is an index lookup.
#[async_trait]
impl NotificationService for SqliteRepository {
    async fn schedule(
        &self,
        fire_time: &str,
        message: &str,
        parent_tag: Uuid,
        notification_id: Uuid,
    ) -> Result<(), NotificationError> {
        let Some(fire_at) = parse_fire_time(fire_time) else {
            tracing::warn!(%notification_id, fire_time, "ignoring reminder with invalid fire time");
            return Ok(());
        };

        sqlx::query(
            r#"INSERT INTO notifications (id, tag, fire_at, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(id) DO UPDATE SET
                tag = excluded.tag,
                fire_at = excluded.fire_at,
                message = excluded.message"#,
        )
        .bind(notification_id.to_string())
        .bind(parent_tag.to_string())
        .bind(fire_at)
        .bind(message)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        tracing::debug!(%notification_id, %fire_at, "reminder scheduled");
        Ok(())
    }

    async fn cancel(&self, notification_id: Uuid) -> Result<bool, NotificationError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id.to_string())
            .execute(self.pool())
            .await?;
        let removed = result.rows_affected() > 0;
        if !removed {
            tracing::debug!(%notification_id, "no reminder to cancel");
        }
        Ok(removed)
    }

    async fn cancel_by_tag(&self, parent_tag: Uuid) -> Result<usize, NotificationError> {
        let result = sqlx::query("DELETE FROM notifications WHERE tag = $1")
            .bind(parent_tag.to_string())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn pending(&self) -> Result<Vec<Notification>, NotificationError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            "SELECT id, tag, fire_at, message FROM notifications ORDER BY fire_at, id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(records
            .into_iter()
            .filter_map(NotificationRecord::into_notification)
            .collect())
    }

    async fn due(&self, now: NaiveDateTime) -> Result<Vec<Notification>, NotificationError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            "SELECT id, tag, fire_at, message FROM notifications WHERE fire_at <= $1 ORDER BY fire_at, id",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;
        Ok(records
            .into_iter()
            .filter_map(NotificationRecord::into_notification)
            .collect())
    }
}
