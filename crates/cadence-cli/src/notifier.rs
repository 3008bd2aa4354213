use async_trait::async_trait;
use cadence_core::error::NotificationError;
use cadence_core::notifications::{Notification, NotificationService};
use cadence_core::repository::SqliteRepository;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// The SQLite reminder queue, honouring `reminders.enabled`.
///
/// While disabled, scheduling is skipped but cancellations still reach the
/// queue so that deleted tasks never leave reminders behind.
pub struct ReminderQueue {
    repo: SqliteRepository,
    enabled: bool,
}

impl ReminderQueue {
    pub fn new(repo: SqliteRepository, enabled: bool) -> Self {
        Self { repo, enabled }
    }
}

#[async_trait]
impl NotificationService for ReminderQueue {
    async fn schedule(
        &self,
        fire_time: &str,
        message: &str,
        parent_tag: Uuid,
        notification_id: Uuid,
    ) -> Result<(), NotificationError> {
        if !self.enabled {
            tracing::debug!(%notification_id, "reminders disabled, not scheduling");
            return Ok(());
        }
        self.repo
            .schedule(fire_time, message, parent_tag, notification_id)
            .await
    }

    async fn cancel(&self, notification_id: Uuid) -> Result<bool, NotificationError> {
        self.repo.cancel(notification_id).await
    }

    async fn cancel_by_tag(&self, parent_tag: Uuid) -> Result<usize, NotificationError> {
        self.repo.cancel_by_tag(parent_tag).await
    }

    async fn pending(&self) -> Result<Vec<Notification>, NotificationError> {
        self.repo.pending().await
    }

    async fn due(&self, now: NaiveDateTime) -> Result<Vec<Notification>, NotificationError> {
        self.repo.due(now).await
    }
}
