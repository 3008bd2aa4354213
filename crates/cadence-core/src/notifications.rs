//! Local reminder notifications.
//!
//! Every notification carries the id of the parent task that owns its series as
//! a tag, and uses the occurrence's own task id as its notification id. A whole
//! series can therefore be cancelled by tag without tracking ids separately.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::Task;

/// Fire times cross the service boundary as `YYYY-MM-DD HH:mm`.
pub const FIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Equal to the id of the task the reminder belongs to.
    pub id: Uuid,
    /// Id of the parent task of the series.
    pub tag: Uuid,
    pub fire_at: NaiveDateTime,
    pub message: String,
}

#[async_trait]
pub trait NotificationService {
    /// Schedules (or reschedules) a notification.
    ///
    /// A missing or unparsable `fire_time` is logged and ignored rather than
    /// treated as an error.
    async fn schedule(
        &self,
        fire_time: &str,
        message: &str,
        parent_tag: Uuid,
        notification_id: Uuid,
    ) -> Result<(), NotificationError>;

    /// Cancels one notification, returning whether it existed.
    async fn cancel(&self, notification_id: Uuid) -> Result<bool, NotificationError>;

    /// Cancels every notification tagged with `parent_tag`, returning how many were removed.
    async fn cancel_by_tag(&self, parent_tag: Uuid) -> Result<usize, NotificationError>;

    /// All scheduled notifications, earliest first.
    async fn pending(&self) -> Result<Vec<Notification>, NotificationError>;

    /// Scheduled notifications whose fire time is at or before `now`.
    async fn due(&self, now: NaiveDateTime) -> Result<Vec<Notification>, NotificationError> {
        let pending = self.pending().await?;
        Ok(pending.into_iter().filter(|n| n.fire_at <= now).collect())
    }
}

/// Parses a `YYYY-MM-DD HH:mm` fire time.
pub fn parse_fire_time(fire_time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(fire_time.trim(), FIRE_TIME_FORMAT).ok()
}

/// Fire time for a dated reminder; None unless both parts are present.
pub fn fire_time_for(date: Option<NaiveDate>, reminder: Option<&str>) -> Option<String> {
    match (date, reminder) {
        (Some(date), Some(reminder)) => Some(format!("{} {}", date.format("%Y-%m-%d"), reminder.trim())),
        _ => None,
    }
}

/// Fire time for a task's reminder, if it has one.
pub fn reminder_fire_time(task: &Task) -> Option<String> {
    fire_time_for(task.date, task.reminder.as_deref())
}

// ============================================================================
// In-memory registry
// ============================================================================

/// Process-local notification registry with a tag index, so cancelling a
/// series touches only that series' entries.
#[derive(Debug, Default)]
pub struct InMemoryNotifications {
    registry: Mutex<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    by_id: HashMap<Uuid, Notification>,
    by_tag: HashMap<Uuid, HashSet<Uuid>>,
}

impl Registry {
    fn insert(&mut self, notification: Notification) {
        self.remove(notification.id);
        self.by_tag
            .entry(notification.tag)
            .or_default()
            .insert(notification.id);
        self.by_id.insert(notification.id, notification);
    }

    fn remove(&mut self, id: Uuid) -> Option<Notification> {
        let removed = self.by_id.remove(&id)?;
        if let Some(ids) = self.by_tag.get_mut(&removed.tag) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_tag.remove(&removed.tag);
            }
        }
        Some(removed)
    }

    fn remove_tag(&mut self, tag: Uuid) -> usize {
        let Some(ids) = self.by_tag.remove(&tag) else {
            return 0;
        };
        let mut removed = 0;
        for id in ids {
            if self.by_id.remove(&id).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>, NotificationError> {
        self.registry
            .lock()
            .map_err(|_| NotificationError::Unavailable("registry lock poisoned".to_string()))
    }

    /// Number of scheduled notifications.
    pub fn len(&self) -> usize {
        self.lock().map(|r| r.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<Notification> {
        self.lock().ok().and_then(|r| r.by_id.get(&id).cloned())
    }

    /// Ids scheduled under `tag`.
    pub fn ids_for_tag(&self, tag: Uuid) -> HashSet<Uuid> {
        self.lock()
            .ok()
            .and_then(|r| r.by_tag.get(&tag).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotifications {
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

        self.lock()?.insert(Notification {
            id: notification_id,
            tag: parent_tag,
            fire_at,
            message: message.to_string(),
        });
        Ok(())
    }

    async fn cancel(&self, notification_id: Uuid) -> Result<bool, NotificationError> {
        let removed = self.lock()?.remove(notification_id).is_some();
        if !removed {
            tracing::debug!(%notification_id, "no reminder to cancel");
        }
        Ok(removed)
    }

    async fn cancel_by_tag(&self, parent_tag: Uuid) -> Result<usize, NotificationError> {
        Ok(self.lock()?.remove_tag(parent_tag))
    }

    async fn pending(&self) -> Result<Vec<Notification>, NotificationError> {
        let mut pending: Vec<Notification> = self.lock()?.by_id.values().cloned().collect();
        pending.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }
}
