use cadence_core::coordinator::OccurrenceCoordinator;
use cadence_core::repository::SqliteRepository;

use crate::notifier::ReminderQueue;

pub mod add;
pub mod delete;
pub mod edit;
pub mod extend;
pub mod list;
pub mod preview;
pub mod recurrence;
pub mod reminders;

/// Coordinator wired to the SQLite task store and reminder queue.
pub type Coordinator = OccurrenceCoordinator<SqliteRepository, ReminderQueue>;
