use async_trait::async_trait;
use cadence_core::coordinator::OccurrenceCoordinator;
use cadence_core::db::establish_connection;
use cadence_core::error::{CoreError, NotificationError, ValidationError};
use cadence_core::models::*;
use cadence_core::notifications::{InMemoryNotifications, Notification, NotificationService};
use cadence_core::recurrence::MAX_OPEN_ENDED_OCCURRENCES;
use cadence_core::repository::{CheckpointRepository, SqliteRepository, TaskRepository};
use chrono::{Datelike, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use uuid::Uuid;

type SqliteCoordinator = OccurrenceCoordinator<SqliteRepository, SqliteRepository>;

/// Helper function to create a test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (SqliteRepository::new(pool), temp_dir)
}

/// Coordinator backed by SQLite for both tasks and the reminder queue
async fn setup_coordinator() -> (SqliteCoordinator, TempDir) {
    let (repo, temp_dir) = setup_test_db().await;
    (OccurrenceCoordinator::new(repo.clone(), repo), temp_dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task_draft(name: &str, on: NaiveDate, repeat: RecurrenceRule) -> NewTaskData {
    NewTaskData {
        name: name.to_string(),
        date: Some(on),
        reminder: Some("08:15".to_string()),
        list: Some("Personal".to_string()),
        repeat,
        ..Default::default()
    }
}

fn weekly_mondays_from_march() -> RecurrenceRule {
    RecurrenceRule::builder(RepeatType::Weekly, date(2024, 3, 1))
        .on(Weekday::Mon)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_weekly_series_end_to_end() {
    let (coordinator, _temp_dir) = setup_coordinator().await;

    let creation = coordinator
        .create(task_draft("Team sync", date(2024, 3, 1), weekly_mondays_from_march()))
        .await
        .unwrap();

    assert_eq!(creation.parent.date, Some(date(2024, 3, 1)));
    assert_eq!(creation.parent.parent_id, None);

    // Every generated Monday becomes a child; none lands on the parent's date.
    assert_eq!(creation.occurrences.len(), MAX_OPEN_ENDED_OCCURRENCES);
    let child_dates: Vec<NaiveDate> = creation.occurrences.iter().filter_map(|t| t.date).collect();
    assert_eq!(child_dates.first(), Some(&date(2024, 3, 4)));
    assert!(child_dates.iter().all(|d| d.weekday() == chrono::Weekday::Mon));
    assert!(!child_dates.contains(&date(2024, 3, 1)));
    assert!(child_dates.windows(2).all(|w| w[0] < w[1]));

    let stored = coordinator.store().find_occurrences(creation.parent.id).await.unwrap();
    assert_eq!(stored.len(), MAX_OPEN_ENDED_OCCURRENCES);

    // One reminder per record, all tagged with the parent id.
    let pending = coordinator.notifier().pending().await.unwrap();
    assert_eq!(pending.len(), MAX_OPEN_ENDED_OCCURRENCES + 1);
    assert!(pending.iter().all(|n| n.tag == creation.parent.id));
    assert!(pending.iter().any(|n| n.id == creation.parent.id));
    for occurrence in &creation.occurrences {
        assert!(pending.iter().any(|n| n.id == occurrence.id));
    }

    let checkpoint = coordinator
        .store()
        .load_checkpoint(creation.parent.id)
        .await
        .unwrap()
        .expect("open-ended series keeps a checkpoint");
    assert_eq!(Some(&checkpoint.last_occurrence), child_dates.last());
    assert_eq!(checkpoint.rule, weekly_mondays_from_march());
}

#[tokio::test]
async fn test_edit_once_to_weekly_and_back() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let start = date(2024, 3, 1);

    let original = coordinator
        .create(task_draft("Team sync", start, RecurrenceRule::once(start)))
        .await
        .unwrap()
        .parent;

    // Once -> Weekly: nothing to remove besides the task itself, full series created.
    let mut to_weekly = NewTaskData::from(&original);
    to_weekly.repeat = weekly_mondays_from_march();
    let EditOutcome::Regenerated { removed, creation } =
        coordinator.edit(&original, to_weekly).await.unwrap()
    else {
        panic!("expected regeneration");
    };
    assert_eq!(removed, 1);
    assert_eq!(creation.occurrences.len(), MAX_OPEN_ENDED_OCCURRENCES);
    assert!(coordinator.store().find_task_by_id(original.id).await.unwrap().is_none());

    // Weekly -> Once, started from one of the occurrences.
    let occurrence = creation.occurrences[5].clone();
    let mut to_once = NewTaskData::from(&occurrence);
    to_once.parent_id = None;
    to_once.date = Some(start);
    to_once.repeat = RecurrenceRule::once(start);
    let EditOutcome::Regenerated { removed, creation: single } =
        coordinator.edit(&occurrence, to_once).await.unwrap()
    else {
        panic!("expected regeneration");
    };

    assert_eq!(removed, MAX_OPEN_ENDED_OCCURRENCES as u64 + 1);
    assert!(single.occurrences.is_empty());
    assert!(single.checkpoint.is_none());

    let tasks = coordinator.store().list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, single.parent.id);

    let pending = coordinator.notifier().pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, single.parent.id);

    assert!(coordinator
        .store()
        .load_checkpoint(creation.parent.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_validation_failure_writes_nothing() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let start = date(2024, 3, 1);

    let result = coordinator.create(task_draft("", start, RecurrenceRule::once(start))).await;
    assert!(matches!(
        result,
        Err(CoreError::Validation(ValidationError::EmptyName))
    ));

    let mut bad_reminder = task_draft("Dentist", start, RecurrenceRule::once(start));
    bad_reminder.reminder = Some("9am".to_string());
    assert!(coordinator.create(bad_reminder).await.is_err());

    assert!(coordinator.store().list_tasks().await.unwrap().is_empty());
    assert!(coordinator.notifier().pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_of_occurrence_without_changes_is_noop() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let creation = coordinator
        .create(task_draft("Team sync", date(2024, 3, 1), weekly_mondays_from_march()))
        .await
        .unwrap();

    let occurrence = &creation.occurrences[0];
    let outcome = coordinator
        .edit(occurrence, NewTaskData::from(occurrence))
        .await
        .unwrap();
    assert!(matches!(outcome, EditOutcome::Unchanged));
    assert_eq!(
        coordinator.store().list_tasks().await.unwrap().len(),
        MAX_OPEN_ENDED_OCCURRENCES + 1
    );
}

#[tokio::test]
async fn test_delete_one_off_cancels_only_its_reminder() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let start = date(2024, 3, 1);

    let dentist = coordinator
        .create(task_draft("Dentist", start, RecurrenceRule::once(start)))
        .await
        .unwrap()
        .parent;
    let mut no_reminder = task_draft("Groceries", start, RecurrenceRule::once(start));
    no_reminder.reminder = None;
    let groceries = coordinator.create(no_reminder).await.unwrap().parent;

    let outcome = coordinator.delete(&groceries, DeleteScope::AllOccurrences).await.unwrap();
    assert_eq!(outcome.tasks_removed, 1);
    assert_eq!(outcome.notifications_cancelled, 0);

    let outcome = coordinator.delete(&dentist, DeleteScope::ThisOccurrence).await.unwrap();
    assert_eq!(outcome.notifications_cancelled, 1);

    assert!(coordinator.store().list_tasks().await.unwrap().is_empty());
    assert!(coordinator.notifier().pending().await.unwrap().is_empty());

    let missing = coordinator.delete(&dentist, DeleteScope::ThisOccurrence).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_series_keeps_extending_after_parent_record_deleted() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let creation = coordinator
        .create(task_draft("Team sync", date(2024, 3, 1), weekly_mondays_from_march()))
        .await
        .unwrap();
    let parent_id = creation.parent.id;

    coordinator
        .delete(&creation.parent, DeleteScope::ThisOccurrence)
        .await
        .unwrap();

    let remaining = coordinator.store().find_occurrences(parent_id).await.unwrap();
    assert_eq!(remaining.len(), MAX_OPEN_ENDED_OCCURRENCES);
    let checkpoint = coordinator.store().load_checkpoint(parent_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.last_occurrence, date(2024, 9, 23));

    let summary = coordinator.extend_due_series(date(2025, 1, 1)).await.unwrap();
    assert_eq!(summary.series_checked, 1);
    assert_eq!(summary.series_extended, 1);
    assert_eq!(summary.occurrences_created, MAX_OPEN_ENDED_OCCURRENCES - 1);
    assert!(summary.errors.is_empty());

    let occurrences = coordinator.store().find_occurrences(parent_id).await.unwrap();
    assert_eq!(occurrences.len(), 2 * MAX_OPEN_ENDED_OCCURRENCES - 1);
    assert!(occurrences.iter().all(|t| t.name == "Team sync"));
    assert!(occurrences
        .iter()
        .filter_map(|t| t.date)
        .all(|d| d.weekday() == chrono::Weekday::Mon));
    assert_eq!(occurrences.last().unwrap().date, Some(date(2025, 4, 14)));

    let checkpoint = coordinator.store().load_checkpoint(parent_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.last_occurrence, date(2025, 4, 14));
}

#[tokio::test]
async fn test_deleting_last_record_of_series_drops_checkpoint() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let rule = RecurrenceRule::builder(RepeatType::Daily, date(2024, 1, 1))
        .build()
        .unwrap();
    let creation = coordinator
        .create(task_draft("Journal", date(2024, 1, 1), rule))
        .await
        .unwrap();
    let parent_id = creation.parent.id;

    coordinator
        .delete(&creation.parent, DeleteScope::ThisOccurrence)
        .await
        .unwrap();
    let (last, rest) = creation.occurrences.split_last().unwrap();
    for occurrence in rest {
        coordinator
            .delete(occurrence, DeleteScope::ThisOccurrence)
            .await
            .unwrap();
    }
    assert!(coordinator.store().load_checkpoint(parent_id).await.unwrap().is_some());

    coordinator.delete(last, DeleteScope::ThisOccurrence).await.unwrap();
    assert!(coordinator.store().load_checkpoint(parent_id).await.unwrap().is_none());
    assert!(coordinator.store().list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_counts_only_reminders_that_existed() {
    let (coordinator, _temp_dir) = setup_coordinator().await;
    let start = date(2024, 3, 1);
    let dentist = coordinator
        .create(task_draft("Dentist", start, RecurrenceRule::once(start)))
        .await
        .unwrap()
        .parent;

    // The reminder is already gone, e.g. it was never scheduled.
    assert!(coordinator.notifier().cancel(dentist.id).await.unwrap());

    let outcome = coordinator.delete(&dentist, DeleteScope::ThisOccurrence).await.unwrap();
    assert_eq!(outcome.tasks_removed, 1);
    assert_eq!(outcome.notifications_cancelled, 0);
}

#[tokio::test]
async fn test_checkpoint_survives_reopening_database() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("cadence.db");
    let db_path = db_path.to_string_lossy().to_string();

    let parent_id = {
        let repo = SqliteRepository::new(establish_connection(&db_path).await.unwrap());
        let coordinator = OccurrenceCoordinator::new(repo.clone(), repo);
        let rule = RecurrenceRule::builder(RepeatType::Daily, date(2024, 1, 1))
            .every(2)
            .build()
            .unwrap();
        coordinator
            .create(task_draft("Run", date(2024, 1, 1), rule))
            .await
            .unwrap()
            .parent
            .id
    };

    let repo = SqliteRepository::new(establish_connection(&db_path).await.unwrap());
    let checkpoint = repo.load_checkpoint(parent_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.key(), format!("repeat_{}", parent_id));
    // 30 dates two days apart starting on Jan 1.
    assert_eq!(checkpoint.last_occurrence, date(2024, 2, 28));
    assert_eq!(checkpoint.rule.interval(), 2);

    let coordinator = OccurrenceCoordinator::new(repo.clone(), repo);
    let created = coordinator.extend_series(parent_id, date(2024, 3, 1)).await.unwrap();
    assert_eq!(created.first().and_then(|t| t.date), Some(date(2024, 3, 1)));
    assert_eq!(created.len(), MAX_OPEN_ENDED_OCCURRENCES - 1);
}

#[tokio::test]
async fn test_extend_drops_checkpoint_of_missing_parent() {
    let (repo, _temp_dir) = setup_test_db().await;
    let orphan = SeriesCheckpoint {
        parent_id: Uuid::now_v7(),
        last_occurrence: date(2024, 1, 30),
        rule: RecurrenceRule::builder(RepeatType::Daily, date(2024, 1, 1)).build().unwrap(),
    };
    repo.save_checkpoint(&orphan).await.unwrap();

    let coordinator = OccurrenceCoordinator::new(repo.clone(), InMemoryNotifications::new());
    let summary = coordinator.extend_due_series(date(2024, 2, 1)).await.unwrap();

    assert_eq!(summary.series_checked, 1);
    assert_eq!(summary.series_extended, 0);
    assert!(summary.errors.is_empty());
    assert!(repo.list_checkpoints().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_short_id_prefix_lookup() {
    let (repo, _temp_dir) = setup_test_db().await;
    let task = repo
        .create_task(task_draft("Dentist", date(2024, 3, 1), RecurrenceRule::once(date(2024, 3, 1))))
        .await
        .unwrap();

    let short = &task.id.to_string()[..8];
    let found = repo.find_tasks_by_short_id_prefix(short).await.unwrap();
    assert!(found.iter().any(|t| t.id == task.id));

    let fetched = repo.find_task_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Dentist");
    assert_eq!(fetched.repeat, RecurrenceRule::once(date(2024, 3, 1)));
    assert_eq!(fetched.reminder.as_deref(), Some("08:15"));
}

#[tokio::test]
async fn test_sqlite_notification_queue() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = Uuid::now_v7();
    let first = Uuid::now_v7();
    let second = Uuid::now_v7();

    repo.schedule("2024-03-01 09:00", "first", series, first).await.unwrap();
    repo.schedule("2024-03-08 09:00", "second", series, second).await.unwrap();
    repo.schedule("garbage", "ignored", series, Uuid::now_v7()).await.unwrap();
    // Rescheduling the same id replaces it.
    repo.schedule("2024-03-02 10:00", "first moved", series, first).await.unwrap();

    let pending = repo.pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].message, "first moved");

    let now = cadence_core::notifications::parse_fire_time("2024-03-05 00:00").unwrap();
    let due = repo.due(now).await.unwrap();
    assert_eq!(due.iter().map(|n| n.id).collect::<Vec<_>>(), vec![first]);

    assert_eq!(repo.cancel_by_tag(series).await.unwrap(), 2);
    assert!(repo.pending().await.unwrap().is_empty());
    assert!(!repo.cancel(first).await.unwrap());
}

/// Notifier that fails every other schedule call
#[derive(Default)]
struct FlakyNotifier {
    calls: AtomicUsize,
    inner: InMemoryNotifications,
}

#[async_trait]
impl NotificationService for FlakyNotifier {
    async fn schedule(
        &self,
        fire_time: &str,
        message: &str,
        parent_tag: Uuid,
        notification_id: Uuid,
    ) -> Result<(), NotificationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
            return Err(NotificationError::Unavailable("device busy".to_string()));
        }
        self.inner.schedule(fire_time, message, parent_tag, notification_id).await
    }

    async fn cancel(&self, notification_id: Uuid) -> Result<bool, NotificationError> {
        self.inner.cancel(notification_id).await
    }

    async fn cancel_by_tag(&self, parent_tag: Uuid) -> Result<usize, NotificationError> {
        Err(NotificationError::Unavailable(format!("cannot cancel {}", parent_tag)))
    }

    async fn pending(&self) -> Result<Vec<Notification>, NotificationError> {
        self.inner.pending().await
    }
}

#[tokio::test]
async fn test_reminder_failures_do_not_abort_series() {
    let (repo, _temp_dir) = setup_test_db().await;
    let coordinator = OccurrenceCoordinator::new(repo, FlakyNotifier::default());
    let start = date(2024, 3, 1);
    let rule = RecurrenceRule::builder(RepeatType::Daily, start)
        .ends_on(date(2024, 3, 10))
        .build()
        .unwrap();

    let creation = coordinator.create(task_draft("Vitamins", start, rule)).await.unwrap();
    assert_eq!(creation.occurrences.len(), 9);
    assert_eq!(coordinator.store().list_tasks().await.unwrap().len(), 10);
    assert_eq!(coordinator.notifier().inner.len(), 5);

    // Bulk cancellation failing still deletes the tasks.
    let outcome = coordinator
        .delete(&creation.parent, DeleteScope::AllOccurrences)
        .await
        .unwrap();
    assert_eq!(outcome.tasks_removed, 10);
    assert_eq!(outcome.notifications_cancelled, 0);
    assert!(coordinator.store().list_tasks().await.unwrap().is_empty());
}
