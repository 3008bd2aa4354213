//! Occurrence coordinator.
//!
//! Turns create, edit, delete and extend requests into task store writes and
//! notification calls, and keeps the checkpoint of open-ended series current.
//!
//! Callers serialize operations per series; nothing here locks a series.
//! Reminders are best-effort: a failed schedule or cancel is logged and the
//! operation carries on. Store failures abort the operation without undoing
//! writes already issued.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    DeleteOutcome, DeleteScope, EditOutcome, NewTaskData, RepeatEnd, SeriesCheckpoint,
    SeriesCreation, Task, UpdateTaskData,
};
use crate::notifications::{reminder_fire_time, NotificationService};
use crate::recurrence;
use crate::repository::TaskStore;

/// Statistics collected while extending open-ended series
#[derive(Debug, Clone, Default)]
pub struct ExtensionSummary {
    /// Number of checkpoints inspected
    pub series_checked: usize,
    /// Series that received new occurrences
    pub series_extended: usize,
    /// Total occurrences created across all series
    pub occurrences_created: usize,
    /// Detailed error messages, one per failed series
    pub errors: Vec<String>,
}

/// True when a series whose last generated date is `last` has more to come.
pub fn needs_checkpoint(ends: RepeatEnd, last: NaiveDate) -> bool {
    match ends {
        RepeatEnd::Never => true,
        RepeatEnd::On(end) => last < end,
    }
}

pub struct OccurrenceCoordinator<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> OccurrenceCoordinator<S, N>
where
    S: TaskStore + Send + Sync,
    N: NotificationService + Send + Sync,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Persists a task and, for a repeating rule, every generated occurrence.
    ///
    /// The generated date equal to the parent's own date is skipped. A
    /// checkpoint is kept only while the series has dates left to generate.
    pub async fn create(&self, draft: NewTaskData) -> Result<SeriesCreation, CoreError> {
        draft.validate()?;

        let template = NewTaskData {
            parent_id: None,
            ..draft
        };
        let parent = self
            .store
            .create_task(template.clone())
            .await
            .inspect_err(|e| tracing::error!(error = %e, name = %template.name, "failed to create task"))?;
        self.schedule_reminder(&parent).await;

        if !template.repeat.is_repeating() {
            tracing::debug!(task_id = %parent.id, "created one-off task");
            return Ok(SeriesCreation {
                parent,
                occurrences: Vec::new(),
                checkpoint: None,
            });
        }

        let rule = &template.repeat;
        let dates = recurrence::expand(rule.starts(), rule);
        tracing::debug!(parent_id = %parent.id, count = dates.len(), rule = %rule, "expanded series");

        let occurrences = self
            .materialize(&template, parent.id, &dates, parent.date)
            .await?;

        let checkpoint = match dates.last() {
            Some(&last) if needs_checkpoint(rule.ends(), last) => {
                let checkpoint = SeriesCheckpoint {
                    parent_id: parent.id,
                    last_occurrence: last,
                    rule: rule.clone(),
                };
                self.store
                    .save_checkpoint(&checkpoint)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, parent_id = %parent.id, "failed to save checkpoint"))?;
                Some(checkpoint)
            }
            _ => None,
        };

        tracing::info!(
            parent_id = %parent.id,
            occurrences = occurrences.len(),
            open_ended = checkpoint.is_some(),
            "created series"
        );
        Ok(SeriesCreation {
            parent,
            occurrences,
            checkpoint,
        })
    }

    /// Applies a new draft to an existing task.
    ///
    /// A one-off task that stays one-off is updated in place. Anything else
    /// tears the whole series down and creates it again from the draft.
    pub async fn edit(&self, existing: &Task, draft: NewTaskData) -> Result<EditOutcome, CoreError> {
        if !draft.differs_from(existing) {
            tracing::debug!(task_id = %existing.id, "edit changed nothing");
            return Ok(EditOutcome::Unchanged);
        }
        draft.validate()?;

        if !existing.repeat.is_repeating() && !draft.repeat.is_repeating() {
            let updated = self
                .store
                .update_task(existing, UpdateTaskData::replace_with(&draft))
                .await
                .inspect_err(|e| tracing::error!(error = %e, task_id = %existing.id, "failed to update task"))?;
            self.cancel_reminder(existing.id).await;
            self.schedule_reminder(&updated).await;
            return Ok(EditOutcome::Updated(updated));
        }

        let removed = self.tear_down(existing).await?.tasks_removed;
        let creation = self
            .create(NewTaskData {
                parent_id: None,
                ..draft
            })
            .await?;
        tracing::info!(
            old_parent = %existing.series_id(),
            new_parent = %creation.parent.id,
            removed,
            "regenerated series"
        );
        Ok(EditOutcome::Regenerated { removed, creation })
    }

    /// Deletes a task. On a repeating task `scope` decides whether only the
    /// selected record or the whole series goes.
    ///
    /// Removing only a parent record keeps the series checkpoint while any of
    /// its occurrences remain, so the series keeps extending.
    pub async fn delete(&self, task: &Task, scope: DeleteScope) -> Result<DeleteOutcome, CoreError> {
        if task.repeat.is_repeating() && scope == DeleteScope::AllOccurrences {
            return self.tear_down(task).await;
        }

        self.store
            .delete_task(task, None)
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id = %task.id, "failed to delete task"))?;
        if task.repeat.is_repeating() {
            self.drop_checkpoint_if_exhausted(task.series_id()).await?;
        }

        let notifications_cancelled = if task.reminder.is_some() && self.cancel_reminder(task.id).await {
            1
        } else {
            0
        };
        tracing::debug!(task_id = %task.id, "deleted task");
        Ok(DeleteOutcome {
            tasks_removed: 1,
            notifications_cancelled,
        })
    }

    /// Generates the next batch of an open-ended series once its last
    /// generated occurrence has arrived.
    ///
    /// Returns the occurrences created; empty if the series has no checkpoint
    /// or is not due yet.
    pub async fn extend_series(&self, parent_id: Uuid, today: NaiveDate) -> Result<Vec<Task>, CoreError> {
        let Some(checkpoint) = self.store.load_checkpoint(parent_id).await? else {
            return Ok(Vec::new());
        };
        if today < checkpoint.last_occurrence {
            tracing::debug!(%parent_id, last = %checkpoint.last_occurrence, "series not due for extension");
            return Ok(Vec::new());
        }

        // A parent deleted on its own leaves its occurrences to carry the series.
        let source = match self.store.find_task_by_id(parent_id).await? {
            Some(parent) => Some(parent),
            None => self.store.find_occurrences(parent_id).await?.into_iter().next(),
        };
        let Some(source) = source else {
            tracing::warn!(%parent_id, "dropping checkpoint of a deleted series");
            self.store.delete_checkpoint(parent_id).await?;
            return Ok(Vec::new());
        };

        let dates = recurrence::resume(&checkpoint);
        let template = NewTaskData {
            parent_id: None,
            ..NewTaskData::from(&source)
        };
        let occurrences = self.materialize(&template, parent_id, &dates, None).await?;

        match dates.last() {
            Some(&last) if needs_checkpoint(checkpoint.rule.ends(), last) => {
                self.store
                    .save_checkpoint(&SeriesCheckpoint {
                        last_occurrence: last,
                        ..checkpoint
                    })
                    .await?;
            }
            _ => self.store.delete_checkpoint(parent_id).await?,
        }

        tracing::info!(%parent_id, created = occurrences.len(), "extended series");
        Ok(occurrences)
    }

    /// Extends every series whose checkpoint is due on `today`.
    ///
    /// A failing series is recorded in the summary and does not stop the others.
    pub async fn extend_due_series(&self, today: NaiveDate) -> Result<ExtensionSummary, CoreError> {
        let mut summary = ExtensionSummary::default();

        for checkpoint in self.store.list_checkpoints().await? {
            summary.series_checked += 1;
            if checkpoint.last_occurrence > today {
                continue;
            }

            match self.extend_series(checkpoint.parent_id, today).await {
                Ok(created) if !created.is_empty() => {
                    summary.series_extended += 1;
                    summary.occurrences_created += created.len();
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(parent_id = %checkpoint.parent_id, error = %e, "failed to extend series");
                    summary
                        .errors
                        .push(format!("Series {}: {}", checkpoint.parent_id, e));
                }
            }
        }

        Ok(summary)
    }

    /// Creates one child per date, in order, skipping `skip`.
    async fn materialize(
        &self,
        template: &NewTaskData,
        parent_id: Uuid,
        dates: &[NaiveDate],
        skip: Option<NaiveDate>,
    ) -> Result<Vec<Task>, CoreError> {
        let mut occurrences = Vec::with_capacity(dates.len());
        for &date in dates {
            if Some(date) == skip {
                continue;
            }
            let occurrence = self
                .store
                .create_task(template.occurrence(parent_id, date))
                .await
                .inspect_err(|e| tracing::error!(error = %e, %parent_id, %date, "failed to create occurrence"))?;
            self.schedule_reminder(&occurrence).await;
            occurrences.push(occurrence);
        }
        Ok(occurrences)
    }

    /// Removes the parent of `task`'s series, its occurrences and their
    /// reminders.
    async fn tear_down(&self, task: &Task) -> Result<DeleteOutcome, CoreError> {
        let parent_id = task.series_id();

        let mut removed = self
            .store
            .delete_occurrences(parent_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %parent_id, "failed to delete occurrences"))?;
        let notifications_cancelled = self.cancel_series_reminders(parent_id).await;

        let parent = if task.is_occurrence() {
            self.store.find_task_by_id(parent_id).await?
        } else {
            Some(task.clone())
        };
        match parent {
            Some(parent) => {
                self.store
                    .delete_task(&parent, Some(parent_id))
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, %parent_id, "failed to delete parent task"))?;
                removed += 1;
            }
            None => {
                tracing::warn!(%parent_id, "parent task already gone");
                self.store.delete_checkpoint(parent_id).await?;
            }
        }

        tracing::debug!(%parent_id, removed, notifications_cancelled, "tore down series");
        Ok(DeleteOutcome {
            tasks_removed: removed,
            notifications_cancelled,
        })
    }

    /// Drops the checkpoint of a series that has no records left.
    async fn drop_checkpoint_if_exhausted(&self, parent_id: Uuid) -> Result<(), CoreError> {
        if self.store.find_task_by_id(parent_id).await?.is_some() {
            return Ok(());
        }
        if self.store.find_occurrences(parent_id).await?.is_empty() {
            tracing::debug!(%parent_id, "last record of series deleted");
            self.store.delete_checkpoint(parent_id).await?;
        }
        Ok(())
    }

    async fn schedule_reminder(&self, task: &Task) {
        let Some(fire_time) = reminder_fire_time(task) else {
            return;
        };
        if let Err(e) = self
            .notifier
            .schedule(&fire_time, &task.name, task.series_id(), task.id)
            .await
        {
            tracing::warn!(task_id = %task.id, error = %e, "failed to schedule reminder");
        }
    }

    /// True only if a reminder was actually removed.
    async fn cancel_reminder(&self, task_id: Uuid) -> bool {
        match self.notifier.cancel(task_id).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "failed to cancel reminder");
                false
            }
        }
    }

    async fn cancel_series_reminders(&self, parent_id: Uuid) -> usize {
        match self.notifier.cancel_by_tag(parent_id).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                tracing::warn!(%parent_id, error = %e, "failed to cancel series reminders");
                0
            }
        }
    }
}
