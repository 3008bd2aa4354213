use crate::error::{CoreError, StoreError};
use crate::models::{checkpoint_key, NewTaskData, Task, UpdateTaskData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Row shape of the `tasks` table; ids and the rule are stored as text.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskRecord {
    id: String,
    parent_id: Option<String>,
    name: String,
    description: Option<String>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    reminder: Option<String>,
    duration_minutes: Option<i64>,
    list: Option<String>,
    completed: bool,
    repeat: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw)
        .map_err(|_| StoreError::Corrupt(format!("invalid id '{}'", raw)).into())
}

impl TryFrom<TaskRecord> for Task {
    type Error = CoreError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let duration_minutes = record
            .duration_minutes
            .map(u32::try_from)
            .transpose()
            .map_err(|_| StoreError::Corrupt(format!("negative duration on task {}", record.id)))?;

        Ok(Task {
            id: parse_id(&record.id)?,
            parent_id: record.parent_id.as_deref().map(parse_id).transpose()?,
            name: record.name,
            description: record.description,
            date: record.date,
            time: record.time,
            reminder: record.reminder,
            duration_minutes,
            list: record.list,
            completed: record.completed,
            repeat: serde_json::from_str(&record.repeat)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn into_tasks(records: Vec<TaskRecord>) -> Result<Vec<Task>, CoreError> {
    records.into_iter().map(Task::try_from).collect()
}

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let now = Utc::now();
        // Random ids keep short id prefixes distinct within a batch.
        let task = Task {
            id: Uuid::new_v4(),
            parent_id: data.parent_id,
            name: data.name,
            description: data.description,
            date: data.date,
            time: data.time,
            reminder: data.reminder,
            duration_minutes: data.duration_minutes,
            list: data.list,
            completed: false,
            repeat: data.repeat,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO tasks (id, parent_id, name, description, date, time, reminder, duration_minutes, list, completed, repeat, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(task.id.to_string())
        .bind(task.parent_id.map(|id| id.to_string()))
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.date)
        .bind(task.time)
        .bind(&task.reminder)
        .bind(task.duration_minutes.map(i64::from))
        .bind(&task.list)
        .bind(task.completed)
        .bind(serde_json::to_string(&task.repeat)?)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(self.pool())
        .await?;

        Ok(task)
    }

    async fn update_task(&self, existing: &Task, changes: UpdateTaskData) -> Result<Task, CoreError> {
        let mut task = existing.clone();
        changes.apply_to(&mut task);

        let result = sqlx::query(
            r#"UPDATE tasks
            SET name = $1, description = $2, date = $3, time = $4, reminder = $5,
                duration_minutes = $6, list = $7, completed = $8, repeat = $9, updated_at = $10
            WHERE id = $11"#,
        )
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.date)
        .bind(task.time)
        .bind(&task.reminder)
        .bind(task.duration_minutes.map(i64::from))
        .bind(&task.list)
        .bind(task.completed)
        .bind(serde_json::to_string(&task.repeat)?)
        .bind(task.updated_at)
        .bind(task.id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(task.id.to_string()));
        }
        Ok(task)
    }

    async fn delete_task(&self, task: &Task, parent_override: Option<Uuid>) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task.id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(task.id.to_string()));
        }

        if let Some(parent_id) = parent_override {
            sqlx::query("DELETE FROM series_checkpoints WHERE key = $1")
                .bind(checkpoint_key(parent_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_occurrences(&self, parent_id: Uuid) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE parent_id = $1")
            .bind(parent_id.to_string())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let record: Option<TaskRecord> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;
        record.map(Task::try_from).transpose()
    }

    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError> {
        let mut pattern = String::with_capacity(short_id.len() + 1);
        pattern.push_str(short_id);
        pattern.push('%');

        let records: Vec<TaskRecord> = sqlx::query_as("SELECT * FROM tasks WHERE id LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        into_tasks(records)
    }

    async fn find_occurrences(&self, parent_id: Uuid) -> Result<Vec<Task>, CoreError> {
        let records: Vec<TaskRecord> =
            sqlx::query_as("SELECT * FROM tasks WHERE parent_id = $1 ORDER BY date, created_at")
                .bind(parent_id.to_string())
                .fetch_all(self.pool())
                .await?;
        into_tasks(records)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let records: Vec<TaskRecord> =
            sqlx::query_as("SELECT * FROM tasks ORDER BY date IS NULL, date, created_at")
                .fetch_all(self.pool())
                .await?;
        into_tasks(records)
    }
}
