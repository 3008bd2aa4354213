use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{NewTaskData, SeriesCheckpoint, Task, UpdateTaskData};
use async_trait::async_trait;
use uuid::Uuid;

// Domain modules
pub mod checkpoints;
pub mod notifications;
pub mod tasks;

/// Domain-specific trait for task record operations
#[async_trait]
pub trait TaskRepository {
    /// Persists a new task and assigns its identity.
    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn update_task(&self, existing: &Task, changes: UpdateTaskData) -> Result<Task, CoreError>;
    /// Deletes a single record.
    ///
    /// `parent_override` names a series whose checkpoint is dropped in the
    /// same transaction. Without it no checkpoint is touched.
    async fn delete_task(&self, task: &Task, parent_override: Option<Uuid>) -> Result<(), CoreError>;
    /// Deletes every occurrence generated by `parent_id`, returning the count.
    async fn delete_occurrences(&self, parent_id: Uuid) -> Result<u64, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError>;
    async fn find_occurrences(&self, parent_id: Uuid) -> Result<Vec<Task>, CoreError>;
    /// All tasks, dated ones first in date order.
    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError>;
}

/// Domain-specific trait for open-ended series checkpoints, keyed `repeat_<parent id>`
#[async_trait]
pub trait CheckpointRepository {
    async fn save_checkpoint(&self, checkpoint: &SeriesCheckpoint) -> Result<(), CoreError>;
    async fn load_checkpoint(&self, parent_id: Uuid) -> Result<Option<SeriesCheckpoint>, CoreError>;
    async fn delete_checkpoint(&self, parent_id: Uuid) -> Result<(), CoreError>;
    async fn list_checkpoints(&self) -> Result<Vec<SeriesCheckpoint>, CoreError>;
}

/// The task store consumed by the occurrence coordinator
pub trait TaskStore: TaskRepository + CheckpointRepository {}

/// SQLite implementation of the task store and the reminder queue
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl TaskStore for SqliteRepository {}
