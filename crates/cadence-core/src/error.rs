use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task store error")]
    Store(#[from] StoreError),

    #[error("Notification error")]
    Notification(#[from] NotificationError),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ambiguous ID: matches {} tasks", .0.len())]
    AmbiguousId(Vec<(String, String)>),
}

/// Rejected input, raised before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("day of month must be between 1 and 31")]
    ZeroDayOfMonth,

    #[error("day of month {0} is out of range (1-31)")]
    DayOfMonthOutOfRange(u32),

    #[error("a weekly rule needs at least one weekday")]
    EmptyWeekdays,

    #[error("repeat interval must be at least 1")]
    ZeroInterval,

    #[error("reminder time '{0}' is not a valid HH:mm time")]
    InvalidReminderTime(String),

    #[error("series ends on {ends} which is before it starts on {starts}")]
    EndsBeforeStart { starts: String, ends: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Stored recurrence rule is corrupt")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification queue error")]
    Queue(#[from] sqlx::Error),

    #[error("Notification registry unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Store(StoreError::Database(err))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Store(StoreError::Serialization(err))
    }
}
