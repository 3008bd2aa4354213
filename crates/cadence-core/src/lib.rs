//! # Cadence Core Library
//!
//! Recurrence and scheduling core of a personal task and reminder manager.
//!
//! ## Features
//!
//! - **Deterministic Expansion**: Daily, weekly, monthly and yearly rules turn
//!   into concrete occurrence dates, with month-end clamping and a "last day of
//!   month" option
//! - **Bounded Generation**: Open-ended series are capped and resumed later from
//!   a stored checkpoint instead of being generated indefinitely
//! - **Consistent Edits**: Creating, editing and deleting a series keeps the task
//!   tree and its reminder notifications in step
//! - **Tagged Reminders**: Every reminder carries its series' parent id, so a
//!   whole series is cancelled with one call
//!
//! ## Core Modules
//!
//! - [`recurrence`]: Pure date expansion
//! - [`coordinator`]: Create/edit/delete/extend orchestration
//! - [`models`]: Rules, tasks and operation outcomes
//! - [`repository`]: Task store traits and the SQLite implementation
//! - [`notifications`]: Reminder service trait and an in-memory registry
//! - [`db`]: Database connection and migration management
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     coordinator::OccurrenceCoordinator,
//!     db,
//!     models::{NewTaskData, RecurrenceRule, RepeatType, Weekday},
//!     repository::SqliteRepository,
//! };
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("tasks.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!     let coordinator = OccurrenceCoordinator::new(repo.clone(), repo);
//!
//!     let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//!     let rule = RecurrenceRule::builder(RepeatType::Weekly, start)
//!         .days([Weekday::Mon, Weekday::Thu])
//!         .build()?;
//!
//!     let creation = coordinator
//!         .create(NewTaskData {
//!             name: "Gym".to_string(),
//!             date: Some(start),
//!             reminder: Some("07:00".to_string()),
//!             repeat: rule,
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Created {} occurrences", creation.occurrences.len());
//!
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod recurrence;
pub mod repository;
