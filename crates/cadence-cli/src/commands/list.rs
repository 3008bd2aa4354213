use anyhow::Result;
use cadence_core::repository::TaskRepository;

use crate::cli::ListCommand;
use crate::commands::Coordinator;
use crate::util::resolve_task;
use crate::views::table::{display_tasks, ViewTask};

pub async fn list_tasks(coordinator: &Coordinator, command: ListCommand) -> Result<()> {
    let series = match command.series.as_deref() {
        Some(id) => Some(resolve_task(coordinator.store(), id).await?.series_id()),
        None => None,
    };

    let tasks = coordinator.store().list_tasks().await?;

    let view_tasks: Vec<ViewTask> = tasks
        .iter()
        .filter(|t| !command.parents_only || !t.is_occurrence())
        .filter(|t| series.map_or(true, |id| t.series_id() == id))
        .filter(|t| match &command.list {
            Some(list) => t
                .list
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(list)),
            None => true,
        })
        .map(ViewTask::from)
        .collect();

    display_tasks(&view_tasks);

    Ok(())
}
