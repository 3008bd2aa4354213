use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::Task;
use cadence_core::repository::TaskRepository;

pub async fn resolve_task(repo: &(impl TaskRepository + Sync), short_id: &str) -> Result<Task> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let mut tasks = repo.find_tasks_by_short_id_prefix(short_id).await?;
    if tasks.len() == 1 {
        Ok(tasks.remove(0))
    } else if tasks.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        ))))
    } else {
        let task_info: Vec<(String, String)> = tasks
            .into_iter()
            .map(|t| (t.id.to_string(), t.name))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(task_info)))
    }
}

/// First characters of an id, as shown in tables.
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}
