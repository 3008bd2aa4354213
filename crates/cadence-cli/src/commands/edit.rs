use anyhow::Result;
use cadence_core::models::{EditOutcome, NewTaskData, UpdateTaskData};
use cadence_core::repository::TaskRepository;
use chrono::Local;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::commands::add::print_creation;
use crate::commands::recurrence::rule_with_changes;
use crate::commands::Coordinator;
use crate::parser::{parse_date, parse_reminder, parse_time};
use crate::util::resolve_task;

/// Picks the new value of an optional field from a `--x` / `--x-clear` pair.
fn changed<T>(current: Option<T>, value: Option<T>, clear: bool) -> Option<T> {
    if clear {
        None
    } else {
        value.or(current)
    }
}

pub async fn edit_task(coordinator: &Coordinator, command: EditCommand) -> Result<()> {
    let task = resolve_task(coordinator.store(), &command.id).await?;

    let date = command.date.as_deref().map(parse_date).transpose()?;
    let time = command.time.as_deref().map(parse_time).transpose()?;
    let reminder = command.reminder.as_deref().map(parse_reminder).transpose()?;

    let mut draft = NewTaskData::from(&task);
    draft.parent_id = None;
    if let Some(name) = command.name {
        draft.name = name;
    }
    draft.description = changed(draft.description, command.description, command.description_clear);
    draft.date = changed(draft.date, date, command.date_clear);
    draft.time = changed(draft.time, time, command.time_clear);
    draft.reminder = changed(draft.reminder, reminder, command.reminder_clear);
    draft.duration_minutes = changed(draft.duration_minutes, command.duration, command.duration_clear);
    draft.list = changed(draft.list, command.list, command.list_clear);

    let anchor = draft.date.unwrap_or_else(|| Local::now().date_naive());
    draft.repeat = rule_with_changes(&task.repeat, &command.recurrence, anchor)?;

    // Description is not part of change detection, so apply it on its own.
    let description_only = !draft.differs_from(&task) && draft.description != task.description;

    let success_style = Style::new().green().bold();
    if description_only {
        let updated = coordinator
            .store()
            .update_task(
                &task,
                UpdateTaskData {
                    description: Some(draft.description),
                    ..Default::default()
                },
            )
            .await?;
        println!("{} Updated task: {}", "✓".style(success_style), updated.name.bright_white().bold());
        return Ok(());
    }

    match coordinator.edit(&task, draft).await? {
        EditOutcome::Unchanged => {
            println!("No changes to apply.");
        }
        EditOutcome::Updated(updated) => {
            println!("{} Updated task: {}", "✓".style(success_style), updated.name.bright_white().bold());
        }
        EditOutcome::Regenerated { removed, creation } => {
            println!(
                "{} Rebuilt series ({} old task(s) removed)",
                "✓".style(success_style),
                removed
            );
            print_creation(&creation);
        }
    }
    Ok(())
}
