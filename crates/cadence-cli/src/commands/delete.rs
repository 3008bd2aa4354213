use anyhow::Result;
use cadence_core::models::DeleteScope;
use dialoguer::{Confirm, Select};
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::commands::Coordinator;
use crate::util::resolve_task;

pub async fn delete_task(coordinator: &Coordinator, command: DeleteCommand) -> Result<()> {
    let task = resolve_task(coordinator.store(), &command.id).await?;

    let scope = if !task.repeat.is_repeating() || command.all {
        DeleteScope::AllOccurrences
    } else if command.force {
        DeleteScope::ThisOccurrence
    } else {
        let date = task
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "no date".to_string());
        let options = vec![
            format!("This occurrence only ({})", date),
            "All occurrences".to_string(),
        ];

        println!("{}", "This task is part of a repeating series.".yellow());
        let selection = Select::new()
            .with_prompt("What would you like to delete?")
            .items(&options)
            .default(0)
            .interact_opt()
            .unwrap_or(None);

        match selection {
            Some(0) => DeleteScope::ThisOccurrence,
            Some(_) => DeleteScope::AllOccurrences,
            None => {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }
    };

    if !command.force {
        let prompt = match scope {
            DeleteScope::AllOccurrences if task.repeat.is_repeating() => {
                format!("Delete every occurrence of '{}'?", task.name)
            }
            _ => format!("Are you sure you want to delete task '{}'?", task.name),
        };
        let confirmation = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let outcome = coordinator.delete(&task, scope).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Deleted {} task(s)",
        "✓".style(success_style),
        outcome.tasks_removed
    );
    if outcome.notifications_cancelled > 0 {
        println!(
            "  {} Cancelled {} reminder(s)",
            "→".style(info_style),
            outcome.notifications_cancelled
        );
    }
    Ok(())
}
