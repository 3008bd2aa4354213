use anyhow::Result;
use cadence_core::recurrence;
use chrono::Local;
use owo_colors::OwoColorize;

use crate::cli::PreviewCommand;
use crate::commands::recurrence::{rule_from_args, rule_with_changes};
use crate::commands::Coordinator;
use crate::util::resolve_task;
use crate::views::table::display_dates;

pub async fn preview_rule(coordinator: &Coordinator, command: PreviewCommand) -> Result<()> {
    let today = Local::now().date_naive();

    let rule = match command.id.as_deref() {
        Some(id) => {
            let task = resolve_task(coordinator.store(), id).await?;
            rule_with_changes(&task.repeat, &command.recurrence, task.date.unwrap_or(today))?
        }
        None => rule_from_args(&command.recurrence, today)?,
    };

    if !rule.is_repeating() {
        println!("This task does not repeat.");
        return Ok(());
    }

    println!("{} {}", "Rule:".blue().bold(), rule.to_string().green());
    let dates = recurrence::preview(rule.starts(), &rule, command.count);
    display_dates(&dates, today);
    Ok(())
}
