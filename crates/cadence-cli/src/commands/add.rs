use anyhow::Result;
use cadence_core::models::{NewTaskData, SeriesCreation};
use chrono::Local;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::commands::recurrence::rule_from_args;
use crate::commands::Coordinator;
use crate::config::Config;
use crate::parser::{parse_date, parse_reminder, parse_time};

pub async fn add_task(coordinator: &Coordinator, command: AddCommand, config: &Config) -> Result<()> {
    let date = command.date.as_deref().map(parse_date).transpose()?;
    let time = command.time.as_deref().map(parse_time).transpose()?;

    let repeat = rule_from_args(
        &command.recurrence,
        date.unwrap_or_else(|| Local::now().date_naive()),
    )?;
    // A repeating task without a date sits on the first day of its series.
    let date = date.or_else(|| repeat.is_repeating().then(|| repeat.starts()));

    let reminder = match command.reminder.as_deref() {
        Some(reminder) => Some(parse_reminder(reminder)?),
        None if date.is_some() => config.reminders.default_time.clone(),
        None => None,
    };

    let draft = NewTaskData {
        name: command.name,
        description: command.description,
        date,
        time,
        reminder,
        duration_minutes: command.duration,
        list: command.list,
        parent_id: None,
        repeat,
    };

    let creation = coordinator.create(draft).await?;
    print_creation(&creation);
    Ok(())
}

pub fn print_creation(creation: &SeriesCreation) {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let parent = &creation.parent;

    if parent.repeat.is_repeating() {
        println!(
            "{} Created repeating task: {}",
            "✓".style(success_style),
            parent.name.bright_white().bold()
        );
    } else {
        println!(
            "{} Created task: {}",
            "✓".style(success_style),
            parent.name.bright_white().bold()
        );
    }
    println!("  {} Task ID: {}", "→".style(info_style), parent.id.to_string().yellow());

    if let Some(date) = parent.date {
        println!("  {} Date: {}", "→".style(info_style), date.to_string().cyan());
    }
    if let Some(reminder) = &parent.reminder {
        println!("  {} Reminder: {}", "→".style(info_style), reminder.cyan());
    }

    if parent.repeat.is_repeating() {
        println!("  {} Repeats: {}", "→".style(info_style), parent.repeat.to_string().green());
        println!(
            "  {} Occurrences created: {}",
            "→".style(info_style),
            creation.occurrences.len()
        );
        if let Some(checkpoint) = &creation.checkpoint {
            println!(
                "  {} More occurrences follow after {}",
                "→".style(info_style),
                checkpoint.last_occurrence.to_string().cyan()
            );
        }
    }
}
