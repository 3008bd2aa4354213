use anyhow::Result;
use cadence_core::notifications::NotificationService;
use chrono::Local;

use crate::cli::RemindersCommand;
use crate::commands::Coordinator;
use crate::config::Config;
use crate::views::table::display_reminders;

pub async fn list_reminders(coordinator: &Coordinator, command: RemindersCommand, config: &Config) -> Result<()> {
    if !config.reminders.enabled {
        println!("Reminders are disabled; no new reminders are being scheduled.");
    }

    let reminders = if command.due {
        coordinator.notifier().due(Local::now().naive_local()).await?
    } else {
        coordinator.notifier().pending().await?
    };

    display_reminders(&reminders);
    Ok(())
}
