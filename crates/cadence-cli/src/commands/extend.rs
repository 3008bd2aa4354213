use anyhow::Result;
use cadence_core::coordinator::ExtensionSummary;
use chrono::Local;
use owo_colors::{OwoColorize, Style};

use crate::cli::ExtendCommand;
use crate::commands::Coordinator;
use crate::parser::parse_date;

pub async fn extend_series(coordinator: &Coordinator, command: ExtendCommand) -> Result<()> {
    let today = match command.today.as_deref() {
        Some(date) => parse_date(date)?,
        None => Local::now().date_naive(),
    };

    let summary = coordinator.extend_due_series(today).await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ExtensionSummary) {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if summary.series_extended == 0 && summary.errors.is_empty() {
        println!(
            "No series need extending ({} open-ended series checked).",
            summary.series_checked
        );
        return;
    }

    println!(
        "{} Extended {} series",
        "✓".style(success_style),
        summary.series_extended
    );
    println!(
        "  {} Occurrences created: {}",
        "→".style(info_style),
        summary.occurrences_created
    );
    for error in &summary.errors {
        eprintln!("  {} {}", "!".yellow().bold(), error.yellow());
    }
}
