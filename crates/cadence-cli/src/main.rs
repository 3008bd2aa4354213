use cadence_core::coordinator::OccurrenceCoordinator;
use cadence_core::db;
use cadence_core::error::{CoreError, StoreError};
use cadence_core::repository::SqliteRepository;
use chrono::Local;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod notifier;
mod parser;
mod util;
mod views;

use commands::Coordinator;
use notifier::ReminderQueue;

#[tokio::main]
async fn main() {
    let config = config::Config::new().unwrap_or_else(|e| {
        eprintln!(
            "{} ignoring invalid configuration: {}",
            "Warning:".yellow().bold(),
            e
        );
        config::Config::default()
    });
    init_tracing(&config.log_filter);

    let cli = cli::Cli::parse();

    if let Err(e) = run(cli, &config).await {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Ignore a second initialisation; only one subscriber can be global.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: cli::Cli, config: &config::Config) -> anyhow::Result<()> {
    let pool = db::establish_connection(&config.database_path).await?;
    let repository = SqliteRepository::new(pool);
    let coordinator: Coordinator = OccurrenceCoordinator::new(
        repository.clone(),
        ReminderQueue::new(repository, config.reminders.enabled),
    );

    let explicit_extend = matches!(cli.command, cli::Commands::Extend(_));
    if config.series.extend_on_startup && !explicit_extend {
        let summary = coordinator
            .extend_due_series(Local::now().date_naive())
            .await?;
        if summary.occurrences_created > 0 {
            tracing::info!(
                series = summary.series_extended,
                created = summary.occurrences_created,
                "extended open-ended series"
            );
        }
        for error in &summary.errors {
            tracing::warn!(%error, "series extension failed");
        }
    }

    match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&coordinator, command, config).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&coordinator, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&coordinator, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&coordinator, command).await,
        cli::Commands::Preview(command) => {
            commands::preview::preview_rule(&coordinator, command).await
        }
        cli::Commands::Extend(command) => {
            commands::extend::extend_series(&coordinator, command).await
        }
        cli::Commands::Reminders(command) => {
            commands::reminders::list_reminders(&coordinator, command, config).await
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::Validation(v) => {
                eprintln!("{} Invalid task: {}", "Error:".style(error_style), v);
            }
            CoreError::AmbiguousId(tasks) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, name) in tasks {
                    eprintln!("  {} ({})", id.yellow(), name);
                }
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::Store(StoreError::Database(e)) => {
                eprintln!("{} Database error: {}", "Error:".style(error_style), e);
            }
            CoreError::Store(StoreError::Migration(e)) => {
                eprintln!(
                    "{} Could not prepare the database: {}",
                    "Error:".style(error_style),
                    e
                );
            }
            _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
