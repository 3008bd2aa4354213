use cadence_core::models::{DayOfMonth, RepeatType, Weekday};
use clap::{Args, Parser, Subcommand};

/// Repeating tasks with local reminders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a task, optionally repeating
    Add(AddCommand),
    /// Edit a task; changing a repeating task rebuilds its series
    Edit(EditCommand),
    /// Delete a task or a whole series
    Delete(DeleteCommand),
    /// List tasks
    List(ListCommand),
    /// Show upcoming dates of a rule without saving anything
    Preview(PreviewCommand),
    /// Generate the next batch of open-ended series that have run out
    Extend(ExtendCommand),
    /// Show scheduled reminders
    Reminders(RemindersCommand),
}

/// Options describing a recurrence rule
#[derive(Args, Debug, Clone, Default)]
pub struct RecurrenceArgs {
    /// How often the task repeats (once, daily, weekly, monthly, yearly)
    #[arg(long)]
    pub every: Option<RepeatType>,
    /// Repeat every N days/weeks/months/years
    #[arg(long)]
    pub interval: Option<u32>,
    /// Weekdays for weekly rules, e.g. "mon,wed,fri"
    #[arg(long, value_delimiter = ',')]
    pub on: Vec<Weekday>,
    /// Day of month for monthly rules: 1-31 or "last"
    #[arg(long)]
    pub day_of_month: Option<DayOfMonth>,
    /// First day of the series (defaults to the task date)
    #[arg(long)]
    pub starts: Option<String>,
    /// Last day of the series, or "never"
    #[arg(long)]
    pub ends: Option<String>,
}

impl RecurrenceArgs {
    /// True if any rule option was given.
    pub fn is_set(&self) -> bool {
        self.every.is_some()
            || self.interval.is_some()
            || !self.on.is_empty()
            || self.day_of_month.is_some()
            || self.starts.is_some()
            || self.ends.is_some()
    }
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The name of the task
    pub name: String,
    /// The description of the task
    #[clap(short, long)]
    pub description: Option<String>,
    /// The date of the task (e.g. "2024-03-01", "tomorrow", "next friday")
    #[clap(long)]
    pub date: Option<String>,
    /// Time of day (HH:MM)
    #[clap(long)]
    pub time: Option<String>,
    /// Reminder time (HH:MM) on the task's date
    #[clap(short, long)]
    pub reminder: Option<String>,
    /// Expected duration in minutes
    #[clap(long)]
    pub duration: Option<u32>,
    /// The list the task belongs to
    #[clap(short, long)]
    pub list: Option<String>,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub date: Option<String>,
    #[arg(long, conflicts_with = "date")]
    pub date_clear: bool,

    #[arg(long)]
    pub time: Option<String>,
    #[arg(long, conflicts_with = "time")]
    pub time_clear: bool,

    #[arg(long)]
    pub reminder: Option<String>,
    #[arg(long, conflicts_with = "reminder")]
    pub reminder_clear: bool,

    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long, conflicts_with = "duration")]
    pub duration_clear: bool,

    #[arg(long)]
    pub list: Option<String>,
    #[arg(long, conflicts_with = "list")]
    pub list_clear: bool,

    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to delete
    pub id: String,
    /// Delete every occurrence of a repeating task
    #[clap(long)]
    pub all: bool,
    /// Force deletion without confirmation
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only tasks in this list
    #[clap(short, long)]
    pub list: Option<String>,
    /// Only the task with this ID and its occurrences
    #[clap(long)]
    pub series: Option<String>,
    /// Hide generated occurrences
    #[clap(long)]
    pub parents_only: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// Preview the rule of an existing task instead of one given by options
    pub id: Option<String>,
    /// Number of dates to show
    #[clap(short = 'n', long, default_value_t = 10)]
    pub count: usize,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtendCommand {
    /// Treat this date as today
    #[clap(long)]
    pub today: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct RemindersCommand {
    /// Only reminders whose fire time has passed
    #[clap(long)]
    pub due: bool,
}
