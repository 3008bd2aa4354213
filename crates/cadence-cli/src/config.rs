use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub series: SeriesConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ReminderConfig {
    /// When false, new reminders are not queued; existing ones can still be cancelled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Reminder time (HH:MM) given to dated tasks added without one
    #[serde(default)]
    pub default_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SeriesConfig {
    /// Extend open-ended series that have run out before running a command
    #[serde(default = "default_true")]
    pub extend_on_startup: bool,
}

fn default_database_path() -> String {
    "cadence.db".to_string()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_time: None,
        }
    }
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            extend_on_startup: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_filter: default_log_filter(),
            reminders: ReminderConfig::default(),
            series: SeriesConfig::default(),
        }
    }
}

impl Config {
    /// Loads `cadence.toml`, then `CADENCE_` environment variables.
    ///
    /// Nested keys use a double underscore: `CADENCE_REMINDERS__ENABLED=false`.
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed("CADENCE_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}
