use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    ///
    /// Runs inside the temp directory so only a `cadence.toml` written by the
    /// test is picked up. Startup extension is off so counts stay predictable.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");

        cmd.current_dir(self.temp_dir.path())
            .env("CADENCE_DATABASE_PATH", &self.db_path)
            .env("CADENCE_SERIES__EXTEND_ON_STARTUP", "false")
            .env_remove("RUST_LOG");

        cmd
    }

    /// Write a `cadence.toml` for subsequent commands
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.temp_dir.path().join("cadence.toml"), contents)
            .expect("Failed to write config");
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Run a command that creates a task and return the new task's ID
    pub fn add_task(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output));
        task_id_from(&stdout).expect("add output has no task ID")
    }
}

/// Removes terminal colour sequences from captured output
pub fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }
    plain
}

/// Last "Task ID: <uuid>" printed
pub fn task_id_from(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| line.split("Task ID: ").nth(1))
        .map(|id| id.trim().to_string())
        .last()
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Weekly on Mondays from a Friday, never ending
    pub fn weekly_series_args() -> Vec<&'static str> {
        vec![
            "add", "Team sync",
            "--date", "2024-03-01",
            "--reminder", "09:00",
            "--every", "weekly",
            "--on", "mon",
        ]
    }

    /// Daily from New Year, never ending
    pub fn daily_series_args() -> Vec<&'static str> {
        vec![
            "add", "Journal",
            "--date", "2024-01-01",
            "--reminder", "21:00",
            "--every", "daily",
        ]
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains task table headers
    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Name"))
            .and(predicate::str::contains("Repeats"))
    }

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("Created task").or(predicate::str::contains("Created repeating task"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
