use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ValidationError;

/// Reminder times are stored and exchanged as 24-hour `HH:mm` strings.
pub const REMINDER_TIME_FORMAT: &str = "%H:%M";

/// Prefix of the key under which an open-ended series keeps its checkpoint.
pub const CHECKPOINT_KEY_PREFIX: &str = "repeat_";

// ============================================================================
// Recurrence rule vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatType {
    pub fn is_repeating(self) -> bool {
        !matches!(self, RepeatType::Once)
    }
}

impl std::fmt::Display for RepeatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatType::Once => write!(f, "once"),
            RepeatType::Daily => write!(f, "daily"),
            RepeatType::Weekly => write!(f, "weekly"),
            RepeatType::Monthly => write!(f, "monthly"),
            RepeatType::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid repeat type: {0}")]
pub struct ParseRepeatTypeError(String);

impl FromStr for RepeatType {
    type Err = ParseRepeatTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" | "none" | "never" => Ok(RepeatType::Once),
            "daily" | "day" => Ok(RepeatType::Daily),
            "weekly" | "week" => Ok(RepeatType::Weekly),
            "monthly" | "month" => Ok(RepeatType::Monthly),
            "yearly" | "year" | "annually" => Ok(RepeatType::Yearly),
            _ => Err(ParseRepeatTypeError(s.to_string())),
        }
    }
}

/// Weekday token used by weekly rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Offset of this weekday from the Monday that opens its week (Mon = 0, Sun = 6).
    ///
    /// Weeks run Monday through Sunday; the weekly expansion adds this offset to
    /// the Monday of the cursor's week.
    pub fn days_from_monday(self) -> u32 {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
            Weekday::Sat => 5,
            Weekday::Sun => 6,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => chrono::Weekday::Mon,
            Weekday::Tue => chrono::Weekday::Tue,
            Weekday::Wed => chrono::Weekday::Wed,
            Weekday::Thu => chrono::Weekday::Thu,
            Weekday::Fri => chrono::Weekday::Fri,
            Weekday::Sat => chrono::Weekday::Sat,
            Weekday::Sun => chrono::Weekday::Sun,
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid weekday: {0}")]
pub struct ParseWeekdayError(String);

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" | "m" | "mo" => Ok(Weekday::Mon),
            "tue" | "tuesday" | "tu" => Ok(Weekday::Tue),
            "wed" | "wednesday" | "w" | "we" => Ok(Weekday::Wed),
            "thu" | "thursday" | "th" => Ok(Weekday::Thu),
            "fri" | "friday" | "f" | "fr" => Ok(Weekday::Fri),
            "sat" | "saturday" | "sa" => Ok(Weekday::Sat),
            "sun" | "sunday" | "su" => Ok(Weekday::Sun),
            _ => Err(ParseWeekdayError(s.to_string())),
        }
    }
}

/// Which day a monthly rule lands on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfMonth {
    /// A fixed day, clamped to the length of shorter months.
    Day(u32),
    /// The final calendar day of each month.
    Last,
}

impl std::fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayOfMonth::Day(day) => write!(f, "{}", day),
            DayOfMonth::Last => write!(f, "last"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid day of month: {0}")]
pub struct ParseDayOfMonthError(String);

impl FromStr for DayOfMonth {
    type Err = ParseDayOfMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        match input.as_str() {
            "last" | "end" | "-1" => Ok(DayOfMonth::Last),
            _ => input
                .parse::<u32>()
                .map(DayOfMonth::Day)
                .map_err(|_| ParseDayOfMonthError(s.to_string())),
        }
    }
}

/// Upper bound of a series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepeatEnd {
    /// Inclusive last date.
    On(NaiveDate),
    /// Open-ended; generation is capped.
    Never,
}

impl RepeatEnd {
    /// Returns true if `date` is not past this bound.
    #[inline]
    pub fn admits(&self, date: NaiveDate) -> bool {
        match self {
            RepeatEnd::On(end) => date <= *end,
            RepeatEnd::Never => true,
        }
    }
}

// ============================================================================
// RecurrenceRule + builder
// ============================================================================

/// Immutable recurrence rule owned by a parent task.
///
/// Construct through [`RecurrenceRuleBuilder`]; the builder enforces the rule
/// invariants, so an existing rule is replaced wholesale rather than edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    repeat_type: RepeatType,
    every: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    days: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_month: Option<DayOfMonth>,
    starts: NaiveDate,
    ends: RepeatEnd,
}

impl RecurrenceRule {
    /// A non-repeating rule anchored on `starts`.
    pub fn once(starts: NaiveDate) -> Self {
        Self {
            repeat_type: RepeatType::Once,
            every: 1,
            days: Vec::new(),
            day_of_month: None,
            starts,
            ends: RepeatEnd::Never,
        }
    }

    pub fn builder(repeat_type: RepeatType, starts: NaiveDate) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(repeat_type, starts)
    }

    /// Draft seeded from this rule, for edits.
    pub fn to_builder(&self) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder {
            repeat_type: self.repeat_type,
            every: self.every,
            days: self.days.clone(),
            day_of_month: self.day_of_month,
            starts: self.starts,
            ends: self.ends,
        }
    }

    pub fn repeat_type(&self) -> RepeatType {
        self.repeat_type
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_type.is_repeating()
    }

    /// Raw multiplier as stored.
    pub fn every(&self) -> u32 {
        self.every
    }

    /// Multiplier used for date arithmetic, never below 1.
    #[inline]
    pub fn interval(&self) -> u32 {
        self.every.max(1)
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    pub fn day_of_month(&self) -> Option<DayOfMonth> {
        self.day_of_month
    }

    pub fn starts(&self) -> NaiveDate {
        self.starts
    }

    pub fn ends(&self) -> RepeatEnd {
        self.ends
    }

    /// Checks the invariants a deserialized rule may have lost.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_repeating() {
            return Ok(());
        }
        if self.every == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        if self.repeat_type == RepeatType::Weekly && self.days.is_empty() {
            return Err(ValidationError::EmptyWeekdays);
        }
        match self.day_of_month {
            Some(DayOfMonth::Day(0)) => return Err(ValidationError::ZeroDayOfMonth),
            Some(DayOfMonth::Day(day)) if day > 31 => {
                return Err(ValidationError::DayOfMonthOutOfRange(day))
            }
            _ => {}
        }
        if let RepeatEnd::On(end) = self.ends {
            if end < self.starts {
                return Err(ValidationError::EndsBeforeStart {
                    starts: self.starts.to_string(),
                    ends: end.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::once(Local::now().date_naive())
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self.repeat_type {
            RepeatType::Once => return write!(f, "once"),
            RepeatType::Daily => "day",
            RepeatType::Weekly => "week",
            RepeatType::Monthly => "month",
            RepeatType::Yearly => "year",
        };
        if self.interval() == 1 {
            write!(f, "every {}", unit)?;
        } else {
            write!(f, "every {} {}s", self.interval(), unit)?;
        }

        if !self.days.is_empty() {
            let days: Vec<String> = self.days.iter().map(|d| d.to_string()).collect();
            write!(f, " on {}", days.join(", "))?;
        }
        match self.day_of_month {
            Some(DayOfMonth::Last) => write!(f, " on the last day")?,
            Some(DayOfMonth::Day(day)) => write!(f, " on day {}", day)?,
            None => {}
        }

        write!(f, " from {}", self.starts)?;
        if let RepeatEnd::On(end) = self.ends {
            write!(f, " until {}", end)?;
        }
        Ok(())
    }
}

/// Draft that accumulates rule edits and commits them atomically via [`build`](Self::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRuleBuilder {
    repeat_type: RepeatType,
    every: u32,
    days: Vec<Weekday>,
    day_of_month: Option<DayOfMonth>,
    starts: NaiveDate,
    ends: RepeatEnd,
}

impl RecurrenceRuleBuilder {
    pub fn new(repeat_type: RepeatType, starts: NaiveDate) -> Self {
        Self {
            repeat_type,
            every: 1,
            days: Vec::new(),
            day_of_month: None,
            starts,
            ends: RepeatEnd::Never,
        }
    }

    /// Switching away from weekly drops the weekday selection.
    pub fn repeat_type(mut self, repeat_type: RepeatType) -> Self {
        if repeat_type != RepeatType::Weekly {
            self.days.clear();
        }
        self.repeat_type = repeat_type;
        self
    }

    pub fn every(mut self, every: u32) -> Self {
        self.every = every;
        self
    }

    /// Adds a weekday; duplicates are ignored and declaration order is kept.
    pub fn on(mut self, day: Weekday) -> Self {
        if !self.days.contains(&day) {
            self.days.push(day);
        }
        self
    }

    pub fn days<I: IntoIterator<Item = Weekday>>(mut self, days: I) -> Self {
        self.days.clear();
        for day in days {
            self = self.on(day);
        }
        self
    }

    pub fn day_of_month(mut self, day_of_month: DayOfMonth) -> Self {
        self.day_of_month = Some(day_of_month);
        self
    }

    pub fn starts(mut self, starts: NaiveDate) -> Self {
        self.starts = starts;
        self
    }

    pub fn ends_on(mut self, end: NaiveDate) -> Self {
        self.ends = RepeatEnd::On(end);
        self
    }

    pub fn never_ends(mut self) -> Self {
        self.ends = RepeatEnd::Never;
        self
    }

    pub fn ends(mut self, ends: RepeatEnd) -> Self {
        self.ends = ends;
        self
    }

    /// Normalises the draft for its repeat type and validates it.
    ///
    /// A monthly draft without an explicit day takes the start date's day.
    pub fn build(self) -> Result<RecurrenceRule, ValidationError> {
        let rule = match self.repeat_type {
            RepeatType::Once => RecurrenceRule::once(self.starts),
            repeat_type => RecurrenceRule {
                repeat_type,
                every: self.every,
                days: if repeat_type == RepeatType::Weekly {
                    self.days
                } else {
                    Vec::new()
                },
                day_of_month: if repeat_type == RepeatType::Monthly {
                    Some(
                        self.day_of_month
                            .unwrap_or(DayOfMonth::Day(self.starts.day())),
                    )
                } else {
                    None
                },
                starts: self.starts,
                ends: self.ends,
            },
        };
        rule.validate()?;
        Ok(rule)
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    /// None for a parent task; otherwise the parent that generated this occurrence.
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// `HH:mm` reminder time, combined with `date` to fire a notification.
    pub reminder: Option<String>,
    pub duration_minutes: Option<u32>,
    pub list: Option<String>,
    pub completed: bool,
    pub repeat: RecurrenceRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Id of the series this task belongs to: its parent, or itself.
    #[inline]
    pub fn series_id(&self) -> Uuid {
        self.parent_id.unwrap_or(self.id)
    }

    pub fn is_occurrence(&self) -> bool {
        self.parent_id.is_some()
    }
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            parent_id: None,
            name: "".to_string(),
            description: None,
            date: None,
            time: None,
            reminder: None,
            duration_minutes: None,
            list: None,
            completed: false,
            repeat: RecurrenceRule::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Draft of a task as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTaskData {
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub reminder: Option<String>,
    pub duration_minutes: Option<u32>,
    pub list: Option<String>,
    /// Set by the coordinator when persisting occurrences.
    pub parent_id: Option<Uuid>,
    pub repeat: RecurrenceRule,
}

impl NewTaskData {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(reminder) = &self.reminder {
            if parse_reminder_time(reminder).is_none() {
                return Err(ValidationError::InvalidReminderTime(reminder.clone()));
            }
        }
        self.repeat.validate()
    }

    /// Compares the user-observable fields against a stored task.
    ///
    /// The rule is compared structurally.
    pub fn differs_from(&self, task: &Task) -> bool {
        self.name != task.name
            || self.date != task.date
            || self.time != task.time
            || self.reminder != task.reminder
            || self.repeat != task.repeat
            || self.duration_minutes != task.duration_minutes
            || self.list != task.list
    }

    /// Draft for one generated occurrence of this parent draft.
    pub fn occurrence(&self, parent_id: Uuid, date: NaiveDate) -> NewTaskData {
        NewTaskData {
            date: Some(date),
            parent_id: Some(parent_id),
            ..self.clone()
        }
    }
}

impl From<&Task> for NewTaskData {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            date: task.date,
            time: task.time,
            reminder: task.reminder.clone(),
            duration_minutes: task.duration_minutes,
            list: task.list.clone(),
            parent_id: task.parent_id,
            repeat: task.repeat.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<Option<NaiveDate>>,
    pub time: Option<Option<NaiveTime>>,
    pub reminder: Option<Option<String>>,
    pub duration_minutes: Option<Option<u32>>,
    pub list: Option<Option<String>>,
    pub completed: Option<bool>,
    pub repeat: Option<RecurrenceRule>,
}

impl UpdateTaskData {
    /// Changes that overwrite every editable field with the draft's values.
    pub fn replace_with(draft: &NewTaskData) -> Self {
        Self {
            name: Some(draft.name.clone()),
            description: Some(draft.description.clone()),
            date: Some(draft.date),
            time: Some(draft.time),
            reminder: Some(draft.reminder.clone()),
            duration_minutes: Some(draft.duration_minutes),
            list: Some(draft.list.clone()),
            completed: None,
            repeat: Some(draft.repeat.clone()),
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(date) = self.date {
            task.date = date;
        }
        if let Some(time) = self.time {
            task.time = time;
        }
        if let Some(reminder) = &self.reminder {
            task.reminder = reminder.clone();
        }
        if let Some(duration) = self.duration_minutes {
            task.duration_minutes = duration;
        }
        if let Some(list) = &self.list {
            task.list = list.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(repeat) = &self.repeat {
            task.repeat = repeat.clone();
        }
        task.updated_at = Utc::now();
    }
}

/// Parses a `HH:mm` reminder time.
pub fn parse_reminder_time(reminder: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(reminder.trim(), REMINDER_TIME_FORMAT).ok()
}

// ============================================================================
// Series bookkeeping
// ============================================================================

/// Last generated occurrence of an open-ended series, kept so the series can
/// be resumed without regenerating from its start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesCheckpoint {
    pub parent_id: Uuid,
    pub last_occurrence: NaiveDate,
    pub rule: RecurrenceRule,
}

impl SeriesCheckpoint {
    pub fn key(&self) -> String {
        checkpoint_key(self.parent_id)
    }
}

pub fn checkpoint_key(parent_id: Uuid) -> String {
    format!("{}{}", CHECKPOINT_KEY_PREFIX, parent_id)
}

/// Everything written by one create pass.
#[derive(Debug, Clone)]
pub struct SeriesCreation {
    pub parent: Task,
    /// Child occurrences in chronological order; empty for a one-off task.
    pub occurrences: Vec<Task>,
    pub checkpoint: Option<SeriesCheckpoint>,
}

#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// No observable field changed; nothing was written.
    Unchanged,
    /// A one-off task updated in place.
    Updated(Task),
    /// The series was torn down and rebuilt from the draft.
    Regenerated {
        removed: u64,
        creation: SeriesCreation,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub tasks_removed: u64,
    pub notifications_cancelled: usize,
}

/// How far a delete on a repeating task reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Only the selected record.
    ThisOccurrence,
    /// The parent and every occurrence it generated.
    AllOccurrences,
}

impl std::fmt::Display for DeleteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteScope::ThisOccurrence => write!(f, "occurrence"),
            DeleteScope::AllOccurrences => write!(f, "all"),
        }
    }
}

impl FromStr for DeleteScope {
    type Err = ParseDeleteScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "occurrence" | "this" | "one" => Ok(DeleteScope::ThisOccurrence),
            "all" | "series" | "entire" => Ok(DeleteScope::AllOccurrences),
            _ => Err(ParseDeleteScopeError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid delete scope: {0}")]
pub struct ParseDeleteScopeError(String);
