use anyhow::{anyhow, Result};
use cadence_core::models::{RepeatEnd, REMINDER_TIME_FORMAT};
use chrono::{Local, NaiveDate, NaiveTime};
use chrono_english::{parse_date_string, Dialect};

const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parses an ISO date or a natural-language one ("tomorrow", "next friday").
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let input = date_str.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(input, Local::now(), Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", date_str, e))
}

pub fn parse_time(time_str: &str) -> Result<NaiveTime> {
    let input = time_str.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(input, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse time '{}': expected HH:MM", time_str))
}

/// Normalises a reminder to the stored `HH:mm` form.
pub fn parse_reminder(reminder: &str) -> Result<String> {
    Ok(parse_time(reminder)?.format(REMINDER_TIME_FORMAT).to_string())
}

/// Parses a series end: "never" or a date.
pub fn parse_end(end_str: &str) -> Result<RepeatEnd> {
    match end_str.trim().to_lowercase().as_str() {
        "never" | "none" => Ok(RepeatEnd::Never),
        _ => parse_date(end_str).map(RepeatEnd::On),
    }
}
