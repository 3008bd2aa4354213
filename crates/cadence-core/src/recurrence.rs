//! Recurrence expansion.
//!
//! [`expand`] turns a start date and a [`RecurrenceRule`] into the concrete,
//! chronologically ordered dates of the series. It is a pure function: the same
//! inputs always give the same dates, and nothing is read or written.
//!
//! Bounds:
//! - a rule ending on a date never yields anything after that date;
//! - an open-ended rule yields at most [`MAX_OPEN_ENDED_OCCURRENCES`] dates;
//!   the coordinator keeps a checkpoint and generates more once they run out.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::models::{DayOfMonth, RecurrenceRule, RepeatEnd, RepeatType, SeriesCheckpoint, Weekday};

/// Safety cap on the number of dates produced for a series that never ends.
pub const MAX_OPEN_ENDED_OCCURRENCES: usize = 30;

/// Expands `rule` into its occurrence dates, starting at `start`.
///
/// Returns an empty list for [`RepeatType::Once`]. Dates before `start` are
/// never produced.
pub fn expand(start: NaiveDate, rule: &RecurrenceRule) -> Vec<NaiveDate> {
    let mut series = SeriesBuffer::new(rule.ends());

    match rule.repeat_type() {
        RepeatType::Once => {}
        RepeatType::Daily => expand_daily(start, rule, &mut series),
        RepeatType::Weekly => expand_weekly(start, rule, &mut series),
        RepeatType::Monthly => expand_monthly(start, rule, &mut series),
        RepeatType::Yearly => expand_yearly(start, rule, &mut series),
    }

    series.dates
}

/// First `count` dates of the series, for display.
pub fn preview(start: NaiveDate, rule: &RecurrenceRule, count: usize) -> Vec<NaiveDate> {
    let mut dates = expand(start, rule);
    dates.truncate(count);
    dates
}

/// Dates that follow a checkpoint, strictly after its last occurrence.
pub fn resume(checkpoint: &SeriesCheckpoint) -> Vec<NaiveDate> {
    expand(checkpoint.last_occurrence, &checkpoint.rule)
        .into_iter()
        .filter(|date| *date > checkpoint.last_occurrence)
        .collect()
}

/// Collects dates while enforcing the end bound and the open-ended cap.
struct SeriesBuffer {
    ends: RepeatEnd,
    dates: Vec<NaiveDate>,
}

impl SeriesBuffer {
    fn new(ends: RepeatEnd) -> Self {
        let capacity = match ends {
            RepeatEnd::Never => MAX_OPEN_ENDED_OCCURRENCES,
            RepeatEnd::On(_) => 0,
        };
        Self {
            ends,
            dates: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn is_complete(&self) -> bool {
        matches!(self.ends, RepeatEnd::Never) && self.dates.len() >= MAX_OPEN_ENDED_OCCURRENCES
    }

    /// Takes `date` if the series still has room. Returns false once the
    /// series is complete or `date` lies past the end bound.
    fn offer(&mut self, date: NaiveDate) -> bool {
        if self.is_complete() || !self.ends.admits(date) {
            return false;
        }
        self.dates.push(date);
        true
    }
}

fn expand_daily(start: NaiveDate, rule: &RecurrenceRule, series: &mut SeriesBuffer) {
    let step = Days::new(u64::from(rule.interval()));
    let mut cursor = Some(start);

    while let Some(date) = cursor {
        if !series.offer(date) {
            break;
        }
        cursor = date.checked_add_days(step);
    }
}

fn expand_weekly(start: NaiveDate, rule: &RecurrenceRule, series: &mut SeriesBuffer) {
    if rule.days().is_empty() {
        tracing::warn!(%start, "weekly rule without weekdays, nothing to expand");
        return;
    }

    let step = Days::new(7 * u64::from(rule.interval()));
    let mut cursor = Some(week_start(start));

    while let Some(monday) = cursor {
        if !series.ends.admits(monday) {
            break;
        }

        let mut week: Vec<NaiveDate> = rule
            .days()
            .iter()
            .filter_map(|day| date_in_week(monday, *day))
            .filter(|date| *date >= start)
            .collect();
        week.sort_unstable();

        for date in week {
            if !series.offer(date) {
                return;
            }
        }
        cursor = monday.checked_add_days(step);
    }
}

fn expand_monthly(start: NaiveDate, rule: &RecurrenceRule, series: &mut SeriesBuffer) {
    let day_of_month = rule
        .day_of_month()
        .unwrap_or(DayOfMonth::Day(start.day()));
    let step = Months::new(rule.interval());
    let mut cursor = Some(start);

    while let Some(month_cursor) = cursor {
        let date = pin_day_of_month(month_cursor, day_of_month);
        // The start month may pin to a day before the series begins.
        if date >= start && !series.offer(date) {
            break;
        }
        if date < start && !series.ends.admits(date) {
            break;
        }
        cursor = date.checked_add_months(step);
    }
}

fn expand_yearly(start: NaiveDate, rule: &RecurrenceRule, series: &mut SeriesBuffer) {
    let Some(step) = rule.interval().checked_mul(12).map(Months::new) else {
        series.offer(start);
        return;
    };
    let mut cursor = Some(start);

    while let Some(date) = cursor {
        if !series.offer(date) {
            break;
        }
        cursor = date.checked_add_months(step);
    }
}

// ============================================================================
// Calendar helpers
// ============================================================================

/// Monday of the week containing `date`.
#[inline]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday();
    date - Days::new(u64::from(offset))
}

/// Date of `day` within the week that opens on `monday`.
#[inline]
pub fn date_in_week(monday: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    monday.checked_add_days(Days::new(u64::from(day.days_from_monday())))
}

/// Final calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    last_day_of_month(date).day()
}

/// Moves `date` to the rule's day within the same month, clamping days that
/// the month does not have (31 becomes 30, 29 or 28).
pub fn pin_day_of_month(date: NaiveDate, day_of_month: DayOfMonth) -> NaiveDate {
    let last = last_day_of_month(date);
    match day_of_month {
        DayOfMonth::Last => last,
        DayOfMonth::Day(day) => date.with_day(day.clamp(1, last.day())).unwrap_or(last),
    }
}
