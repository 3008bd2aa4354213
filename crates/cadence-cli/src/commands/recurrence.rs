use anyhow::{anyhow, Result};
use cadence_core::models::{RecurrenceRule, RecurrenceRuleBuilder, RepeatType};
use chrono::NaiveDate;

use crate::cli::RecurrenceArgs;
use crate::parser::{parse_date, parse_end};

/// Builds a new rule from command-line options.
///
/// Without `--every` the task is one-off, anchored on `anchor`.
pub fn rule_from_args(args: &RecurrenceArgs, anchor: NaiveDate) -> Result<RecurrenceRule> {
    let Some(repeat_type) = args.every else {
        if args.is_set() {
            return Err(anyhow!("--every is required to describe a repeating rule"));
        }
        return Ok(RecurrenceRule::once(anchor));
    };
    apply_args(RecurrenceRule::builder(repeat_type, anchor), args)
}

/// Rebuilds `existing` with the options that were given; untouched options keep
/// their current value. Returns `existing` unchanged when no option was given.
pub fn rule_with_changes(
    existing: &RecurrenceRule,
    args: &RecurrenceArgs,
    anchor: NaiveDate,
) -> Result<RecurrenceRule> {
    if !args.is_set() {
        return Ok(existing.clone());
    }

    let mut builder = existing.to_builder();
    if !existing.is_repeating() {
        builder = builder.starts(anchor);
    }
    if let Some(repeat_type) = args.every {
        builder = builder.repeat_type(repeat_type);
    } else if !existing.is_repeating() {
        return Err(anyhow!("--every is required to make a one-off task repeat"));
    }
    apply_args(builder, args)
}

fn apply_args(mut builder: RecurrenceRuleBuilder, args: &RecurrenceArgs) -> Result<RecurrenceRule> {
    if let Some(interval) = args.interval {
        builder = builder.every(interval);
    }
    if !args.on.is_empty() {
        builder = builder.days(args.on.iter().copied());
    }
    if let Some(day_of_month) = args.day_of_month {
        builder = builder.day_of_month(day_of_month);
    }
    if let Some(starts) = &args.starts {
        builder = builder.starts(parse_date(starts)?);
    }
    if let Some(ends) = &args.ends {
        builder = builder.ends(parse_end(ends)?);
    }
    Ok(builder.build()?)
}

/// Short label for tables.
pub fn describe(rule: &RecurrenceRule) -> String {
    match rule.repeat_type() {
        RepeatType::Once => "-".to_string(),
        _ => rule.to_string(),
    }
}
