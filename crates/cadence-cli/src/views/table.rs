use cadence_core::models::Task;
use cadence_core::notifications::Notification;
use chrono::{Local, NaiveDate};
use chrono_humanize::{Accuracy, HumanTime, Tense};
use comfy_table::{Attribute, Cell, Color, Row, Table};
use uuid::Uuid;

use crate::commands::recurrence::describe;
use crate::util::short_id;

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: Uuid,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub reminder: Option<String>,
    pub list: Option<String>,
    pub repeats: String,
    pub is_occurrence: bool,
    pub completed: bool,
}

impl From<&Task> for ViewTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            date: task.date,
            reminder: task.reminder.clone(),
            list: task.list.clone(),
            repeats: describe(&task.repeat),
            is_occurrence: task.is_occurrence(),
            completed: task.completed,
        }
    }
}

/// "today", "in 3 days", "2 weeks ago"
pub fn relative_day(date: NaiveDate, today: NaiveDate) -> String {
    let days = date.signed_duration_since(today);
    match days.num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        n if n > 0 => HumanTime::from(days).to_text_en(Accuracy::Rough, Tense::Future),
        _ => HumanTime::from(-days).to_text_en(Accuracy::Rough, Tense::Past),
    }
}

pub fn display_tasks(tasks: &[ViewTask]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let today = Local::now().date_naive();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Date", "Reminder", "List", "Repeats"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut display_name = String::new();
        if task.is_occurrence {
            display_name.push_str("  ↻ ");
        }
        display_name.push_str(&task.name);

        let mut name_cell = Cell::new(display_name);
        if task.completed {
            name_cell = name_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        } else if !task.is_occurrence && task.repeats != "-" {
            name_cell = name_cell.add_attribute(Attribute::Bold);
        }
        row.add_cell(name_cell);

        let date_cell = match task.date {
            Some(date) => {
                let text = format!("{} ({})", date, relative_day(date, today));
                if task.completed {
                    Cell::new(text)
                } else if date < today {
                    Cell::new(text).fg(Color::Red)
                } else if date == today {
                    Cell::new(text).fg(Color::Yellow)
                } else {
                    Cell::new(text)
                }
            }
            None => Cell::new("None"),
        };
        row.add_cell(date_cell);

        row.add_cell(Cell::new(task.reminder.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(task.list.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(&task.repeats));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_dates(dates: &[NaiveDate], today: NaiveDate) {
    if dates.is_empty() {
        println!("No upcoming dates.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Weekday", "When"]);
    for (i, date) in dates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date.to_string()),
            Cell::new(date.format("%A").to_string()),
            Cell::new(relative_day(*date, today)),
        ]);
    }

    println!("{table}");
}

pub fn display_reminders(reminders: &[Notification]) {
    if reminders.is_empty() {
        println!("No reminders scheduled.");
        return;
    }

    let now = Local::now().naive_local();
    let mut table = Table::new();
    table.set_header(vec!["Task", "Series", "Fires", "Message"]);
    for reminder in reminders {
        let fires = Cell::new(reminder.fire_at.format("%Y-%m-%d %H:%M").to_string());
        let fires = if reminder.fire_at <= now {
            fires.fg(Color::Yellow)
        } else {
            fires
        };
        table.add_row(vec![
            Cell::new(short_id(&reminder.id)),
            Cell::new(short_id(&reminder.tag)),
            fires,
            Cell::new(&reminder.message),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_relative_day_labels() {
        let today = date(2024, 3, 1);
        assert_eq!(relative_day(today, today), "today");
        assert_eq!(relative_day(date(2024, 3, 2), today), "tomorrow");
        assert_eq!(relative_day(date(2024, 2, 29), today), "yesterday");
        assert!(relative_day(date(2024, 3, 11), today).starts_with("in "));
        assert!(relative_day(date(2024, 2, 1), today).ends_with(" ago"));
    }
}
