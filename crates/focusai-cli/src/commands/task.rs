//! Task management commands for CLI.

use chrono::{DateTime, Datelike, Duration, Utc};
use clap::Subcommand;
use focusai_core::{NewTask, Priority, Task, TaskQuery, TaskStore, TaskUpdate};

use super::{effective_config, http_store, print_json, runtime, CommandResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Filter by completion state
        #[arg(long)]
        completed: Option<bool>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Filter by priority (low, medium, high)
        #[arg(long)]
        priority: Option<Priority>,
        /// Only pending tasks past their due date
        #[arg(long)]
        overdue: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Priority (low, medium, high)
        #[arg(long)]
        priority: Option<Priority>,
        /// Due time: RFC 3339 timestamp or `+MINUTES` from now
        #[arg(long)]
        due: Option<String>,
        /// Category (default: general)
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark a task complete
    Complete {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Aggregate counters
    Stats,
    /// Pending tasks due within seven days
    Upcoming,
    /// Tasks grouped by due day for one month
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        /// Month, 1-12
        #[arg(long)]
        month: Option<u32>,
    },
}

pub fn run(action: TaskAction) -> CommandResult {
    let config = effective_config();
    let store = http_store(&config)?;
    let rt = runtime()?;

    match action {
        TaskAction::List {
            completed,
            category,
            priority,
            overdue,
            json,
        } => {
            let query = TaskQuery {
                completed,
                category,
                priority,
                overdue,
                ..TaskQuery::default()
            };
            let tasks = rt.block_on(store.get_tasks(&query))?;
            if json {
                print_json(&tasks)?;
            } else {
                print_table(&tasks);
            }
        }
        TaskAction::Create {
            title,
            description,
            priority,
            due,
            category,
        } => {
            let due_date = due.as_deref().map(|d| parse_due(d, Utc::now())).transpose()?;
            let new_task = NewTask {
                title,
                description,
                priority,
                due_date,
                category,
            };
            let task = rt.block_on(store.create_task(&new_task))?;
            println!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::Complete { id } => {
            let task = rt.block_on(store.update_task(&id, &TaskUpdate::complete()))?;
            println!("Task completed: {}", task.title);
        }
        TaskAction::Delete { id } => {
            rt.block_on(store.delete_task(&id))?;
            println!("Task deleted: {id}");
        }
        TaskAction::Stats => {
            let stats = rt.block_on(store.stats())?;
            print_json(&stats)?;
        }
        TaskAction::Upcoming => {
            let tasks = rt.block_on(store.upcoming())?;
            print_table(&tasks);
        }
        TaskAction::Calendar { year, month } => {
            let month = month.map(calendar_month).transpose()?;
            let days = rt.block_on(store.calendar(year, month))?;
            print_json(&days)?;
        }
    }
    Ok(())
}

/// `+MINUTES` relative to `now`, or an absolute RFC 3339 timestamp.
pub fn parse_due(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    if let Some(minutes) = input.strip_prefix('+') {
        let minutes: i64 = minutes
            .parse()
            .map_err(|_| format!("invalid relative due time '{input}', expected +MINUTES"))?;
        return Duration::try_minutes(minutes)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| format!("relative due time '{input}' is out of range"));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid due time '{input}': {e}"))
}

/// The API counts months from zero.
fn calendar_month(month: u32) -> Result<u32, String> {
    if (1..=12).contains(&month) {
        Ok(month - 1)
    } else {
        Err(format!("month must be 1-12, got {month}"))
    }
}

fn print_table(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    let now = Utc::now();
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let due = match task.due_date {
            Some(due) if due.year() == now.year() => due.format("%b %d %H:%M").to_string(),
            Some(due) => due.format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        };
        println!(
            "[{mark}] {:<26} {:<6} {:<12} {:<12} {}",
            task.id,
            task.priority.as_str(),
            task.category,
            due,
            task.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_due_adds_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        assert_eq!(parse_due("+12", now).unwrap(), now + Duration::minutes(12));
        assert!(parse_due("+soon", now).is_err());
    }

    #[test]
    fn relative_due_out_of_range_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        let err = parse_due("+9999999999999999", now).unwrap_err();
        assert!(err.contains("out of range"));
        assert!(parse_due("+-9999999999999999", now).is_err());
        assert!(parse_due("+-30", now).is_ok());
    }

    #[test]
    fn absolute_due_is_normalized_to_utc() {
        let now = Utc::now();
        let due = parse_due("2024-06-15T11:04:00+02:00", now).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 6, 15, 9, 4, 0).unwrap());
    }

    #[test]
    fn calendar_month_is_zero_based_on_the_wire() {
        assert_eq!(calendar_month(1), Ok(0));
        assert_eq!(calendar_month(12), Ok(11));
        assert!(calendar_month(13).is_err());
    }
}
