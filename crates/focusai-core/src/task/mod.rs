//! Task types shared by the task store clients and the alert engine.
//!
//! Field names follow the REST API's JSON (`_id`, `dueDate`, `createdAt`, ...),
//! so the same types are used on the wire and in memory.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

fn default_category() -> String {
    "general".into()
}

/// A to-do item as stored by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Attached by some list endpoints; not maintained locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_overdue: Option<bool>,
}

impl Task {
    /// Pending and carrying a due date -- the only tasks that can ever alert.
    pub fn is_alertable(&self) -> bool {
        !self.completed && self.due_date.is_some()
    }

    /// Apply a patch the way the store does: present fields overwrite,
    /// completion stamps `completed_at`.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) {
        if let Some(ref title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(ref description) = update.description {
            self.description = Some(description.clone());
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
            self.completed_at = completed.then_some(now);
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due) = update.due_date {
            self.due_date = Some(due);
        }
        if let Some(ref category) = update.category {
            self.category = category.clone();
        }
        self.updated_at = now;
    }
}

/// Filters for listing tasks. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl TaskQuery {
    /// Pending tasks only -- what the alert monitor asks for.
    pub fn pending() -> Self {
        Self {
            completed: Some(false),
            ..Self::default()
        }
    }

    /// Query-string parameters in the order the API documents them.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(completed) = self.completed {
            pairs.push(("completed", completed.to_string()));
        }
        if let Some(ref category) = self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", start.to_rfc3339()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", end.to_rfc3339()));
        }
        if self.overdue {
            pairs.push(("overdue", "true".to_string()));
        }
        pairs
    }

    /// Client-side evaluation of the same filter, used by in-process stores.
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if &task.category != category {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            match task.due_date {
                Some(due) if due >= start && due <= end => {}
                _ => return false,
            }
        }
        if self.overdue {
            match task.due_date {
                Some(due) if due < now && !task.completed => {}
                _ => return false,
            }
        }
        true
    }
}

/// Partial update. Only present fields are sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskUpdate {
    /// The patch the Complete action sends.
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Self::default()
        }
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Trim the title and reject it if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] for blank titles.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Materialize into a stored task with store-assigned fields.
    pub fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title.trim().to_string(),
            description: Some(
                self.description
                    .map(|d| d.trim().to_string())
                    .unwrap_or_default(),
            ),
            completed: false,
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            category: self.category.unwrap_or_else(default_category),
            completed_at: None,
            created_at: now,
            updated_at: now,
            is_overdue: None,
        }
    }
}

/// Aggregate counters returned by the statistics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub high_priority: u64,
    pub overdue: u64,
    pub due_today: u64,
}

/// Tasks grouped by due day (`YYYY-MM-DD`), as the calendar endpoint returns them.
pub type CalendarTasks = BTreeMap<String, Vec<Task>>;
