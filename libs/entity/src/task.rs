use chrono::{DateTime, Utc};

use crate::{due::Due, priority::Priority};

pub const UNNAMED_TASK: &str = "Unnamed Task";

/// A row of the task database, as the triage commands read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// `None` when the label is missing or not one of [`Priority`].
    pub priority: Option<Priority>,
    pub status: Option<String>,
    pub class: Option<String>,
    pub due: Option<Due>,
    pub actually_due: Option<Due>,
    pub done: bool,
    pub assigned_time: bool,
}

impl Task {
    /// Missing priorities are scheduled as `Low`.
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or(Priority::Low)
    }
}

/// Trims a user supplied title, rejecting blank ones.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
