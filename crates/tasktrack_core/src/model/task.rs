//! Task domain model.
//!
//! # Responsibility
//! - Define the task record and its validation rules.
//! - Normalize raw user input into a storable title.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is trimmed and non-empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// One entry of the to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable ID assigned at creation.
    pub id: TaskId,
    /// Trimmed, non-empty display title.
    pub title: String,
    /// Completion flag toggled by the user.
    #[serde(default)]
    pub completed: bool,
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title cannot be blank"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Creates an open task with a generated stable ID.
    ///
    /// Returns `None` when `title` is blank after trimming.
    pub fn new(title: &str) -> Option<Self> {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates an open task with a caller-provided stable ID.
    ///
    /// Used by snapshot decoding where identity already exists.
    pub fn with_id(id: TaskId, title: &str) -> Option<Self> {
        normalize_title(title).map(|title| Self {
            id,
            title,
            completed: false,
        })
    }

    /// Validates record-level invariants.
    ///
    /// # Errors
    /// - `BlankTitle` when the title is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        Ok(())
    }

    /// Flips the completion flag.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Trims raw input and rejects blank values.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Task, TaskValidationError};

    #[test]
    fn new_trims_title_and_starts_open() {
        let task = Task::new("  Buy milk \n").expect("non-blank title");
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
    }

    #[test]
    fn new_rejects_blank_titles() {
        assert!(Task::new("").is_none());
        assert!(Task::new("   \t").is_none());
    }

    #[test]
    fn new_assigns_distinct_ids() {
        let first = Task::new("a").unwrap();
        let second = Task::new("a").unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn validate_rejects_blank_title_set_directly() {
        let mut task = Task::new("ok").unwrap();
        task.title = "  ".to_string();
        assert_eq!(task.validate(), Err(TaskValidationError::BlankTitle));
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut task = Task::new("x").unwrap();
        task.toggle();
        assert!(task.completed);
        task.toggle();
        assert!(!task.completed);
    }

    #[test]
    fn normalize_title_keeps_inner_whitespace() {
        assert_eq!(
            normalize_title("  oat   milk ").as_deref(),
            Some("oat   milk")
        );
    }
}
