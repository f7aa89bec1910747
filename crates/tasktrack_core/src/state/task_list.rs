//! Task list state machine.
//!
//! # Responsibility
//! - Apply `TaskAction` values to `TaskListState`.
//! - Report whether a transition changed the persisted list.
//!
//! # Invariants
//! - Insertion order is display order.
//! - Blank submissions never insert or rename a task.
//! - Deleting the task under edit returns the state to `Idle`.

use crate::model::task::{normalize_title, Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Edit-mode state of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Submissions append new tasks.
    #[default]
    Idle,
    /// Submissions rename the referenced task.
    Editing(TaskId),
}

/// User-level actions accepted by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Replaces the pending input text.
    SetInput(String),
    /// Commits raw text as a new task, or as the new title while editing.
    Submit(String),
    /// Flips completion of one task.
    Toggle(TaskId),
    /// Enters edit mode for one task and mirrors its title into the input.
    BeginEdit(TaskId),
    /// Leaves edit mode without changing the list.
    CancelEdit,
    /// Removes one task.
    Delete(TaskId),
    /// Replaces the whole list, used when restoring a snapshot.
    Replace(Vec<Task>),
}

/// Result of one successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Whether the task list itself changed and must be persisted.
    pub list_changed: bool,
    /// Edit mode after the transition.
    pub edit_mode: EditMode,
}

/// Rejected transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No task with this id exists.
    TaskNotFound(TaskId),
    /// Position does not address a task.
    IndexOutOfBounds { index: usize, len: usize },
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "task index {index} out of bounds for list of {len}")
            }
        }
    }
}

impl Error for StateError {}

/// Owned state of the single task list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListState {
    tasks: Vec<Task>,
    input: String,
    edit_mode: EditMode,
}

impl TaskListState {
    /// Creates an empty, idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Pending input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Returns the stable id of the task at `index`.
    ///
    /// # Errors
    /// - `IndexOutOfBounds` when `index >= len`.
    pub fn id_at(&self, index: usize) -> Result<TaskId, StateError> {
        self.tasks
            .get(index)
            .map(|task| task.id)
            .ok_or(StateError::IndexOutOfBounds {
                index,
                len: self.tasks.len(),
            })
    }

    /// Applies one action.
    ///
    /// # Errors
    /// - `TaskNotFound` when an id-keyed action targets a missing task.
    pub fn apply(&mut self, action: TaskAction) -> Result<Transition, StateError> {
        let list_changed = match action {
            TaskAction::SetInput(text) => {
                self.input = text;
                false
            }
            TaskAction::Submit(text) => self.submit(&text)?,
            TaskAction::Toggle(id) => {
                let position = self.position_of(id)?;
                self.tasks[position].toggle();
                true
            }
            TaskAction::BeginEdit(id) => {
                let position = self.position_of(id)?;
                self.input = self.tasks[position].title.clone();
                self.edit_mode = EditMode::Editing(id);
                false
            }
            TaskAction::CancelEdit => {
                if self.edit_mode != EditMode::Idle {
                    self.edit_mode = EditMode::Idle;
                    self.input.clear();
                }
                false
            }
            TaskAction::Delete(id) => {
                let position = self.position_of(id)?;
                self.tasks.remove(position);
                if self.edit_mode == EditMode::Editing(id) {
                    self.edit_mode = EditMode::Idle;
                    self.input.clear();
                }
                true
            }
            TaskAction::Replace(tasks) => {
                self.tasks = tasks;
                self.edit_mode = EditMode::Idle;
                self.input.clear();
                true
            }
        };

        Ok(Transition {
            list_changed,
            edit_mode: self.edit_mode,
        })
    }

    fn submit(&mut self, raw: &str) -> Result<bool, StateError> {
        let Some(title) = normalize_title(raw) else {
            return Ok(false);
        };

        match self.edit_mode {
            EditMode::Idle => {
                if let Some(task) = Task::new(&title) {
                    self.tasks.push(task);
                }
            }
            EditMode::Editing(id) => {
                let position = self.position_of(id)?;
                self.tasks[position].title = title;
                self.edit_mode = EditMode::Idle;
            }
        }
        self.input.clear();
        Ok(true)
    }

    fn position_of(&self, id: TaskId) -> Result<usize, StateError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StateError::TaskNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{EditMode, StateError, TaskAction, TaskListState};
    use crate::model::task::Task;
    use uuid::Uuid;

    fn state_with(titles: &[&str]) -> TaskListState {
        let mut state = TaskListState::new();
        for title in titles {
            state
                .apply(TaskAction::Submit((*title).to_string()))
                .expect("submit should succeed");
        }
        state
    }

    fn titles(state: &TaskListState) -> Vec<&str> {
        state.tasks().iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn submit_appends_trimmed_open_task() {
        let mut state = state_with(&["first"]);
        let transition = state
            .apply(TaskAction::Submit("  second  ".to_string()))
            .unwrap();

        assert!(transition.list_changed);
        assert_eq!(titles(&state), vec!["first", "second"]);
        assert!(!state.tasks()[1].completed);
    }

    #[test]
    fn blank_submit_is_a_no_op() {
        let mut state = state_with(&["keep"]);
        state.apply(TaskAction::SetInput("   ".to_string())).unwrap();
        let before = state.clone();

        for blank in ["", "   ", "\n\t"] {
            let transition = state.apply(TaskAction::Submit(blank.to_string())).unwrap();
            assert!(!transition.list_changed);
        }
        assert_eq!(state, before);
    }

    #[test]
    fn submit_clears_pending_input() {
        let mut state = TaskListState::new();
        state.apply(TaskAction::SetInput("draft".to_string())).unwrap();
        state.apply(TaskAction::Submit("draft".to_string())).unwrap();
        assert_eq!(state.input(), "");
    }

    #[test]
    fn edit_commit_renames_and_preserves_completion() {
        let mut state = state_with(&["Buy milk"]);
        let id = state.id_at(0).unwrap();
        state.apply(TaskAction::Toggle(id)).unwrap();

        let transition = state.apply(TaskAction::BeginEdit(id)).unwrap();
        assert!(!transition.list_changed);
        assert_eq!(transition.edit_mode, EditMode::Editing(id));
        assert_eq!(state.input(), "Buy milk");

        let transition = state
            .apply(TaskAction::Submit("Buy oat milk".to_string()))
            .unwrap();
        assert!(transition.list_changed);
        assert_eq!(transition.edit_mode, EditMode::Idle);
        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.tasks()[0].id, id);
        assert_eq!(state.tasks()[0].title, "Buy oat milk");
        assert!(state.tasks()[0].completed);
    }

    #[test]
    fn blank_submit_while_editing_stays_in_edit_mode() {
        let mut state = state_with(&["a"]);
        let id = state.id_at(0).unwrap();
        state.apply(TaskAction::BeginEdit(id)).unwrap();

        state.apply(TaskAction::Submit("  ".to_string())).unwrap();
        assert_eq!(state.edit_mode(), EditMode::Editing(id));
        assert_eq!(titles(&state), vec!["a"]);
    }

    #[test]
    fn cancel_edit_returns_to_idle_and_clears_input() {
        let mut state = state_with(&["a"]);
        let id = state.id_at(0).unwrap();
        state.apply(TaskAction::BeginEdit(id)).unwrap();

        let transition = state.apply(TaskAction::CancelEdit).unwrap();
        assert!(!transition.list_changed);
        assert_eq!(state.edit_mode(), EditMode::Idle);
        assert_eq!(state.input(), "");

        state.apply(TaskAction::Submit("b".to_string())).unwrap();
        assert_eq!(titles(&state), vec!["a", "b"]);
    }

    #[test]
    fn cancel_edit_when_idle_keeps_input() {
        let mut state = TaskListState::new();
        state.apply(TaskAction::SetInput("typing".to_string())).unwrap();
        state.apply(TaskAction::CancelEdit).unwrap();
        assert_eq!(state.input(), "typing");
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let mut state = state_with(&["a", "b"]);
        let id = state.id_at(1).unwrap();
        state.apply(TaskAction::Toggle(id)).unwrap();
        assert!(state.tasks()[1].completed);
        state.apply(TaskAction::Toggle(id)).unwrap();
        assert!(!state.tasks()[1].completed);
        assert!(!state.tasks()[0].completed);
    }

    #[test]
    fn delete_shifts_later_tasks_down() {
        let mut state = state_with(&["a", "b", "c", "d"]);
        let before: Vec<_> = state.tasks().to_vec();
        let id = state.id_at(1).unwrap();

        state.apply(TaskAction::Delete(id)).unwrap();

        assert_eq!(state.tasks().len(), 3);
        assert_eq!(state.tasks()[0], before[0]);
        assert_eq!(state.tasks()[1], before[2]);
        assert_eq!(state.tasks()[2], before[3]);
    }

    #[test]
    fn deleting_task_under_edit_clears_cursor() {
        let mut state = state_with(&["a", "b"]);
        let id = state.id_at(0).unwrap();
        state.apply(TaskAction::BeginEdit(id)).unwrap();

        let transition = state.apply(TaskAction::Delete(id)).unwrap();
        assert_eq!(transition.edit_mode, EditMode::Idle);
        assert_eq!(state.input(), "");

        state.apply(TaskAction::Submit("c".to_string())).unwrap();
        assert_eq!(titles(&state), vec!["b", "c"]);
    }

    #[test]
    fn deleting_other_task_keeps_cursor_on_same_task() {
        let mut state = state_with(&["a", "b", "c"]);
        let first = state.id_at(0).unwrap();
        let last = state.id_at(2).unwrap();
        state.apply(TaskAction::BeginEdit(last)).unwrap();

        state.apply(TaskAction::Delete(first)).unwrap();
        state.apply(TaskAction::Submit("C".to_string())).unwrap();

        assert_eq!(titles(&state), vec!["b", "C"]);
    }

    #[test]
    fn unknown_id_is_rejected_without_mutation() {
        let mut state = state_with(&["a"]);
        let before = state.clone();
        let missing = Uuid::new_v4();

        for action in [
            TaskAction::Toggle(missing),
            TaskAction::BeginEdit(missing),
            TaskAction::Delete(missing),
        ] {
            let err = state.apply(action).unwrap_err();
            assert_eq!(err, StateError::TaskNotFound(missing));
        }
        assert_eq!(state, before);
    }

    #[test]
    fn id_at_rejects_out_of_range_index() {
        let state = state_with(&["a"]);
        let err = state.id_at(3).unwrap_err();
        assert_eq!(err, StateError::IndexOutOfBounds { index: 3, len: 1 });
    }

    #[test]
    fn replace_swaps_list_and_resets_edit_mode() {
        let mut state = state_with(&["old"]);
        let id = state.id_at(0).unwrap();
        state.apply(TaskAction::BeginEdit(id)).unwrap();
        assert_eq!(state.input(), "old");

        let restored = vec![Task::new("x").unwrap(), Task::new("y").unwrap()];
        let transition = state.apply(TaskAction::Replace(restored.clone())).unwrap();

        assert!(transition.list_changed);
        assert_eq!(state.edit_mode(), EditMode::Idle);
        assert_eq!(state.input(), "");
        assert_eq!(state.tasks(), restored.as_slice());
    }
}
