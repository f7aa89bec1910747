//! Reducer-style task list state.
//!
//! # Responsibility
//! - Own the in-memory list, pending input and edit cursor as one value.
//! - Apply user actions as explicit, testable transitions.
//!
//! # Invariants
//! - The edit cursor is either `Idle` or points at a task present in the list.
//! - Failed transitions leave the state untouched.

pub mod task_list;
