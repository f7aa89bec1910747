//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical task record shared by state, storage and FFI layers.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`, never by list position.
//! - A stored task title is never blank.

pub mod task;
