//! Core use-case services.
//!
//! # Responsibility
//! - Combine reducer state and persistence into caller-facing APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod task_store;
