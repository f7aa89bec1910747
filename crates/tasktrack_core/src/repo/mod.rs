//! Key-value persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the two-call storage contract the store persists through.
//! - Isolate SQLite query details from state and service code.

pub mod kv_store;
