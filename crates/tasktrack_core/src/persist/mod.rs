//! Task list persistence.
//!
//! # Responsibility
//! - Encode/decode the persisted list payload, including legacy shapes.
//! - Serialize snapshot writes through a single background writer.
//!
//! # See also
//! - `repo::kv_store` for the storage contract.

pub mod snapshot;
pub mod writer;
