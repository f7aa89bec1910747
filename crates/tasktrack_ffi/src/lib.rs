//! Flutter-facing bindings for TaskTrack core.

pub mod api;
