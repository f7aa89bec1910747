//! Store configuration and storage path resolution.
//!
//! # Invariants
//! - The storage key is fixed for the lifetime of a store.
//! - Path resolution order: explicit path, `TASKTRACK_DB_PATH`, temp dir.

use std::path::PathBuf;

/// Key under which the task list snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";
/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "TASKTRACK_DB_PATH";

const DEFAULT_DB_FILE_NAME: &str = "tasktrack.sqlite3";

/// Options for opening a `TaskListStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Resolves the SQLite file used for task storage.
///
/// Blank explicit paths and blank env values are ignored.
pub fn resolve_db_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit.map(str::trim).filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path, StoreConfig, DEFAULT_STORAGE_KEY};
    use std::path::PathBuf;

    #[test]
    fn default_config_uses_fixed_key() {
        assert_eq!(StoreConfig::default().storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            resolve_db_path(Some(" /data/tasks.db ")),
            PathBuf::from("/data/tasks.db")
        );
    }

    #[test]
    fn blank_explicit_path_falls_through() {
        let resolved = resolve_db_path(Some("   "));
        assert!(!resolved.as_os_str().is_empty());
    }
}
