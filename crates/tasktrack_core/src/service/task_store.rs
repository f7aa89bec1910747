//! Task list store: reducer state wired to snapshot persistence.
//!
//! # Responsibility
//! - Restore the list once at startup (hydrate).
//! - Apply user actions and persist the full list after each list change.
//!
//! # Invariants
//! - Hydrate/persist failures are logged and never surface to callers.
//! - Persistence never rolls back an in-memory mutation.
//! - An unreadable stored payload is not overwritten until the first
//!   list-changing action.

use crate::config::StoreConfig;
use crate::db::open_db;
use crate::model::task::{Task, TaskId};
use crate::persist::snapshot::{decode_snapshot, encode_snapshot};
use crate::persist::writer::SnapshotWriter;
use crate::repo::kv_store::{KeyValueStore, SqliteKeyValueStore, UnavailableKeyValueStore};
use crate::state::task_list::{EditMode, StateError, TaskAction, TaskListState, Transition};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

/// Failures while opening a store.
#[derive(Debug)]
pub enum StoreError {
    /// Snapshot writer thread could not be started.
    WriterSpawn(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriterSpawn(err) => write!(f, "failed to start snapshot writer: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WriterSpawn(err) => Some(err),
        }
    }
}

/// What startup restoration found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// Nothing stored yet; the list starts empty.
    Empty,
    /// Stored list was loaded.
    Restored {
        count: usize,
        /// Source format version when an older payload was upgraded.
        migrated_from: Option<u32>,
    },
    /// Stored value could not be read or parsed; the list starts empty.
    Failed { reason: String },
}

/// Single authoritative task list with background persistence.
pub struct TaskListStore {
    state: TaskListState,
    writer: SnapshotWriter,
}

impl TaskListStore {
    /// Restores the list from `kv` and starts the snapshot writer.
    ///
    /// # Errors
    /// - `WriterSpawn` when the writer thread cannot be created.
    pub fn open<K>(kv: K, config: &StoreConfig) -> Result<(Self, HydrateOutcome), StoreError>
    where
        K: KeyValueStore + Send + 'static,
    {
        let mut state = TaskListState::new();
        let outcome = hydrate(&kv, &config.storage_key, &mut state);

        let writer = SnapshotWriter::spawn(kv, config.storage_key.clone())
            .map_err(StoreError::WriterSpawn)?;
        let mut store = Self { state, writer };

        if !matches!(outcome, HydrateOutcome::Failed { .. }) {
            store.persist();
        }
        Ok((store, outcome))
    }

    /// Opens (or creates) a SQLite file and restores the list from it.
    ///
    /// When the file cannot be opened the store still starts, empty and
    /// in-memory only, and reports `HydrateOutcome::Failed`.
    ///
    /// # Errors
    /// - `WriterSpawn` when the writer thread cannot be created.
    pub fn open_file(
        path: impl AsRef<Path>,
        config: &StoreConfig,
    ) -> Result<(Self, HydrateOutcome), StoreError> {
        match open_db(path) {
            Ok(conn) => Self::open(SqliteKeyValueStore::new(conn), config),
            Err(err) => {
                warn!(
                    "event=hydrate module=store status=error error_code=storage_open_failed error={err}"
                );
                Self::open(UnavailableKeyValueStore::new(err.to_string()), config)
            }
        }
    }

    /// Tasks in display order.
    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    /// Pending input text.
    pub fn input(&self) -> &str {
        self.state.input()
    }

    pub fn edit_mode(&self) -> EditMode {
        self.state.edit_mode()
    }

    /// Read-only view of the whole state.
    pub fn state(&self) -> &TaskListState {
        &self.state
    }

    /// Mirrors the text field; never persisted.
    pub fn set_input(&mut self, text: impl Into<String>) {
        // SetInput never targets a task, so it cannot fail.
        let _ = self.state.apply(TaskAction::SetInput(text.into()));
    }

    /// Appends a task, or renames the task under edit.
    ///
    /// Blank input is a silent no-op.
    pub fn add(&mut self, text: &str) -> Result<Transition, StateError> {
        self.dispatch(TaskAction::Submit(text.to_string()))
    }

    pub fn toggle_completion(&mut self, id: TaskId) -> Result<Transition, StateError> {
        self.dispatch(TaskAction::Toggle(id))
    }

    /// Enters edit mode; the task's title becomes the pending input.
    pub fn begin_edit(&mut self, id: TaskId) -> Result<Transition, StateError> {
        self.dispatch(TaskAction::BeginEdit(id))
    }

    pub fn cancel_edit(&mut self) -> Transition {
        self.dispatch(TaskAction::CancelEdit)
            .unwrap_or(Transition {
                list_changed: false,
                edit_mode: self.state.edit_mode(),
            })
    }

    /// Removes a task; clears edit mode if it was the task under edit.
    pub fn delete(&mut self, id: TaskId) -> Result<Transition, StateError> {
        self.dispatch(TaskAction::Delete(id))
    }

    pub fn toggle_completion_at(&mut self, index: usize) -> Result<Transition, StateError> {
        let id = self.state.id_at(index)?;
        self.toggle_completion(id)
    }

    pub fn begin_edit_at(&mut self, index: usize) -> Result<Transition, StateError> {
        let id = self.state.id_at(index)?;
        self.begin_edit(id)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Transition, StateError> {
        let id = self.state.id_at(index)?;
        self.delete(id)
    }

    /// Blocks until all queued snapshots were handled by the writer.
    pub fn flush(&self) -> bool {
        self.writer.flush()
    }

    /// Applies any action and persists when the list changed.
    pub fn dispatch(&mut self, action: TaskAction) -> Result<Transition, StateError> {
        let transition = self.state.apply(action)?;
        if transition.list_changed {
            self.persist();
        }
        Ok(transition)
    }

    fn persist(&mut self) {
        match encode_snapshot(self.state.tasks()) {
            Ok(payload) => {
                self.writer.submit(payload);
            }
            Err(err) => error!(
                "event=persist module=store status=error error_code=snapshot_encode_failed error={err}"
            ),
        }
    }
}

fn hydrate<K: KeyValueStore>(kv: &K, key: &str, state: &mut TaskListState) -> HydrateOutcome {
    let started_at = Instant::now();

    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!(
                "event=hydrate module=store status=ok result=empty duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return HydrateOutcome::Empty;
        }
        Err(err) => {
            warn!(
                "event=hydrate module=store status=error duration_ms={} error_code=storage_read_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return HydrateOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    let decoded = match decode_snapshot(&raw) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(
                "event=hydrate module=store status=error duration_ms={} error_code=snapshot_decode_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return HydrateOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    let migrated_from = decoded.was_migrated().then_some(decoded.source_version);
    let count = decoded.tasks.len();
    // Replace never targets a task id, so it cannot fail.
    let _ = state.apply(TaskAction::Replace(decoded.tasks));

    info!(
        "event=hydrate module=store status=ok result=restored count={count} source_version={} duration_ms={}",
        migrated_from.map_or_else(|| "current".to_string(), |v| v.to_string()),
        started_at.elapsed().as_millis()
    );
    HydrateOutcome::Restored {
        count,
        migrated_from,
    }
}
