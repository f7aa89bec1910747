//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list screen operations to Dart via FRB.
//! - Own the process-wide store opened at app startup.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every list response reflects the store state after the call.
//! - Task ids cross the boundary as UUID strings.

use log::info;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tasktrack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    resolve_db_path, EditMode, HydrateOutcome, StoreConfig, TaskId, TaskListStore,
};
use uuid::Uuid;

static STORE: OnceLock<Mutex<TaskListStore>> = OnceLock::new();
// Serializes opens so only one store (and one writer) is ever created.
static OPEN_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling log files.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the rendered task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task ID in string form.
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Whether this row is the current edit target.
    pub editing: bool,
}

/// Screen-state envelope returned by every task call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Tasks in display order.
    pub items: Vec<TaskItem>,
    /// Pending input text to show in the text field.
    pub input: String,
    /// ID of the task under edit, if any.
    pub editing_id: Option<String>,
}

impl TaskListResponse {
    fn from_store(store: &TaskListStore, ok: bool, message: impl Into<String>) -> Self {
        let editing = match store.edit_mode() {
            EditMode::Idle => None,
            EditMode::Editing(id) => Some(id),
        };
        Self {
            ok,
            message: message.into(),
            items: store
                .tasks()
                .iter()
                .map(|task| TaskItem {
                    id: task.id.to_string(),
                    title: task.title.clone(),
                    completed: task.completed,
                    editing: editing == Some(task.id),
                })
                .collect(),
            input: store.input().to_string(),
            editing_id: editing.map(|id| id.to_string()),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            items: Vec::new(),
            input: String::new(),
            editing_id: None,
        }
    }
}

/// Opens the process-wide store and restores the persisted list.
///
/// # FFI contract
/// - `db_path`: optional SQLite file; falls back to `TASKTRACK_DB_PATH`, then
///   a file in the temp directory.
/// - Idempotent: later calls return the already-open store unchanged.
/// - A corrupt stored list or unusable database is reported in `message` but
///   still returns `ok`; the list then lives in memory only.
#[flutter_rust_bridge::frb(sync)]
pub fn task_store_open(db_path: Option<String>) -> TaskListResponse {
    let _open_guard = OPEN_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    if let Some(store) = STORE.get() {
        return match lock(store) {
            Ok(guard) => TaskListResponse::from_store(&guard, true, "Store already open."),
            Err(message) => TaskListResponse::failure(message),
        };
    }

    let path = resolve_db_path(db_path.as_deref());
    let (store, outcome) = match TaskListStore::open_file(&path, &StoreConfig::default()) {
        Ok(opened) => opened,
        Err(err) => return TaskListResponse::failure(format!("task_store_open failed: {err}")),
    };

    let message = match outcome {
        HydrateOutcome::Empty => "No saved tasks.".to_string(),
        HydrateOutcome::Restored {
            count,
            migrated_from: None,
        } => format!("Restored {count} task(s)."),
        HydrateOutcome::Restored {
            count,
            migrated_from: Some(version),
        } => format!("Restored {count} task(s) from format v{version}."),
        HydrateOutcome::Failed { reason } => format!("Saved tasks could not be loaded: {reason}"),
    };

    info!(
        "event=ffi_store_open module=ffi status=ok task_count={}",
        store.tasks().len()
    );
    if STORE.set(Mutex::new(store)).is_err() {
        return TaskListResponse::failure("task store was opened concurrently");
    }
    with_store(move |_| Ok(message))
}

/// Returns the current list without changing it.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    with_store(|_| Ok(String::new()))
}

/// Mirrors the text field into the store.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_input(text: String) -> TaskListResponse {
    with_store(|store| {
        store.set_input(text);
        Ok(String::new())
    })
}

/// Adds a task, or commits the edit when a task is under edit.
///
/// Blank input is accepted as a no-op with `ok = true`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String) -> TaskListResponse {
    with_store(|store| {
        let transition = store.add(&text).map_err(|err| err.to_string())?;
        Ok(if transition.list_changed {
            "Task saved.".to_string()
        } else {
            "Nothing to add.".to_string()
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> TaskListResponse {
    with_store(|store| {
        let id = parse_task_id(&id)?;
        store.toggle_completion(id).map_err(|err| err.to_string())?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_begin_edit(id: String) -> TaskListResponse {
    with_store(|store| {
        let id = parse_task_id(&id)?;
        store.begin_edit(id).map_err(|err| err.to_string())?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_cancel_edit() -> TaskListResponse {
    with_store(|store| {
        store.cancel_edit();
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskListResponse {
    with_store(|store| {
        let id = parse_task_id(&id)?;
        store.delete(id).map_err(|err| err.to_string())?;
        Ok("Task deleted.".to_string())
    })
}

/// Blocks until queued snapshots are written; call before app suspension.
#[flutter_rust_bridge::frb(sync)]
pub fn task_flush() -> TaskListResponse {
    with_store(|store| {
        if store.flush() {
            Ok(String::new())
        } else {
            Err("snapshot writer is not running".to_string())
        }
    })
}

fn with_store(f: impl FnOnce(&mut TaskListStore) -> Result<String, String>) -> TaskListResponse {
    let Some(store) = STORE.get() else {
        return TaskListResponse::failure("task store is not open; call task_store_open first");
    };
    let mut guard = match lock(store) {
        Ok(guard) => guard,
        Err(message) => return TaskListResponse::failure(message),
    };
    match f(&mut guard) {
        Ok(message) => TaskListResponse::from_store(&guard, true, message),
        Err(message) => TaskListResponse::from_store(&guard, false, message),
    }
}

fn lock(store: &Mutex<TaskListStore>) -> Result<MutexGuard<'_, TaskListStore>, String> {
    store
        .lock()
        .map_err(|_| "task store lock poisoned".to_string())
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{raw}`"))
}
