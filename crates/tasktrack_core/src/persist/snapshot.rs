//! Versioned snapshot codec for the task list.
//!
//! # Responsibility
//! - Encode the list as a versioned JSON envelope.
//! - Detect and upgrade payloads written before versioning existed.
//!
//! # Invariants
//! - Encoded payloads always carry `SNAPSHOT_VERSION`.
//! - Decoded tasks always pass `Task::validate()`.
//! - Payloads newer than `SNAPSHOT_VERSION` are rejected, not guessed at.
//!
//! Known shapes:
//! - v0: `["Buy milk", ...]`
//! - v1: `[{"title": "Buy milk", "completed": false}, ...]`
//! - v2: `{"version": 2, "tasks": [{"id": "..", "title": "..", "completed": false}]}`

use crate::model::task::{Task, TaskValidationError};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 2;

const LEGACY_STRINGS_VERSION: u32 = 0;
const LEGACY_RECORDS_VERSION: u32 = 1;

/// Snapshot decoding failures.
#[derive(Debug)]
pub enum SnapshotError {
    /// Payload is not JSON or does not match any known shape.
    Malformed(String),
    /// Payload was written by a newer build.
    UnsupportedVersion { found: u32, latest_supported: u32 },
    /// A current-format record breaks task invariants.
    InvalidTask(TaskValidationError),
    Encode(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed task snapshot: {message}"),
            Self::UnsupportedVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "task snapshot version {found} is newer than supported {latest_supported}"
            ),
            Self::InvalidTask(err) => write!(f, "invalid task in snapshot: {err}"),
            Self::Encode(err) => write!(f, "failed to encode task snapshot: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTask(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for SnapshotError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

/// Decoded payload plus the format version it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub tasks: Vec<Task>,
    pub source_version: u32,
}

impl DecodedSnapshot {
    /// Whether the payload was upgraded from an older format.
    pub fn was_migrated(&self) -> bool {
        self.source_version < SNAPSHOT_VERSION
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[serde(default)]
    tasks: Value,
}

#[derive(Deserialize)]
struct LegacyRecord {
    title: String,
    #[serde(default)]
    completed: bool,
}

/// Encodes tasks as a current-version JSON envelope.
pub fn encode_snapshot(tasks: &[Task]) -> Result<String, SnapshotError> {
    serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        tasks,
    })
    .map_err(SnapshotError::Encode)
}

/// Decodes any known payload shape into current-format tasks.
///
/// # Errors
/// - `Malformed` for invalid JSON or unknown shapes.
/// - `UnsupportedVersion` for envelopes newer than this build.
/// - `InvalidTask` for current-format records with blank titles.
pub fn decode_snapshot(raw: &str) -> Result<DecodedSnapshot, SnapshotError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| SnapshotError::Malformed(err.to_string()))?;

    match value {
        Value::Array(items) => decode_legacy_array(items),
        Value::Object(_) => decode_envelope(value),
        other => Err(SnapshotError::Malformed(format!(
            "expected array or object at top level, got {}",
            json_kind(&other)
        ))),
    }
}

fn decode_envelope(value: Value) -> Result<DecodedSnapshot, SnapshotError> {
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|err| SnapshotError::Malformed(err.to_string()))?;

    if envelope.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: envelope.version,
            latest_supported: SNAPSHOT_VERSION,
        });
    }
    if envelope.version < SNAPSHOT_VERSION {
        // Older envelopes never existed; only bare arrays predate versioning.
        return Err(SnapshotError::Malformed(format!(
            "unknown envelope version {}",
            envelope.version
        )));
    }

    let tasks: Vec<Task> = serde_json::from_value(envelope.tasks)
        .map_err(|err| SnapshotError::Malformed(err.to_string()))?;
    for task in &tasks {
        task.validate()?;
    }

    Ok(DecodedSnapshot {
        tasks,
        source_version: SNAPSHOT_VERSION,
    })
}

fn decode_legacy_array(items: Vec<Value>) -> Result<DecodedSnapshot, SnapshotError> {
    let source_version = match items.first() {
        None | Some(Value::String(_)) => LEGACY_STRINGS_VERSION,
        Some(Value::Object(_)) => LEGACY_RECORDS_VERSION,
        Some(other) => {
            return Err(SnapshotError::Malformed(format!(
                "unexpected legacy entry of type {}",
                json_kind(other)
            )));
        }
    };

    let total = items.len();
    let mut tasks = Vec::with_capacity(total);
    for item in items {
        let (title, completed) = match (source_version, item) {
            (LEGACY_STRINGS_VERSION, Value::String(title)) => (title, false),
            (LEGACY_RECORDS_VERSION, value @ Value::Object(_)) => {
                let record: LegacyRecord = serde_json::from_value(value)
                    .map_err(|err| SnapshotError::Malformed(err.to_string()))?;
                (record.title, record.completed)
            }
            (_, other) => {
                return Err(SnapshotError::Malformed(format!(
                    "mixed legacy entries: found {} in a v{source_version} list",
                    json_kind(&other)
                )));
            }
        };

        if let Some(mut task) = Task::new(&title) {
            task.completed = completed;
            tasks.push(task);
        }
    }

    let dropped = total - tasks.len();
    if dropped > 0 {
        warn!(
            "event=snapshot_migrate module=persist status=ok source_version={source_version} dropped_blank={dropped}"
        );
    }

    Ok(DecodedSnapshot {
        tasks,
        source_version,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
