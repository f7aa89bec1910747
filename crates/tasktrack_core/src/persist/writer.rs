//! Single-writer background persistence.
//!
//! # Responsibility
//! - Own the key-value store on one dedicated thread.
//! - Accept snapshot payloads without blocking the caller.
//!
//! # Invariants
//! - Payloads are written in submission order; the last submitted payload is
//!   the one left in storage once the queue drains.
//! - Payloads queued behind a newer one are skipped (coalesced).
//! - A failed write is logged and never retried.

use crate::repo::kv_store::KeyValueStore;
use log::{debug, error, info};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WRITER_THREAD_NAME: &str = "tasktrack-snapshot-writer";

enum WriterCommand {
    Write { revision: u64, payload: String },
    Flush(Sender<()>),
}

/// Handle to the background snapshot writer.
///
/// Dropping the handle closes the queue, waits for the final payload to be
/// written and joins the thread.
pub struct SnapshotWriter {
    sender: Option<Sender<WriterCommand>>,
    handle: Option<JoinHandle<()>>,
    next_revision: u64,
}

impl SnapshotWriter {
    /// Spawns the writer thread that persists payloads under `key`.
    ///
    /// # Errors
    /// - Returns an error when the OS refuses to spawn the thread.
    pub fn spawn<K>(store: K, key: impl Into<String>) -> io::Result<Self>
    where
        K: KeyValueStore + Send + 'static,
    {
        let key = key.into();
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(store, key, receiver))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            next_revision: 1,
        })
    }

    /// Queues a payload and returns immediately.
    ///
    /// Returns the revision assigned to the payload.
    pub fn submit(&mut self, payload: String) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;

        let sent = self
            .sender
            .as_ref()
            .map(|sender| sender.send(WriterCommand::Write { revision, payload }).is_ok())
            .unwrap_or(false);
        if !sent {
            error!(
                "event=snapshot_submit module=persist status=error revision={revision} error_code=writer_gone"
            );
        }
        revision
    }

    /// Blocks until every payload submitted before this call was handled.
    ///
    /// Returns `false` when the writer thread is no longer running.
    pub fn flush(&self) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(WriterCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=snapshot_writer_stop module=persist status=error error_code=writer_panicked");
            }
        }
    }
}

fn run_writer<K: KeyValueStore>(store: K, key: String, receiver: Receiver<WriterCommand>) {
    info!("event=snapshot_writer_start module=persist status=ok");

    while let Ok(first) = receiver.recv() {
        let mut latest: Option<(u64, String)> = None;
        let mut acks = Vec::new();
        let mut coalesced = 0_u32;

        for command in std::iter::once(first).chain(receiver.try_iter()) {
            match command {
                WriterCommand::Write { revision, payload } => {
                    if latest.replace((revision, payload)).is_some() {
                        coalesced += 1;
                    }
                }
                WriterCommand::Flush(ack) => acks.push(ack),
            }
        }

        if let Some((revision, payload)) = latest {
            write_snapshot(&store, &key, revision, &payload, coalesced);
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }

    info!("event=snapshot_writer_stop module=persist status=ok");
}

fn write_snapshot<K: KeyValueStore>(
    store: &K,
    key: &str,
    revision: u64,
    payload: &str,
    coalesced: u32,
) {
    let started_at = Instant::now();
    match store.set(key, payload) {
        Ok(()) => debug!(
            "event=snapshot_write module=persist status=ok revision={revision} coalesced={coalesced} bytes={} duration_ms={}",
            payload.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=snapshot_write module=persist status=error revision={revision} duration_ms={} error_code=storage_write_failed error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::SnapshotWriter;
    use crate::repo::kv_store::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FailingStore {
        attempts: Arc<AtomicUsize>,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable("disk full".to_string()))
        }
    }

    #[test]
    fn last_submitted_payload_wins() {
        let store = MemoryKeyValueStore::new();
        let mut writer = SnapshotWriter::spawn(store.clone(), "tasks").unwrap();

        for revision in 0..200 {
            writer.submit(format!("payload-{revision}"));
        }
        assert!(writer.flush());

        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("payload-199"));
    }

    #[test]
    fn submit_assigns_increasing_revisions() {
        let mut writer = SnapshotWriter::spawn(MemoryKeyValueStore::new(), "tasks").unwrap();
        let first = writer.submit("a".to_string());
        let second = writer.submit("b".to_string());
        assert!(second > first);
    }

    #[test]
    fn drop_writes_pending_payload() {
        let store = MemoryKeyValueStore::new();
        {
            let mut writer = SnapshotWriter::spawn(store.clone(), "tasks").unwrap();
            writer.submit("final".to_string());
        }
        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("final"));
    }

    #[test]
    fn failed_write_is_not_retried_and_writer_survives() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut writer = SnapshotWriter::spawn(
            FailingStore {
                attempts: Arc::clone(&attempts),
            },
            "tasks",
        )
        .unwrap();

        writer.submit("one".to_string());
        assert!(writer.flush());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        writer.submit("two".to_string());
        assert!(writer.flush());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn flush_without_writes_returns_true() {
        let writer = SnapshotWriter::spawn(MemoryKeyValueStore::new(), "tasks").unwrap();
        assert!(writer.flush());
    }
}
