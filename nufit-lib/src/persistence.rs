//src/persistence.rs
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::db::DbError;
use crate::models::{AppState, UserProfile};

/// Blob key holding the serialized [`AppState`].
pub const STATE_KEY: &str = "state";
/// Blob key holding the serialized [`UserProfile`].
pub const PROFILE_KEY: &str = "profile";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Blob store error: {0}")]
    Store(#[from] DbError),
    #[error("Blob store unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to serialize '{key}' blob: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to start save worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Save worker has stopped")]
    WorkerStopped,
}

/// String-keyed storage for opaque serialized blobs.
pub trait BlobStore {
    /// Returns the blob stored under `key`, `None` if there is none.
    /// # Errors
    /// Returns `PersistenceError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Stores `blob` under `key`, replacing any previous value.
    /// # Errors
    /// Returns `PersistenceError` if the backing store cannot be written.
    fn set(&self, key: &str, blob: &str) -> Result<(), PersistenceError>;
}

/// In-process blob store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob, e.g. to simulate data left by a previous run.
    #[must_use]
    pub fn with_blob(self, key: &str, blob: &str) -> Self {
        self.lock().insert(key.to_string(), blob.to_string());
        self
    }

    pub fn blob(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.blob(key))
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        self.lock().insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Reads and decodes the blob under `key`.
///
/// Unreadable or malformed blobs are logged and reported as absent, so the
/// caller falls back to its defaults.
pub fn load_blob<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: BlobStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "no stored blob, starting fresh");
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "could not read stored blob, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored blob is malformed and was discarded, using defaults");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries per save, at least one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(50),
        }
    }
}

/// Outcome of background saves so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveStatus {
    pub completed: u64,
    pub failed: u64,
    /// Error of the latest save per blob key. A key's entry is only cleared
    /// by a later successful save of that same key.
    pub errors: BTreeMap<String, String>,
}

impl SaveStatus {
    /// Whether the latest save of any blob failed.
    pub fn last_save_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }
}

enum SaveJob {
    State(Arc<AppState>),
    Profile(UserProfile),
    Flush(Sender<()>),
}

/// Background writer thread that owns the blob store.
///
/// Submitting a save never blocks the caller. Jobs are written in submission
/// order. Dropping the worker drains the queue and joins the thread.
pub struct SaveWorker {
    sender: Option<Sender<SaveJob>>,
    handle: Option<JoinHandle<()>>,
    status: Arc<Mutex<SaveStatus>>,
}

impl SaveWorker {
    /// Moves `store` onto a new writer thread.
    /// # Errors
    /// Returns `PersistenceError::Spawn` if the thread cannot be created.
    pub fn spawn<S>(store: S, policy: RetryPolicy) -> Result<Self, PersistenceError>
    where
        S: BlobStore + Send + 'static,
    {
        let (sender, jobs) = mpsc::channel();
        let status = Arc::new(Mutex::new(SaveStatus::default()));
        let worker_status = Arc::clone(&status);
        let handle = thread::Builder::new()
            .name("nufit-save".to_string())
            .spawn(move || run(&store, &jobs, &worker_status, policy))
            .map_err(PersistenceError::Spawn)?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            status,
        })
    }

    pub fn submit_state(&self, state: Arc<AppState>) {
        self.submit(SaveJob::State(state), STATE_KEY);
    }

    pub fn submit_profile(&self, profile: UserProfile) {
        self.submit(SaveJob::Profile(profile), PROFILE_KEY);
    }

    fn submit(&self, job: SaveJob, key: &'static str) {
        let sent = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(job).is_ok());
        if !sent {
            error!(key, "save worker is gone, change will not be persisted");
            record(&self.status, key, Err(PersistenceError::WorkerStopped));
        }
    }

    /// Blocks until every save submitted before this call has been attempted.
    /// # Errors
    /// Returns `PersistenceError::WorkerStopped` if the writer thread is gone.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let sender = self.sender.as_ref().ok_or(PersistenceError::WorkerStopped)?;
        let (ack, done) = mpsc::channel();
        sender
            .send(SaveJob::Flush(ack))
            .map_err(|_| PersistenceError::WorkerStopped)?;
        done.recv().map_err(|_| PersistenceError::WorkerStopped)
    }

    pub fn status(&self) -> SaveStatus {
        lock_status(&self.status).clone()
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is drained.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("save worker panicked");
            }
        }
    }
}

fn run<S: BlobStore>(
    store: &S,
    jobs: &Receiver<SaveJob>,
    status: &Mutex<SaveStatus>,
    policy: RetryPolicy,
) {
    for job in jobs {
        let (key, encoded) = match job {
            SaveJob::Flush(ack) => {
                ack.send(()).ok();
                continue;
            }
            SaveJob::State(state) => (STATE_KEY, serde_json::to_string(state.as_ref())),
            SaveJob::Profile(profile) => (PROFILE_KEY, serde_json::to_string(&profile)),
        };
        let outcome = encoded
            .map_err(|source| PersistenceError::Serialize { key, source })
            .and_then(|blob| write_with_retry(store, key, &blob, policy));
        record(status, key, outcome);
    }
    debug!("save worker stopped");
}

fn write_with_retry<S: BlobStore + ?Sized>(
    store: &S,
    key: &str,
    blob: &str,
    policy: RetryPolicy,
) -> Result<(), PersistenceError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.set(key, blob) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!(key, attempt, error = %e, "save failed, retrying");
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn record(status: &Mutex<SaveStatus>, key: &str, outcome: Result<(), PersistenceError>) {
    let mut status = lock_status(status);
    match outcome {
        Ok(()) => {
            debug!(key, "blob saved");
            status.completed += 1;
            status.errors.remove(key);
        }
        Err(e) => {
            error!(key, error = %e, "giving up on save, change is only held in memory");
            status.failed += 1;
            status.errors.insert(key.to_string(), e.to_string());
        }
    }
}

fn lock_status(status: &Mutex<SaveStatus>) -> std::sync::MutexGuard<'_, SaveStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` writes, then delegates to a memory store.
    struct FlakyStore {
        failures: u32,
        calls: Arc<AtomicU32>,
        inner: MemoryBlobStore,
    }

    impl BlobStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(PersistenceError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, blob)
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn retries_until_write_succeeds() {
        let inner = MemoryBlobStore::new();
        let calls = Arc::new(AtomicU32::new(0));
        let store = FlakyStore {
            failures: 2,
            calls: Arc::clone(&calls),
            inner: inner.clone(),
        };
        let worker = SaveWorker::spawn(store, fast_policy(3)).unwrap();
        worker.submit_state(Arc::new(AppState::default()));
        worker.flush().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(inner.blob(STATE_KEY).is_some());
        let status = worker.status();
        assert_eq!(status.completed, 1);
        assert!(!status.last_save_failed());
    }

    #[test]
    fn reports_failure_after_last_attempt() {
        let inner = MemoryBlobStore::new();
        let store = FlakyStore {
            failures: u32::MAX,
            calls: Arc::new(AtomicU32::new(0)),
            inner: inner.clone(),
        };
        let worker = SaveWorker::spawn(store, fast_policy(2)).unwrap();
        worker.submit_state(Arc::new(AppState::default()));
        worker.flush().unwrap();

        let status = worker.status();
        assert_eq!(status.failed, 1);
        assert_eq!(status.completed, 0);
        assert!(status
            .error_for(STATE_KEY)
            .is_some_and(|e| e.contains("disk full")));
        assert!(inner.blob(STATE_KEY).is_none());
    }

    /// Rejects every write of one key.
    struct BrokenKeyStore {
        broken: &'static str,
        inner: MemoryBlobStore,
    }

    impl BlobStore for BrokenKeyStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
            if key == self.broken {
                return Err(PersistenceError::Unavailable("read-only".to_string()));
            }
            self.inner.set(key, blob)
        }
    }

    #[test]
    fn other_key_success_keeps_failure() {
        let inner = MemoryBlobStore::new();
        let store = BrokenKeyStore {
            broken: PROFILE_KEY,
            inner: inner.clone(),
        };
        let worker = SaveWorker::spawn(store, fast_policy(2)).unwrap();
        worker.submit_profile(UserProfile {
            name: "Kim".to_string(),
            current_weight: 60.0,
            height: 165.0,
            goal_weight: 58.0,
            allergies: vec![],
        });
        worker.submit_state(Arc::new(AppState::default()));
        worker.flush().unwrap();

        let status = worker.status();
        assert_eq!(status.completed, 1);
        assert_eq!(status.failed, 1);
        assert!(status.last_save_failed());
        assert!(status.error_for(PROFILE_KEY).is_some_and(|e| e.contains("read-only")));
        assert_eq!(status.error_for(STATE_KEY), None);
        assert!(inner.blob(PROFILE_KEY).is_none());
    }

    #[test]
    fn drop_drains_queued_saves() {
        let store = MemoryBlobStore::new();
        {
            let worker = SaveWorker::spawn(store.clone(), RetryPolicy::default()).unwrap();
            worker.submit_profile(UserProfile {
                name: "Sam".to_string(),
                current_weight: 70.0,
                height: 175.0,
                goal_weight: 68.0,
                allergies: vec![],
            });
        }
        assert!(store.blob(PROFILE_KEY).is_some_and(|b| b.contains("\"Sam\"")));
    }

    #[test]
    fn malformed_blob_loads_as_absent() {
        let store = MemoryBlobStore::new().with_blob(STATE_KEY, "{not json");
        assert!(load_blob::<AppState, _>(&store, STATE_KEY).is_none());
        assert!(load_blob::<UserProfile, _>(&store, PROFILE_KEY).is_none());
    }
}
