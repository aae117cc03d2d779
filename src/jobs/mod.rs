//! Job scaffolding around the engine
//!
//! The engine itself is stateless; these types carry the guarantees the
//! orchestrating system owes it:
//! - one separation/edit job at a time per accelerator (single-worker FIFO
//!   queue, no cancellation)
//! - per-session progress state behind a lock, safe for concurrent polling
//! - artifact cleanup driven by an explicit remaining-download count, never
//!   by directory heuristics

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DropforgeError, Result};

// ============================================================================
// Session status
// ============================================================================

/// Pipeline stage of a session's current job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum JobStage {
    Queued,
    Separating,
    Synthesizing,
    Exporting,
    Complete,
    Failed { message: String },
}

/// Progress snapshot for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub stage: JobStage,
    pub updated_at: DateTime<Utc>,
}

/// Mutex-guarded session → status map
///
/// Status polling and worker updates race by design; every access goes
/// through these methods, no raw map is ever exposed.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, JobStatus>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, starting in `Queued`
    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let status = JobStatus {
            stage: JobStage::Queued,
            updated_at: Utc::now(),
        };
        self.inner.lock().unwrap().insert(id, status);
        debug!("session {} created", id);
        id
    }

    /// Move a session to a new stage
    pub fn update(&self, session: Uuid, stage: JobStage) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        let status = map
            .get_mut(&session)
            .ok_or_else(|| DropforgeError::SessionNotFound {
                session_id: session.to_string(),
            })?;
        status.stage = stage;
        status.updated_at = Utc::now();
        Ok(())
    }

    /// Snapshot a session's status
    pub fn get(&self, session: Uuid) -> Result<JobStatus> {
        self.inner
            .lock()
            .unwrap()
            .get(&session)
            .cloned()
            .ok_or_else(|| DropforgeError::SessionNotFound {
                session_id: session.to_string(),
            })
    }

    /// Drop a session's state once its artifacts are gone
    pub fn remove(&self, session: Uuid) {
        self.inner.lock().unwrap().remove(&session);
    }
}

// ============================================================================
// Worker queue
// ============================================================================

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single-worker FIFO job queue
///
/// One queue per hardware accelerator serializes the heavy separation and
/// synthesis work; jobs submitted mid-run wait their turn. There is no
/// cancellation: a started job runs to completion or failure.
pub struct JobQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl JobQueue {
    /// Spawn the worker thread
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let thread_name = format!("dropforge-worker-{}", name);
        let worker = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
                debug!("worker loop finished");
            })
            .expect("failed to spawn worker thread");
        info!("job worker '{}' started", thread_name);
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Enqueue a job; it runs after everything submitted before it
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .as_ref()
            .ok_or(DropforgeError::QueueClosed)?
            .send(Box::new(job))
            .map_err(|_| DropforgeError::QueueClosed)
    }

    /// Stop accepting jobs and wait for the queue to drain
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("job worker panicked");
            }
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

// ============================================================================
// Artifact ledger
// ============================================================================

struct TrackArtifacts {
    remaining: usize,
    session: Uuid,
    paths: Vec<PathBuf>,
}

/// Reference-counted artifact cleanup
///
/// Each track registers how many artifacts a client is expected to fetch.
/// Every successful download decrements the count under the lock; the
/// track's files are deleted only when the count reaches zero. The count is
/// the sole cleanup trigger.
#[derive(Clone, Default)]
pub struct ArtifactLedger {
    inner: Arc<Mutex<HashMap<String, TrackArtifacts>>>,
    sessions: SessionStore,
}

impl ArtifactLedger {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            inner: Arc::default(),
            sessions,
        }
    }

    /// Register a track's artifacts and expected fetch count
    ///
    /// `paths` lists everything to delete on cleanup: the working directory
    /// and the original upload.
    pub fn register(&self, track_id: &str, session: Uuid, expected: usize, paths: Vec<PathBuf>) {
        let mut map = self.inner.lock().unwrap();
        map.insert(
            track_id.to_string(),
            TrackArtifacts {
                remaining: expected,
                session,
                paths,
            },
        );
        debug!("track '{}': {} artifacts registered", track_id, expected);
    }

    /// Artifacts still awaiting download for a track
    pub fn remaining(&self, track_id: &str) -> Result<usize> {
        let map = self.inner.lock().unwrap();
        map.get(track_id)
            .map(|t| t.remaining)
            .ok_or_else(|| DropforgeError::TrackNotFound {
                track_id: track_id.to_string(),
            })
    }

    /// Record one successful download; returns true when the track's files
    /// were cleaned up as a result
    pub fn mark_downloaded(&self, track_id: &str) -> Result<bool> {
        let mut map = self.inner.lock().unwrap();
        let entry = map
            .get_mut(track_id)
            .ok_or_else(|| DropforgeError::TrackNotFound {
                track_id: track_id.to_string(),
            })?;

        entry.remaining = entry.remaining.saturating_sub(1);
        if entry.remaining > 0 {
            debug!("track '{}': {} artifacts left", track_id, entry.remaining);
            return Ok(false);
        }

        let entry = map.remove(track_id).unwrap();
        drop(map);

        for path in &entry.paths {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            };
            if let Err(e) = result {
                // Cleanup is best effort once the count says go
                warn!("failed to remove {}: {}", path.display(), e);
            }
        }
        self.sessions.remove(entry.session);
        info!("track '{}' fully fetched, artifacts removed", track_id);
        Ok(true)
    }
}
