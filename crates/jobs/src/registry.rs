//! In-memory job registry.
//!
//! The registry is a sharded [`DashMap`] of `Arc<JobEntry>`. Each entry
//! guards its mutable state with its own lock; the map guard is never
//! held across an await or while an entry lock is taken by a caller.
//!
//! Every state-changing method on [`JobEntry`] is a no-op once the job
//! is terminal, so a late writer (a runner finishing after a user cancel,
//! say) can never overwrite the final status or result.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use dashmap::DashMap;
use mediagen_core::job::{JobResult, JobStatus, JobType, MSG_CANCELLED_BY_USER};
use mediagen_core::types::Timestamp;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    progress: f64,
    message: String,
    completed_at: Option<Timestamp>,
    result: Option<JobResult>,
    success_count: u32,
    failed_count: u32,
}

/// One job record. Owned by the registry, shared with its runner.
#[derive(Debug)]
pub struct JobEntry {
    id: String,
    job_type: JobType,
    created_at: Timestamp,
    cancel: CancellationToken,
    state: RwLock<JobState>,
}

/// Point-in-time copy of a job record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub result: Option<JobResult>,
    pub success_count: u32,
    pub failed_count: u32,
}

impl JobEntry {
    fn new(id: String, job_type: JobType) -> Self {
        Self {
            id,
            job_type,
            created_at: Utc::now(),
            cancel: CancellationToken::new(),
            state: RwLock::new(JobState {
                status: JobStatus::Queued,
                progress: 0.0,
                message: "Queued".to_string(),
                completed_at: None,
                result: None,
                success_count: 0,
                failed_count: 0,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // A panic while holding the lock cannot leave `JobState` half-updated
    // in a way readers care about, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, JobState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, JobState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> JobStatus {
        self.read().status
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.read();
        JobSnapshot {
            id: self.id.clone(),
            job_type: self.job_type,
            status: state.status,
            progress: state.progress,
            message: state.message.clone(),
            created_at: self.created_at,
            completed_at: state.completed_at,
            result: state.result.clone(),
            success_count: state.success_count,
            failed_count: state.failed_count,
        }
    }

    /// Claim the job for execution: `Queued -> Running`.
    ///
    /// Returns `false` if the job is no longer queued (it was cancelled
    /// before its routine got scheduled).
    pub fn start(&self, message: impl Into<String>) -> bool {
        let mut state = self.write();
        if state.status != JobStatus::Queued {
            return false;
        }
        state.status = JobStatus::Running;
        state.message = message.into();
        true
    }

    /// Update progress and message of a running job. Progress never moves
    /// backwards.
    pub fn set_progress(&self, progress: f64, message: impl Into<String>) {
        let mut state = self.write();
        if state.status != JobStatus::Running {
            return;
        }
        state.progress = progress.clamp(state.progress, 100.0);
        state.message = message.into();
    }

    pub fn record_success(&self) {
        let mut state = self.write();
        if !state.status.is_terminal() {
            state.success_count += 1;
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.write();
        if !state.status.is_terminal() {
            state.failed_count += 1;
        }
    }

    /// Finish as `Completed` with progress 100.
    pub fn complete(&self, result: JobResult, message: impl Into<String>) -> bool {
        let mut state = self.write();
        if state.status.is_terminal() {
            return false;
        }
        state.progress = 100.0;
        Self::finish(&mut state, JobStatus::Completed, message.into(), Some(result));
        true
    }

    /// Finish as `Failed`.
    pub fn fail(&self, message: impl Into<String>, result: Option<JobResult>) -> bool {
        let mut state = self.write();
        if state.status.is_terminal() {
            return false;
        }
        Self::finish(&mut state, JobStatus::Failed, message.into(), result);
        true
    }

    /// Force `Cancelled` from `Queued` or `Running` and signal the token.
    pub fn mark_cancelled(&self, message: impl Into<String>) -> bool {
        let mut state = self.write();
        if !state.status.is_cancellable() {
            return false;
        }
        Self::finish(&mut state, JobStatus::Cancelled, message.into(), None);
        drop(state);
        self.cancel.cancel();
        true
    }

    /// Status, message, result and `completed_at` change under one lock.
    fn finish(state: &mut JobState, status: JobStatus, message: String, result: Option<JobResult>) {
        state.status = status;
        state.message = message;
        state.result = result;
        state.completed_at = Some(Utc::now());
    }

    fn finished_before(&self, cutoff: Timestamp) -> bool {
        let state = self.read();
        state.status.is_terminal() && state.completed_at.is_some_and(|at| at < cutoff)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Concurrent map of job id to [`JobEntry`].
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<String, Arc<JobEntry>>,
}

/// `job_` followed by 32 lowercase hex characters.
fn new_job_id() -> String {
    format!("job_{}", uuid::Uuid::new_v4().simple())
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh `Queued` job and return its entry.
    pub fn create(&self, job_type: JobType) -> Arc<JobEntry> {
        let entry = Arc::new(JobEntry::new(new_job_id(), job_type));
        self.jobs.insert(entry.id.clone(), Arc::clone(&entry));
        entry
    }

    pub fn get(&self, id: &str) -> Option<Arc<JobEntry>> {
        self.jobs.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn snapshot(&self, id: &str) -> Option<JobSnapshot> {
        self.get(id).map(|e| e.snapshot())
    }

    /// Snapshots of every job, newest first.
    pub fn list_all(&self) -> Vec<JobSnapshot> {
        let entries: Vec<Arc<JobEntry>> = self.jobs.iter().map(|e| Arc::clone(e.value())).collect();
        let mut snapshots: Vec<JobSnapshot> = entries.iter().map(|e| e.snapshot()).collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }

    /// Cancel a queued or running job with the user-cancel message.
    ///
    /// Returns `false` for unknown ids and terminal jobs.
    pub fn request_cancel(&self, id: &str) -> bool {
        match self.get(id) {
            Some(entry) => entry.mark_cancelled(MSG_CANCELLED_BY_USER),
            None => false,
        }
    }

    /// Remove terminal jobs that finished before `cutoff`. Returns how many
    /// were removed.
    pub fn remove_expired(&self, cutoff: Timestamp) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, entry| !entry.finished_before(cutoff));
        before.saturating_sub(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
