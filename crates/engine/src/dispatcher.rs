//! Control command dispatch against the remote store.
//!
//! Every operation is a single remote call followed by a mandatory
//! non-silent resync. Commands the snapshot already shows to be redundant
//! short-circuit to a local no-op so a redundant request never produces a
//! second state transition.

use std::sync::Arc;

use autocart_client::JobStore;
use autocart_core::{
    Command, CommandEnvelope, ControlError, ControlResult, Job, JobId, JobKind, TaskId,
    TaskStatus,
};

use crate::sync::SyncEngine;

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The store acknowledged a transition; carries its message verbatim.
    Confirmed(String),
    /// The command was redundant; nothing was sent or changed.
    Noop(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Outcome::Confirmed(msg) | Outcome::Noop(msg) => msg,
        }
    }
}

/// Issues start/stop/retry/amend commands and keeps the snapshot
/// authoritative afterwards.
pub struct ControlDispatcher {
    store: Arc<dyn JobStore>,
    engine: Arc<SyncEngine>,
}

impl ControlDispatcher {
    pub fn new(store: Arc<dyn JobStore>, engine: Arc<SyncEngine>) -> Self {
        Self { store, engine }
    }

    /// Request that a pending or stopped job begin execution. The store is
    /// the arbiter; a rejection surfaces as `InvalidState` with its message.
    pub async fn start_job(&self, kind: JobKind, job_id: &JobId) -> ControlResult<Outcome> {
        let envelope = CommandEnvelope::new(Command::StartJob {
            job_id: job_id.clone(),
        });
        tracing::info!(command_id = %envelope.command_id, job = %job_id, "dispatching start");

        let confirmation = self.store.start_job(job_id).await?;
        self.resync(kind).await;
        Ok(Outcome::Confirmed(confirmation.message))
    }

    /// Request a cooperative halt. Redundant stops are no-ops: if the
    /// snapshot already shows the job as not running, no remote call is
    /// made and no second transition can occur.
    pub async fn stop_job(&self, kind: JobKind, job_id: &JobId) -> ControlResult<Outcome> {
        let running = {
            let snap = self.engine.snapshot.lock().await;
            snap.job(job_id).map(Job::is_running)
        };
        if running == Some(false) {
            tracing::info!(job = %job_id, "stop requested for a job that is not running");
            return Ok(Outcome::Noop("job is not running".to_string()));
        }

        let envelope = CommandEnvelope::new(Command::StopJob {
            job_id: job_id.clone(),
        });
        tracing::info!(command_id = %envelope.command_id, job = %job_id, "dispatching stop");

        let confirmation = self.store.stop_job(job_id).await?;
        self.resync(kind).await;
        Ok(Outcome::Confirmed(confirmation.message))
    }

    /// Retry every failed task of the job as one server-observable action.
    /// Reported as a no-op when the cached task list shows nothing failed.
    pub async fn retry_job(&self, kind: JobKind, job_id: &JobId) -> ControlResult<Outcome> {
        let cached = {
            let snap = self.engine.snapshot.lock().await;
            let tasks = snap.tasks(job_id);
            if tasks.is_empty() {
                None
            } else {
                Some(tasks.iter().any(|task| task.status == TaskStatus::Failed))
            }
        };
        if cached == Some(false) {
            tracing::info!(job = %job_id, "retry requested with no failed tasks");
            return Ok(Outcome::Noop("no failed tasks to retry".to_string()));
        }

        let envelope = CommandEnvelope::new(Command::RetryJob {
            job_id: job_id.clone(),
        });
        tracing::info!(command_id = %envelope.command_id, job = %job_id, "dispatching retry-all");

        let confirmation = self.store.retry_job(job_id).await?;
        self.resync(kind).await;
        Ok(Outcome::Confirmed(confirmation.message))
    }

    /// Retry one task. Takes the owning `Job` record so the kind sent to
    /// the store can never disagree with the task's parent. Fails with
    /// `InvalidState` unless the task's cached status is exactly failed.
    pub async fn retry_task(&self, job: &Job, task_id: &TaskId) -> ControlResult<Outcome> {
        {
            let snap = self.engine.snapshot.lock().await;
            if let Some(task) = snap.task(&job.id, task_id) {
                if !task.status.can_retry() {
                    return Err(ControlError::invalid_state(format!(
                        "task is {}, only failed tasks can be retried",
                        task.status
                    )));
                }
            }
        }

        let envelope = CommandEnvelope::new(Command::RetryTask {
            task_id: task_id.clone(),
            kind: job.kind,
        });
        tracing::info!(command_id = %envelope.command_id, task = %task_id, "dispatching retry");

        let confirmation = self.store.retry_task(task_id, job.kind).await?;
        self.resync(job.kind).await;
        Ok(Outcome::Confirmed(confirmation.message))
    }

    /// Amend a task's annotation. Always applicable; empty text is rejected
    /// locally before any remote call. The snapshot is patched
    /// optimistically and the mandatory resync still runs.
    pub async fn amend_task_reason(
        &self,
        job: &Job,
        task_id: &TaskId,
        reason: &str,
    ) -> ControlResult<Outcome> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ControlError::validation("annotation text must not be empty"));
        }

        let envelope = CommandEnvelope::new(Command::AmendTaskReason {
            task_id: task_id.clone(),
            kind: job.kind,
            reason: reason.to_string(),
        });
        tracing::info!(command_id = %envelope.command_id, task = %task_id, "dispatching amend");

        self.store
            .amend_task_reason(task_id, job.kind, reason)
            .await?;
        {
            let mut snap = self.engine.snapshot.lock().await;
            snap.amend_reason(&job.id, task_id, reason);
        }
        self.resync(job.kind).await;
        Ok(Outcome::Confirmed("remark updated".to_string()))
    }

    /// Upload a spreadsheet to seed a new job, then resync so the job
    /// appears without waiting for the next scheduled poll.
    pub async fn submit_job(
        &self,
        kind: JobKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ControlResult<Job> {
        let job = self.store.submit_job(kind, file_name, bytes).await?;
        tracing::info!(job = %job.id, kind = kind.as_str(), "submitted new job");
        self.resync(kind).await;
        Ok(job)
    }

    /// Mandatory post-command resync. The command already succeeded
    /// remotely, so a resync failure only delays reconciliation until the
    /// next poll; the stale-but-consistent snapshot stays in place.
    async fn resync(&self, kind: JobKind) {
        if let Err(err) = self.engine.refresh(kind, false).await {
            tracing::warn!(error = %err, "post-command resync failed, keeping last snapshot");
            let mut snap = self.engine.snapshot.lock().await;
            snap.mark_unhealthy();
        }
    }
}
