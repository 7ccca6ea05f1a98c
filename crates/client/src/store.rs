//! Abstract remote job store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use autocart_core::{ControlResult, Job, JobId, JobKind, Task, TaskId};

/// Human-readable confirmation from the store, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Job counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub purchase: u64,
    pub cancel: u64,
}

impl JobStats {
    pub fn total(&self) -> u64 {
        self.purchase + self.cancel
    }
}

/// Authoritative backend holding job and task records.
///
/// ## Ordering
///
/// `list_jobs` and `list_tasks` return records in store order (assumed
/// reverse-chronological). Consumers never re-sort, so report ordering
/// matches store ordering.
///
/// ## Command semantics
///
/// Mutating operations request a transition; the store decides whether it
/// applies. A rejected command surfaces as `ControlError::InvalidState`
/// carrying the store's message, a transport failure as
/// `ControlError::Unavailable`. Implementations never retry on their own.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// List jobs, optionally filtered by kind, newest first.
    async fn list_jobs(&self, kind: Option<JobKind>) -> ControlResult<Vec<Job>>;

    /// List the tasks of one job. `kind` is the owning job's kind and
    /// directs how task documents are shaped.
    async fn list_tasks(&self, job_id: &JobId, kind: JobKind) -> ControlResult<Vec<Task>>;

    /// Per-kind job counts.
    async fn stats(&self) -> ControlResult<JobStats>;

    /// Request that a pending or stopped job begin (or resume) execution.
    async fn start_job(&self, job_id: &JobId) -> ControlResult<Confirmation>;

    /// Request a cooperative halt of a running job. The remote executor
    /// decides the actual stop timing.
    async fn stop_job(&self, job_id: &JobId) -> ControlResult<Confirmation>;

    /// Move every currently failed task of the job back to pending, as a
    /// single server-observable action.
    async fn retry_job(&self, job_id: &JobId) -> ControlResult<Confirmation>;

    /// Move one failed task back to pending.
    async fn retry_task(&self, task_id: &TaskId, kind: JobKind) -> ControlResult<Confirmation>;

    /// Replace a task's annotation text. Always applicable; touches no
    /// execution state.
    async fn amend_task_reason(
        &self,
        task_id: &TaskId,
        kind: JobKind,
        reason: &str,
    ) -> ControlResult<()>;

    /// Upload a spreadsheet to seed a new job. Task population is eventual;
    /// the returned job typically starts out pending with no tasks yet.
    async fn submit_job(
        &self,
        kind: JobKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ControlResult<Job>;
}

#[async_trait]
impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    async fn list_jobs(&self, kind: Option<JobKind>) -> ControlResult<Vec<Job>> {
        (**self).list_jobs(kind).await
    }

    async fn list_tasks(&self, job_id: &JobId, kind: JobKind) -> ControlResult<Vec<Task>> {
        (**self).list_tasks(job_id, kind).await
    }

    async fn stats(&self) -> ControlResult<JobStats> {
        (**self).stats().await
    }

    async fn start_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        (**self).start_job(job_id).await
    }

    async fn stop_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        (**self).stop_job(job_id).await
    }

    async fn retry_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        (**self).retry_job(job_id).await
    }

    async fn retry_task(&self, task_id: &TaskId, kind: JobKind) -> ControlResult<Confirmation> {
        (**self).retry_task(task_id, kind).await
    }

    async fn amend_task_reason(
        &self,
        task_id: &TaskId,
        kind: JobKind,
        reason: &str,
    ) -> ControlResult<()> {
        (**self).amend_task_reason(task_id, kind, reason).await
    }

    async fn submit_job(
        &self,
        kind: JobKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ControlResult<Job> {
        (**self).submit_job(kind, file_name, bytes).await
    }
}
