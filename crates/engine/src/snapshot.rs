//! Local snapshot of remote job/task state.
//!
//! The snapshot is only ever written through two paths: the full replace in
//! [`LocalSnapshot::apply`] (driven by the sync engine) and the single-field
//! annotation patch in [`LocalSnapshot::amend_reason`]. Everything else
//! reads. That is the consistency guarantee: no partial merges, no
//! selected-but-nonexistent job references.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use autocart_core::{Job, JobId, JobKind, Task, TaskId};

/// Last-known-good view of the store, replaced wholesale on each
/// successful sync.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSnapshot {
    jobs_by_kind: HashMap<JobKind, Vec<Job>>,
    tasks_by_job: HashMap<JobId, Vec<Task>>,
    selected_job: Option<JobId>,
    last_synced_at: Option<DateTime<Utc>>,
    healthy: bool,
}

impl LocalSnapshot {
    pub fn new() -> Self {
        Self {
            jobs_by_kind: HashMap::new(),
            tasks_by_job: HashMap::new(),
            selected_job: None,
            last_synced_at: None,
            healthy: true,
        }
    }

    /// Jobs of one kind, in store order.
    pub fn jobs(&self, kind: JobKind) -> &[Job] {
        self.jobs_by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Cached tasks of one job, in store order.
    pub fn tasks(&self, job_id: &JobId) -> &[Task] {
        self.tasks_by_job.get(job_id).map_or(&[], Vec::as_slice)
    }

    pub fn selected_job(&self) -> Option<&JobId> {
        self.selected_job.as_ref()
    }

    pub fn job(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs_by_kind
            .values()
            .flatten()
            .find(|job| &job.id == job_id)
    }

    pub fn task(&self, job_id: &JobId, task_id: &TaskId) -> Option<&Task> {
        self.tasks(job_id).iter().find(|task| &task.id == task_id)
    }

    /// False once a background refresh has failed; restored by the next
    /// successful sync.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Full replace for one kind, with atomic selection repair: the prior
    /// selection survives only if still present in the fresh list, else it
    /// falls back to the first (most recent) job, else to none. Task lists
    /// are replaced wholesale; only tasks belonging to the surviving
    /// selection are kept.
    pub fn apply(&mut self, kind: JobKind, jobs: Vec<Job>, tasks: Option<(JobId, Vec<Task>)>) {
        let selected = self
            .selected_job
            .take()
            .filter(|id| jobs.iter().any(|job| &job.id == id))
            .or_else(|| jobs.first().map(|job| job.id.clone()));

        self.jobs_by_kind.insert(kind, jobs);
        self.selected_job = selected;
        self.tasks_by_job.clear();
        if let Some((job_id, list)) = tasks {
            if self.selected_job.as_ref() == Some(&job_id) {
                self.tasks_by_job.insert(job_id, list);
            }
        }
        self.last_synced_at = Some(Utc::now());
        self.healthy = true;
    }

    pub fn mark_unhealthy(&mut self) {
        self.healthy = false;
    }

    /// Explicit user selection. Returns false (and leaves the selection
    /// unchanged) if the job is not in the current lists.
    pub fn select(&mut self, job_id: JobId) -> bool {
        if self.job(&job_id).is_some() {
            self.selected_job = Some(job_id);
            true
        } else {
            false
        }
    }

    /// Optimistic single-field annotation patch. Display-only; the next
    /// full replace remains authoritative.
    pub fn amend_reason(&mut self, job_id: &JobId, task_id: &TaskId, reason: &str) -> bool {
        if let Some(tasks) = self.tasks_by_job.get_mut(job_id) {
            if let Some(task) = tasks.iter_mut().find(|task| &task.id == task_id) {
                task.reason = Some(reason.to_string());
                return true;
            }
        }
        false
    }
}

impl Default for LocalSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
