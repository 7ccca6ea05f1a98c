//! Periodic reconciliation with the remote job store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use autocart_client::JobStore;
use autocart_core::{ControlError, ControlResult, Job, JobId, JobKind, Task};

use crate::snapshot::LocalSnapshot;

/// Polls the store on a fixed cadence and folds results into the
/// [`LocalSnapshot`].
///
/// Two guards keep reconciliation race-free:
/// - a poll gate ensures at most one snapshot fetch is outstanding; a
///   scheduled tick that finds a poll in flight is skipped, never queued;
/// - a generation counter, bumped on every start/teardown, discards any
///   in-flight result that resolves against a stale generation.
pub struct SyncEngine {
    store: Arc<dyn JobStore>,
    pub(crate) snapshot: Arc<Mutex<LocalSnapshot>>,
    generation: Arc<AtomicU64>,
    poll_gate: Arc<Mutex<()>>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            snapshot: Arc::new(Mutex::new(LocalSnapshot::new())),
            generation: Arc::new(AtomicU64::new(0)),
            poll_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Clone of the current snapshot, for read-only consumers.
    pub async fn read_snapshot(&self) -> LocalSnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Select a job and immediately resync so its tasks are fetched.
    pub async fn select_job(&self, kind: JobKind, job_id: JobId) -> ControlResult<()> {
        {
            let mut snap = self.snapshot.lock().await;
            if !snap.select(job_id.clone()) {
                return Err(ControlError::validation(format!(
                    "job {job_id} is not in the current snapshot"
                )));
            }
        }
        self.refresh(kind, false).await
    }

    /// One fetch cycle against the store.
    ///
    /// Silent refreshes (background polls) absorb failures: the freshness
    /// flag degrades, existing state is untouched and `Ok(())` is returned.
    /// Non-silent refreshes surface the failure, still keeping the
    /// last-known-good snapshot.
    pub async fn refresh(&self, kind: JobKind, silent: bool) -> ControlResult<()> {
        let _gate = if silent {
            match self.poll_gate.try_lock() {
                Ok(gate) => gate,
                Err(_) => {
                    tracing::debug!("poll already in flight, skipping tick");
                    return Ok(());
                }
            }
        } else {
            self.poll_gate.lock().await
        };

        let generation = self.generation.load(Ordering::SeqCst);
        match self.fetch(kind).await {
            Ok((jobs, tasks)) => {
                let mut snap = self.snapshot.lock().await;
                if self.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("discarding poll result from a stale generation");
                    return Ok(());
                }
                snap.apply(kind, jobs, tasks);
                Ok(())
            }
            Err(err) if silent => {
                tracing::debug!(error = %err, "background refresh failed, keeping last snapshot");
                let mut snap = self.snapshot.lock().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    snap.mark_unhealthy();
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed");
                Err(err)
            }
        }
    }

    /// Fetch the job list and, when a job will be selected after repair,
    /// that job's tasks — so the applied snapshot is internally consistent.
    async fn fetch(
        &self,
        kind: JobKind,
    ) -> ControlResult<(Vec<Job>, Option<(JobId, Vec<Task>)>)> {
        let jobs = self.store.list_jobs(Some(kind)).await?;

        let prior = { self.snapshot.lock().await.selected_job().cloned() };
        let target = prior
            .filter(|id| jobs.iter().any(|job| &job.id == id))
            .or_else(|| jobs.first().map(|job| job.id.clone()));

        let tasks = match target {
            Some(job_id) => {
                let list = self.store.list_tasks(&job_id, kind).await?;
                Some((job_id, list))
            }
            None => None,
        };
        Ok((jobs, tasks))
    }

    /// Begin periodic polling for one kind. The first cycle runs
    /// immediately, then every `interval`. Shutting down (or dropping) the
    /// returned handle guarantees no further polls are issued and any
    /// in-flight result is discarded.
    pub fn start(self: &Arc<Self>, kind: JobKind, interval: Duration) -> EngineHandle {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let engine = Arc::clone(self);
        let shutdown = Arc::new(Notify::new());
        let shutdown_rx = Arc::clone(&shutdown);
        let task = tokio::spawn(async move {
            tracing::info!(kind = kind.as_str(), "sync engine started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.notified() => break,
                    _ = ticker.tick() => {
                        // Silent refreshes never error.
                        let _ = engine.refresh(kind, true).await;
                    }
                }
            }
            tracing::info!(kind = kind.as_str(), "sync engine stopped");
        });

        EngineHandle {
            shutdown,
            generation: Arc::clone(&self.generation),
            task: Some(task),
        }
    }
}

/// Handle owning one polling loop.
pub struct EngineHandle {
    shutdown: Arc<Notify>,
    generation: Arc<AtomicU64>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl EngineHandle {
    /// Stop polling. A poll still in flight resolves against a stale
    /// generation and its result is discarded.
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    /// Wait for the polling task to exit after [`Self::shutdown`].
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
