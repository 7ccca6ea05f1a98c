//! End-to-end engine scenarios against an in-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use autocart_client::{Confirmation, JobStats, JobStore};
use autocart_core::{
    CancelDetails, ControlError, ControlResult, Job, JobId, JobKind, JobStatus, Task,
    TaskDetails, TaskId, TaskStatus,
};
use autocart_engine::{ControlDispatcher, Outcome, SyncEngine};

fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: JobId::new(id),
        kind: JobKind::Cancel,
        status,
        source_file: format!("uploads/{id}.xlsx"),
        created_at: Utc::now(),
    }
}

fn task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: TaskId::new(id),
        status,
        reason: None,
        screenshot: None,
        details: TaskDetails::Cancel(CancelDetails {
            email: format!("{id}@example.com"),
            order_id: format!("OD-{id}"),
        }),
    }
}

#[derive(Default)]
struct FakeState {
    jobs: Vec<Job>,
    tasks: HashMap<JobId, Vec<Task>>,
}

/// In-memory store with call counters and a list gate for racing polls
/// against teardown.
struct FakeStore {
    state: Mutex<FakeState>,
    fail: AtomicBool,
    gated: AtomicBool,
    gate: Semaphore,
    stop_calls: AtomicU32,
    retry_job_calls: AtomicU32,
    retry_task_calls: AtomicU32,
    amend_calls: AtomicU32,
}

impl FakeStore {
    fn new(jobs: Vec<Job>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                jobs,
                tasks: HashMap::new(),
            }),
            fail: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            stop_calls: AtomicU32::new(0),
            retry_job_calls: AtomicU32::new(0),
            retry_task_calls: AtomicU32::new(0),
            amend_calls: AtomicU32::new(0),
        })
    }

    fn set_tasks(&self, job_id: &str, tasks: Vec<Task>) {
        let mut state = self.state.lock().unwrap();
        state.tasks.insert(JobId::new(job_id), tasks);
    }

    fn set_jobs(&self, jobs: Vec<Job>) {
        self.state.lock().unwrap().jobs = jobs;
    }

    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// While gated, `list_jobs` blocks until a permit is released.
    fn close_gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    fn open_gate(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.add_permits(64);
    }

    fn check_fail(&self) -> ControlResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ControlError::unavailable("store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for FakeStore {
    async fn list_jobs(&self, kind: Option<JobKind>) -> ControlResult<Vec<Job>> {
        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| ControlError::unavailable("gate closed"))?;
            permit.forget();
        }
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .filter(|job| kind.is_none_or(|k| job.kind == k))
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, job_id: &JobId, _kind: JobKind) -> ControlResult<Vec<Task>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state.tasks.get(job_id).cloned().unwrap_or_default())
    }

    async fn stats(&self) -> ControlResult<JobStats> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        let mut stats = JobStats::default();
        for job in &state.jobs {
            match job.kind {
                JobKind::Purchase => stats.purchase += 1,
                JobKind::Cancel => stats.cancel += 1,
            }
        }
        Ok(stats)
    }

    async fn start_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .iter_mut()
            .find(|job| &job.id == job_id)
            .ok_or_else(|| ControlError::invalid_state("job not found"))?;
        if !job.status.can_start() {
            return Err(ControlError::invalid_state(format!(
                "job is already {}",
                job.status
            )));
        }
        job.status = JobStatus::Running;
        Ok(Confirmation::new("automation started"))
    }

    async fn stop_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .iter_mut()
            .find(|job| &job.id == job_id)
            .ok_or_else(|| ControlError::invalid_state("job not found"))?;
        if job.status != JobStatus::Running {
            return Err(ControlError::invalid_state("job is not running"));
        }
        job.status = JobStatus::Stopped;
        Ok(Confirmation::new("automation stopped"))
    }

    async fn retry_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.retry_job_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        if let Some(tasks) = state.tasks.get_mut(job_id) {
            for task in tasks.iter_mut() {
                if task.status == TaskStatus::Failed {
                    task.status = TaskStatus::Pending;
                }
            }
        }
        Ok(Confirmation::new("failed tasks queued for retry"))
    }

    async fn retry_task(&self, task_id: &TaskId, _kind: JobKind) -> ControlResult<Confirmation> {
        self.retry_task_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .values_mut()
            .flatten()
            .find(|task| &task.id == task_id)
            .ok_or_else(|| ControlError::invalid_state("task not found"))?;
        if task.status != TaskStatus::Failed {
            return Err(ControlError::invalid_state("task is not failed"));
        }
        task.status = TaskStatus::Pending;
        Ok(Confirmation::new("task queued for retry"))
    }

    async fn amend_task_reason(
        &self,
        task_id: &TaskId,
        _kind: JobKind,
        reason: &str,
    ) -> ControlResult<()> {
        self.amend_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .values_mut()
            .flatten()
            .find(|task| &task.id == task_id)
            .ok_or_else(|| ControlError::invalid_state("task not found"))?;
        task.reason = Some(reason.to_string());
        Ok(())
    }

    async fn submit_job(
        &self,
        kind: JobKind,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> ControlResult<Job> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let submitted = Job {
            id: JobId::new(format!("j{}", state.jobs.len() + 1)),
            kind,
            status: JobStatus::Pending,
            source_file: format!("uploads/{file_name}"),
            created_at: Utc::now(),
        };
        state.jobs.insert(0, submitted.clone());
        Ok(submitted)
    }
}

fn rig(store: &Arc<FakeStore>) -> (Arc<SyncEngine>, ControlDispatcher) {
    let store: Arc<dyn JobStore> = Arc::clone(store) as Arc<dyn JobStore>;
    let engine = Arc::new(SyncEngine::new(Arc::clone(&store)));
    let dispatcher = ControlDispatcher::new(store, Arc::clone(&engine));
    (engine, dispatcher)
}

#[tokio::test]
async fn starting_a_pending_job_lands_it_running_in_the_snapshot() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Pending)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let outcome = dispatcher
        .start_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Confirmed("automation started".to_string()));

    let snap = engine.read_snapshot().await;
    assert_eq!(snap.job(&JobId::new("j1")).unwrap().status, JobStatus::Running);
    assert!(snap.is_healthy());
}

#[tokio::test]
async fn a_failed_task_does_not_complete_the_job_locally() {
    // Completion is the store's call; all-terminal-but-failed stays running.
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    store.set_tasks(
        "j1",
        vec![task("t1", TaskStatus::Success), task("t2", TaskStatus::Failed)],
    );
    let (engine, _dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let snap = engine.read_snapshot().await;
    assert_eq!(snap.job(&JobId::new("j1")).unwrap().status, JobStatus::Running);
    assert_eq!(snap.tasks(&JobId::new("j1")).len(), 2);
}

#[tokio::test]
async fn starting_a_running_job_surfaces_the_store_rejection() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let err = dispatcher
        .start_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidState(msg) if msg.contains("running")));
}

#[tokio::test]
async fn retry_all_flips_only_failed_tasks_back_to_pending() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks(
        "j1",
        vec![
            task("t1", TaskStatus::Failed),
            task("t2", TaskStatus::Failed),
            task("t3", TaskStatus::Success),
        ],
    );
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let outcome = dispatcher
        .retry_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Confirmed(_)));
    assert_eq!(store.retry_job_calls.load(Ordering::SeqCst), 1);

    let snap = engine.read_snapshot().await;
    let statuses: Vec<TaskStatus> = snap
        .tasks(&JobId::new("j1"))
        .iter()
        .map(|task| task.status)
        .collect();
    assert_eq!(
        statuses,
        vec![TaskStatus::Pending, TaskStatus::Pending, TaskStatus::Success]
    );
}

#[tokio::test]
async fn retry_all_with_no_failures_is_a_local_noop() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks("j1", vec![task("t1", TaskStatus::Success)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let outcome = dispatcher
        .retry_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Noop(_)));
    assert_eq!(store.retry_job_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stopping_twice_sends_exactly_one_remote_stop() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let first = dispatcher
        .stop_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap();
    assert!(matches!(first, Outcome::Confirmed(_)));

    // The resync after the first stop already shows the job as stopped.
    let second = dispatcher
        .stop_job(JobKind::Cancel, &JobId::new("j1"))
        .await
        .unwrap();
    assert!(matches!(second, Outcome::Noop(_)));
    assert_eq!(store.stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retrying_a_non_failed_task_is_rejected_before_any_remote_call() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks("j1", vec![task("t1", TaskStatus::Success)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let owner = engine.read_snapshot().await.job(&JobId::new("j1")).cloned().unwrap();
    let err = dispatcher
        .retry_task(&owner, &TaskId::new("t1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidState(_)));
    assert_eq!(store.retry_task_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn retrying_a_failed_task_succeeds_and_resyncs() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks("j1", vec![task("t1", TaskStatus::Failed)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let owner = engine.read_snapshot().await.job(&JobId::new("j1")).cloned().unwrap();
    let outcome = dispatcher
        .retry_task(&owner, &TaskId::new("t1"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Confirmed(_)));

    let snap = engine.read_snapshot().await;
    assert_eq!(
        snap.task(&JobId::new("j1"), &TaskId::new("t1")).unwrap().status,
        TaskStatus::Pending
    );
}

#[tokio::test]
async fn amending_with_empty_text_never_reaches_the_store() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks("j1", vec![task("t1", TaskStatus::Failed)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let owner = engine.read_snapshot().await.job(&JobId::new("j1")).cloned().unwrap();
    let err = dispatcher
        .amend_task_reason(&owner, &TaskId::new("t1"), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::Validation(_)));
    assert_eq!(store.amend_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn amending_twice_with_the_same_text_converges_to_one_state() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Stopped)]);
    store.set_tasks("j1", vec![task("t1", TaskStatus::Failed)]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let owner = engine.read_snapshot().await.job(&JobId::new("j1")).cloned().unwrap();
    dispatcher
        .amend_task_reason(&owner, &TaskId::new("t1"), "address unreachable")
        .await
        .unwrap();
    let after_first = engine.read_snapshot().await;

    dispatcher
        .amend_task_reason(&owner, &TaskId::new("t1"), "address unreachable")
        .await
        .unwrap();
    let after_second = engine.read_snapshot().await;

    assert_eq!(
        after_first.tasks(&JobId::new("j1")),
        after_second.tasks(&JobId::new("j1"))
    );
    assert_eq!(
        after_second
            .task(&JobId::new("j1"), &TaskId::new("t1"))
            .unwrap()
            .reason
            .as_deref(),
        Some("address unreachable")
    );
    assert_eq!(store.amend_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn selecting_an_unknown_job_is_a_validation_error() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Pending)]);
    let (engine, _dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    let err = engine
        .select_job(JobKind::Cancel, JobId::new("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::Validation(_)));
}

#[tokio::test]
async fn a_silent_refresh_failure_degrades_freshness_but_keeps_state() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    let (engine, _dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    store.set_fail(true);
    engine.refresh(JobKind::Cancel, true).await.unwrap();

    let snap = engine.read_snapshot().await;
    assert!(!snap.is_healthy());
    assert_eq!(snap.jobs(JobKind::Cancel).len(), 1);
    assert_eq!(snap.selected_job(), Some(&JobId::new("j1")));

    // Recovery on the next successful poll.
    store.set_fail(false);
    engine.refresh(JobKind::Cancel, true).await.unwrap();
    assert!(engine.read_snapshot().await.is_healthy());
}

#[tokio::test]
async fn a_non_silent_refresh_failure_surfaces_but_keeps_the_snapshot() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    let (engine, _dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    store.set_fail(true);
    let err = engine.refresh(JobKind::Cancel, false).await.unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(engine.read_snapshot().await.jobs(JobKind::Cancel).len(), 1);
}

#[tokio::test]
async fn submitting_a_job_makes_it_visible_without_waiting_for_a_poll() {
    let store = FakeStore::new(vec![]);
    let (engine, dispatcher) = rig(&store);
    engine.refresh(JobKind::Purchase, false).await.unwrap();

    let submitted = dispatcher
        .submit_job(JobKind::Purchase, "orders.xlsx", b"rows".to_vec())
        .await
        .unwrap();
    assert_eq!(submitted.status, JobStatus::Pending);

    let snap = engine.read_snapshot().await;
    assert_eq!(snap.jobs(JobKind::Purchase).len(), 1);
    assert_eq!(snap.selected_job(), Some(&submitted.id));
}

#[tokio::test]
async fn a_poll_resolving_after_shutdown_is_discarded() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Running)]);
    let (engine, _dispatcher) = rig(&store);
    engine.refresh(JobKind::Cancel, false).await.unwrap();

    // The next list call blocks until the gate opens, and will return a
    // different world.
    store.close_gate();
    store.set_jobs(vec![job("j2", JobStatus::Pending)]);

    let handle = engine.start(JobKind::Cancel, Duration::from_millis(5));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Teardown races the in-flight poll; its result must not land.
    handle.shutdown();
    store.open_gate();
    handle.join().await;

    let snap = engine.read_snapshot().await;
    assert_eq!(snap.jobs(JobKind::Cancel).len(), 1);
    assert_eq!(snap.jobs(JobKind::Cancel)[0].id, JobId::new("j1"));
    assert_eq!(snap.selected_job(), Some(&JobId::new("j1")));
}

#[tokio::test]
async fn the_polling_loop_reconciles_remote_changes() {
    let store = FakeStore::new(vec![job("j1", JobStatus::Pending)]);
    let (engine, _dispatcher) = rig(&store);

    let handle = engine.start(JobKind::Cancel, Duration::from_millis(5));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.read_snapshot().await.jobs(JobKind::Cancel).len(), 1);

    store.set_jobs(vec![job("j2", JobStatus::Pending), job("j1", JobStatus::Running)]);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snap = engine.read_snapshot().await;
    assert_eq!(snap.jobs(JobKind::Cancel).len(), 2);
    assert_eq!(snap.job(&JobId::new("j1")).unwrap().status, JobStatus::Running);

    handle.shutdown();
    handle.join().await;
}
