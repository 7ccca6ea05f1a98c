//! Control commands issued against the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{JobId, TaskId};
use crate::kind::JobKind;

/// One control operation. The store is the arbiter of whether the requested
/// transition applies; commands carry no local state beyond their target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    StartJob { job_id: JobId },
    StopJob { job_id: JobId },
    RetryJob { job_id: JobId },
    RetryTask { task_id: TaskId, kind: JobKind },
    AmendTaskReason { task_id: TaskId, kind: JobKind, reason: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartJob { .. } => "start_job",
            Command::StopJob { .. } => "stop_job",
            Command::RetryJob { .. } => "retry_job",
            Command::RetryTask { .. } => "retry_task",
            Command::AmendTaskReason { .. } => "amend_task_reason",
        }
    }
}

/// A command tagged with a locally minted correlation id for log tracing.
///
/// Uses UUIDv7 (time-ordered), so dispatch logs sort by issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(command: Command) -> Self {
        Self {
            command_id: Uuid::now_v7(),
            issued_at: Utc::now(),
            command,
        }
    }
}
