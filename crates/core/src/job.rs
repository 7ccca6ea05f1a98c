//! Job record and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::kind::JobKind;

/// Job status lifecycle.
///
/// `pending → running → {stopped, completed}`, with `stopped → running`
/// permitted as a resume. `completed` is terminal. `running` is only ever
/// reached through an explicit start/resume command acknowledged by the
/// store; polling reflects transitions, it never invents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Stopped,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Stopped => "stopped",
            JobStatus::Completed => "completed",
        }
    }

    /// A start/resume command is applicable only from these states.
    pub fn can_start(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Stopped)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    /// Whether the store may legally move a job from `self` to `next`.
    pub fn can_transition(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Stopped) | (Running, Completed) | (Stopped, Running)
        )
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch automation run of one kind, owning many tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Reference to the uploaded spreadsheet that seeded the tasks
    /// (display-only; the file itself lives with the store).
    pub source_file: String,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Basename of the originating upload, for display.
    pub fn file_label(&self) -> &str {
        self.source_file
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_file)
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}
