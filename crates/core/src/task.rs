//! Task model: one target record's unit of work within a job.

use serde::{Deserialize, Serialize};

use crate::id::TaskId;
use crate::kind::JobKind;

/// Per-task outcome, independent of sibling tasks.
///
/// Permitted edges: `pending → {success, failed}` driven by the remote
/// executor, and `failed → pending` via an explicit retry command.
/// `success` is terminal and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
        }
    }

    /// Retry is applicable only to failed tasks.
    pub fn can_retry(self) -> bool {
        matches!(self, TaskStatus::Failed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target record for a purchase task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetails {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub pincode: String,
    pub city: String,
    pub state: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub landmark: Option<String>,
    pub alternate_phone: Option<String>,
    pub product_link: String,
    /// Filled in by the executor once the purchase lands.
    pub order_id: Option<String>,
}

/// Target record for a cancellation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelDetails {
    pub email: String,
    pub order_id: String,
}

/// Kind-specific task payload, tagged by the owning job's kind.
///
/// The variant is fully determined by the parent job; consumers pattern-match
/// on the tag instead of probing for field presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskDetails {
    Purchase(PurchaseDetails),
    Cancel(CancelDetails),
}

impl TaskDetails {
    pub fn kind(&self) -> JobKind {
        match self {
            TaskDetails::Purchase(_) => JobKind::Purchase,
            TaskDetails::Cancel(_) => JobKind::Cancel,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            TaskDetails::Purchase(d) => &d.email,
            TaskDetails::Cancel(d) => &d.email,
        }
    }
}

/// One unit of work within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Outcome note or user-editable remark; amendable post-hoc.
    pub reason: Option<String>,
    /// Relative path to a captured artifact in external storage.
    pub screenshot: Option<String>,
    pub details: TaskDetails,
}

impl Task {
    pub fn kind(&self) -> JobKind {
        self.details.kind()
    }
}
