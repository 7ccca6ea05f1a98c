//! Job kind: the fixed category of a batch run.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Category of a job, fixed at creation and never mutated.
///
/// The kind determines which task field shape is valid for every task of
/// the job, and which report layout applies on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Bulk product purchase run.
    Purchase,
    /// Bulk order cancellation run.
    Cancel,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Purchase, JobKind::Cancel];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Purchase => "purchase",
            JobKind::Cancel => "cancel",
        }
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(JobKind::Purchase),
            "cancel" => Ok(JobKind::Cancel),
            other => Err(ControlError::validation(format!(
                "unknown job kind `{other}` (expected purchase or cancel)"
            ))),
        }
    }
}
