//! `autocart-core` — domain foundation for the automation control plane.
//!
//! This crate contains **pure domain** primitives (no I/O, no transport
//! concerns): identifiers, the job/task model, lifecycle state machines
//! and the control-plane error taxonomy.

pub mod command;
pub mod error;
pub mod id;
pub mod job;
pub mod kind;
pub mod task;

pub use command::{Command, CommandEnvelope};
pub use error::{ControlError, ControlResult};
pub use id::{JobId, TaskId};
pub use job::{Job, JobStatus};
pub use kind::JobKind;
pub use task::{CancelDetails, PurchaseDetails, Task, TaskDetails, TaskStatus};
