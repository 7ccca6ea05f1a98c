//! `autocart-engine` — state synchronization and control dispatch.
//!
//! The [`SyncEngine`] reconciles a [`LocalSnapshot`] with the remote job
//! store on a fixed cadence; the [`ControlDispatcher`] issues idempotent
//! control commands and forces an authoritative resync after each success.

pub mod dispatcher;
pub mod snapshot;
pub mod sync;

pub use dispatcher::{ControlDispatcher, Outcome};
pub use snapshot::LocalSnapshot;
pub use sync::{EngineHandle, SyncEngine};
