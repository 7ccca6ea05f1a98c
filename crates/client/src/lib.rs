//! `autocart-client` — the remote job store boundary.
//!
//! Exposes the [`JobStore`] trait consumed by the synchronization engine and
//! control dispatcher, its HTTP implementation, the wire documents the store
//! API speaks, and the explicit session/configuration context.

pub mod config;
pub mod http;
pub mod session;
pub mod store;
pub mod wire;

pub use config::{StoreConfig, DEFAULT_POLL_INTERVAL};
pub use http::HttpJobStore;
pub use session::Session;
pub use store::{Confirmation, JobStats, JobStore};
