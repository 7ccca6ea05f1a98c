//! `autocart-report` — deterministic report projection and CSV export.

pub mod csv;
pub mod projector;

pub use csv::export_file_name;
pub use projector::{Report, project};
