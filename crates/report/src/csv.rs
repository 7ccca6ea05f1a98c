//! CSV serialization of a projected report.
//!
//! The header line is part of the external contract: unquoted, comma-joined,
//! exactly the projector's column titles. Data fields are always quoted,
//! with embedded quotes doubled, so commas, quotes and newlines inside
//! values can never shift columns.

use autocart_core::{JobId, JobKind};

use crate::projector::Report;

impl Report {
    /// Serialize to CSV text. Byte-identical for equal reports.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header.join(","));
        for row in &self.rows {
            out.push('\n');
            let mut first = true;
            for field in row {
                if !first {
                    out.push(',');
                }
                first = false;
                push_quoted(&mut out, field);
            }
        }
        out
    }
}

fn push_quoted(out: &mut String, field: &str) {
    out.push('"');
    for ch in field.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Suggested download name for a job's exported report.
pub fn export_file_name(kind: JobKind, job_id: &JobId) -> String {
    format!("report-{}-{}.csv", kind.as_str(), job_id)
}
