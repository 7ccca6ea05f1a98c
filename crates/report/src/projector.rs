//! Pure projection of a job's tasks into a tabular report.

use autocart_core::{Job, JobKind, Task, TaskDetails};

const PURCHASE_HEADER: &[&str] = &[
    "Email",
    "Name",
    "Phone",
    "Pincode",
    "City",
    "State",
    "Product Link",
    "Order ID",
    "Status",
    "Reason",
];

const CANCEL_HEADER: &[&str] = &["Email", "Order ID", "Status", "Reason"];

/// Tabular projection of one job. Column set is fixed per kind; row order
/// is the task order handed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Project a job's tasks into rows. Pure and deterministic: equal inputs
/// produce an equal report. Missing optional fields render as empty
/// strings. Tasks are assumed to belong to `job` (they are fetched under
/// its id and carry its kind by construction).
pub fn project(job: &Job, tasks: &[Task]) -> Report {
    let header = match job.kind {
        JobKind::Purchase => PURCHASE_HEADER,
        JobKind::Cancel => CANCEL_HEADER,
    };
    let rows = tasks.iter().map(row).collect();
    Report {
        header: header.iter().map(|col| (*col).to_string()).collect(),
        rows,
    }
}

fn row(task: &Task) -> Vec<String> {
    let status = task.status.to_string();
    let reason = task.reason.clone().unwrap_or_default();
    match &task.details {
        TaskDetails::Purchase(d) => vec![
            d.email.clone(),
            d.name.clone(),
            d.phone.clone(),
            d.pincode.clone(),
            d.city.clone(),
            d.state.clone(),
            d.product_link.clone(),
            d.order_id.clone().unwrap_or_default(),
            status,
            reason,
        ],
        TaskDetails::Cancel(d) => vec![d.email.clone(), d.order_id.clone(), status, reason],
    }
}
