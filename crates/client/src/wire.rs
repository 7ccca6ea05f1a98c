//! Wire documents spoken by the store API.
//!
//! These stay decoupled from the domain types. Task documents arrive flat;
//! conversion into the tagged [`TaskDetails`] is directed by the owning
//! job's kind rather than by probing for field presence.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use autocart_core::{
    CancelDetails, ControlError, ControlResult, Job, JobId, JobKind, JobStatus, PurchaseDetails,
    Task, TaskDetails, TaskId, TaskStatus,
};

/// A job record as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(rename = "uploadFile")]
    pub upload_file: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl JobDoc {
    pub fn into_job(self) -> Job {
        Job {
            id: JobId::new(self.id),
            kind: self.kind,
            status: self.status,
            source_file: self.upload_file,
            created_at: self.created_at,
        }
    }
}

/// A task record as returned by the store: a flat document whose populated
/// fields depend on the owning job's kind.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "addressline1")]
    pub address_line1: Option<String>,
    #[serde(default, rename = "addressline2")]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default, rename = "alternatephone")]
    pub alternate_phone: Option<String>,
    #[serde(default, rename = "productlink")]
    pub product_link: Option<String>,
    #[serde(default, rename = "orderId")]
    pub order_id: Option<String>,
}

impl TaskDoc {
    /// Build the domain task, shaping the details by the owning job's kind.
    pub fn into_task(self, kind: JobKind) -> ControlResult<Task> {
        let details = match kind {
            JobKind::Purchase => TaskDetails::Purchase(PurchaseDetails {
                email: required(self.email, "email")?,
                name: required(self.name, "name")?,
                phone: required(self.phone, "phone")?,
                pincode: required(self.pincode, "pincode")?,
                city: required(self.city, "city")?,
                state: required(self.state, "state")?,
                address_line1: self.address_line1,
                address_line2: self.address_line2,
                landmark: self.landmark,
                alternate_phone: self.alternate_phone,
                product_link: required(self.product_link, "productlink")?,
                order_id: self.order_id,
            }),
            JobKind::Cancel => TaskDetails::Cancel(CancelDetails {
                email: required(self.email, "email")?,
                order_id: required(self.order_id, "orderId")?,
            }),
        };
        Ok(Task {
            id: TaskId::new(self.id),
            status: self.status,
            reason: self.reason,
            screenshot: self.screenshot,
            details,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> ControlResult<String> {
    value.ok_or_else(|| ControlError::validation(format!("task document missing `{field}`")))
}

/// Generic confirmation body: `{ "message": "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDoc {
    pub message: String,
}

/// Login response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginDoc {
    pub token: String,
}
