//! HTTP implementation of the remote job store.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use autocart_core::{ControlError, ControlResult, Job, JobId, JobKind, Task, TaskId};

use crate::config::StoreConfig;
use crate::session::Session;
use crate::store::{Confirmation, JobStats, JobStore};
use crate::wire::{JobDoc, LoginDoc, MessageDoc, TaskDoc};

/// Reqwest-backed [`JobStore`] carrying the session's bearer credential.
pub struct HttpJobStore {
    base_url: String,
    session: Session,
    client: reqwest::Client,
}

impl HttpJobStore {
    pub fn new(config: &StoreConfig, session: Session) -> Self {
        Self {
            base_url: config.base_url.clone(),
            session,
            client: reqwest::Client::new(),
        }
    }

    /// Authenticate and build a store bound to the resulting session.
    pub async fn login(
        config: &StoreConfig,
        email: &str,
        password: &str,
    ) -> ControlResult<Self> {
        let client = reqwest::Client::new();
        let url = format!("{}/auth/login", config.base_url);
        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let doc: LoginDoc = decode(resp).await?;
        tracing::info!("logged in to the job store");
        Ok(Self::new(config, Session::new(doc.token)))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(self.session.token())
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(self.session.token())
    }

    async fn confirm(&self, path: &str) -> ControlResult<Confirmation> {
        tracing::debug!(path, "issuing store command");
        let resp = self.post(path).send().await.map_err(transport)?;
        let doc: MessageDoc = decode(resp).await?;
        Ok(Confirmation::new(doc.message))
    }
}

#[async_trait]
impl JobStore for HttpJobStore {
    async fn list_jobs(&self, kind: Option<JobKind>) -> ControlResult<Vec<Job>> {
        let mut req = self.get("/report/jobs");
        if let Some(kind) = kind {
            req = req.query(&[("kind", kind.as_str())]);
        }
        let resp = req.send().await.map_err(transport)?;
        let docs: Vec<JobDoc> = decode(resp).await?;
        Ok(docs.into_iter().map(JobDoc::into_job).collect())
    }

    async fn list_tasks(&self, job_id: &JobId, kind: JobKind) -> ControlResult<Vec<Task>> {
        let resp = self
            .get(&format!("/report/jobs/{job_id}"))
            .send()
            .await
            .map_err(transport)?;
        let docs: Vec<TaskDoc> = decode(resp).await?;
        docs.into_iter().map(|doc| doc.into_task(kind)).collect()
    }

    async fn stats(&self) -> ControlResult<JobStats> {
        let resp = self.get("/report/stats").send().await.map_err(transport)?;
        decode(resp).await
    }

    async fn start_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.confirm(&format!("/automation/start/{job_id}")).await
    }

    async fn stop_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.confirm(&format!("/automation/stop/{job_id}")).await
    }

    async fn retry_job(&self, job_id: &JobId) -> ControlResult<Confirmation> {
        self.confirm(&format!("/automation/retry/{job_id}")).await
    }

    async fn retry_task(&self, task_id: &TaskId, kind: JobKind) -> ControlResult<Confirmation> {
        let resp = self
            .post(&format!("/automation/retry-task/{task_id}"))
            .query(&[("kind", kind.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let doc: MessageDoc = decode(resp).await?;
        Ok(Confirmation::new(doc.message))
    }

    async fn amend_task_reason(
        &self,
        task_id: &TaskId,
        kind: JobKind,
        reason: &str,
    ) -> ControlResult<()> {
        let resp = self
            .client
            .patch(self.url(&format!("/report/tasks/{task_id}/reason")))
            .bearer_auth(self.session.token())
            .json(&serde_json::json!({ "kind": kind.as_str(), "reason": reason }))
            .send()
            .await
            .map_err(transport)?;
        // Confirmation needs no body.
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error_for(status, resp.text().await.unwrap_or_default()))
        }
    }

    async fn submit_job(
        &self,
        kind: JobKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ControlResult<Job> {
        let form = reqwest::multipart::Form::new()
            .text("kind", kind.as_str())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            );
        let resp = self
            .post("/upload")
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let doc: JobDoc = decode(resp).await?;
        Ok(doc.into_job())
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ControlResult<T> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ControlError::unavailable(format!("malformed store response: {e}")))
    } else {
        Err(error_for(status, resp.text().await.unwrap_or_default()))
    }
}

/// Map a non-2xx response onto the control-plane taxonomy. Client errors
/// mean the command does not apply to the current state; everything else is
/// the store being unavailable.
fn error_for(status: StatusCode, body: String) -> ControlError {
    let message = extract_message(&body);
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => ControlError::invalid_state(message),
        _ => ControlError::unavailable(format!("store returned {status}: {message}")),
    }
}

/// Pull the `message` field out of a JSON error body, falling back to the
/// raw text so the store's wording always survives.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<MessageDoc>(body)
        .map(|doc| doc.message)
        .unwrap_or_else(|_| body.to_string())
}

fn transport(err: reqwest::Error) -> ControlError {
    ControlError::unavailable(err.to_string())
}
