use super::types::{Batch, FileCategory, FilePayload};
use crate::error::TransportError;
use crate::status::{ActivityEntry, ActivityHistory, FileList, HealthReport, RemoteFileRecord};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileAck {
    pub filename: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchResult {
    #[serde(rename = "count")]
    pub accepted_count: usize,
    #[serde(default, rename = "files")]
    pub per_file_acks: Option<Vec<FileAck>>,
}

/// Services the client consumes. Implemented over HTTP in production and
/// by in-memory fakes in tests.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn submit_batch(
        &self,
        category: FileCategory,
        files: &[FilePayload],
    ) -> Result<BatchResult, TransportError>;

    async fn fetch_file_list(&self, limit: usize) -> Result<Vec<RemoteFileRecord>, TransportError>;

    async fn fetch_health(&self) -> Result<HealthReport, TransportError>;

    async fn fetch_activity_history(&self, limit: usize) -> Result<Vec<ActivityEntry>, TransportError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn upload_path(category: FileCategory) -> &'static str {
        match category {
            FileCategory::Media => "/api/upload/media",
            FileCategory::Structured => "/api/upload/json",
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body)
                    .unwrap_or_else(|| format!("Request failed with status {}", status)),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Pull the human-readable reason out of an error body, if it has one.
fn rejection_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl UploadBackend for HttpBackend {
    async fn submit_batch(
        &self,
        category: FileCategory,
        files: &[FilePayload],
    ) -> Result<BatchResult, TransportError> {
        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.url(Self::upload_path(category)))
            .multipart(form)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn fetch_file_list(&self, limit: usize) -> Result<Vec<RemoteFileRecord>, TransportError> {
        let response = self
            .client
            .get(self.url("/api/files"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let list: FileList = Self::read_json(response).await?;
        Ok(list.files)
    }

    async fn fetch_health(&self) -> Result<HealthReport, TransportError> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        Self::read_json(response).await
    }

    async fn fetch_activity_history(&self, limit: usize) -> Result<Vec<ActivityEntry>, TransportError> {
        let response = self
            .client
            .get(self.url("/api/history"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let history: ActivityHistory = Self::read_json(response).await?;
        Ok(history.logs)
    }
}

/// Issues exactly one backend call per batch. Never retries.
#[derive(Clone)]
pub struct UploadSubmitter {
    backend: Arc<dyn UploadBackend>,
}

impl UploadSubmitter {
    pub fn new(backend: Arc<dyn UploadBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, batch: &Batch) -> Result<BatchResult, TransportError> {
        let files: Vec<FilePayload> = batch.files().cloned().collect();
        info!(
            "Uploading {} {} file(s) in batch {}",
            files.len(),
            batch.category.label(),
            batch.id
        );

        let result = self.backend.submit_batch(batch.category, &files).await?;
        debug!("Batch {} acknowledged: {:?}", batch.id, result);
        Ok(result)
    }
}
