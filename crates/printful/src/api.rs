//! REST client for the marketplace backend's Printful endpoints.
//!
//! Wraps mockup-task creation, task status, the print-file catalog and the
//! shared file-upload endpoint using [`reqwest`].

use async_trait::async_trait;
use printlab_core::{MockupFormat, Position, PrintFileCatalog, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{CatalogSource, FileUploader, MockupTaskService, TaskStatusSource};
use crate::config::ClientConfig;

/// HTTP client for one backend instance.
#[derive(Clone)]
pub struct PrintfulApi {
    client: reqwest::Client,
    api_url: String,
    upload_path: String,
}

/// One placement's artwork in a mockup-task request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFile {
    pub placement: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Body of `POST /api/printful/mockup-generator/create-task`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTaskRequest {
    pub variant_ids: Vec<u64>,
    pub format: MockupFormat,
    pub files: Vec<TaskFile>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    result: Option<StatusResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    #[serde(default)]
    mockup_url: Option<String>,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Task creation succeeded at HTTP level but carried no task key.
    #[error("Mockup task response has no task key: {response}")]
    MissingTaskKey { response: Value },

    /// Upload succeeded at HTTP level but carried no file URL.
    #[error("Upload response has no file URL: {response}")]
    MissingFileUrl { response: Value },

    /// The response body did not have the expected shape.
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

impl PrintfulApi {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_path: config.upload_path.clone(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a mockup-generation task and return its task key.
    pub async fn create_mockup_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/printful/mockup-generator/create-task", self.api_url))
            .json(request)
            .send()
            .await?;

        let body: Value = Self::parse_response(response).await?;
        let task_key = body
            .pointer("/result/task_key")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingTaskKey {
                response: body.clone(),
            })?;

        tracing::info!(
            task_key = %task_key,
            variants = request.variant_ids.len(),
            files = request.files.len(),
            format = %request.format,
            "Mockup task submitted",
        );
        Ok(task_key)
    }

    /// Fetch the current status of a mockup task.
    pub async fn mockup_task_status(&self, task_key: &str) -> Result<TaskStatus, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/printful/mockup-tasks/{}",
                self.api_url,
                urlencoding::encode(task_key)
            ))
            .send()
            .await?;

        let body: StatusResponse = Self::parse_response(response).await?;
        match body.status.as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => body
                .result
                .and_then(|r| r.mockup_url)
                .filter(|u| !u.is_empty())
                .map(|mockup_url| TaskStatus::Completed { mockup_url })
                .ok_or_else(|| {
                    ApiError::MalformedResponse(format!(
                        "task {task_key} completed without a mockup_url"
                    ))
                }),
            "failed" => Ok(TaskStatus::Failed {
                error: describe_error(body.error),
            }),
            other => Err(ApiError::MalformedResponse(format!(
                "task {task_key} has unknown status '{other}'"
            ))),
        }
    }

    /// Load the print-file catalog of a catalog product.
    pub async fn print_files(&self, product_id: u64) -> Result<PrintFileCatalog, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/printful/mockup-generator/printfiles/{}",
                self.api_url, product_id
            ))
            .send()
            .await?;

        let envelope: Envelope<PrintFileCatalog> = Self::parse_response(response).await?;
        let mut catalog = envelope.result;
        if catalog.product_id == 0 {
            catalog.product_id = product_id;
        }
        Ok(catalog)
    }

    /// Upload a file through the shared upload endpoint, returning its URL.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<String, ApiError> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}{}", self.api_url, self.upload_path))
            .multipart(form)
            .send()
            .await?;

        let body: Value = Self::parse_response(response).await?;
        let file_url = body
            .pointer("/result/file_url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingFileUrl {
                response: body.clone(),
            })?;

        tracing::info!(filename, bytes = size, file_url = %file_url, "File uploaded");
        Ok(file_url)
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, otherwise an
    /// [`ApiError::Status`] with the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

/// Render the backend's `error` field, which may be a string or an object.
fn describe_error(error: Option<Value>) -> String {
    match error {
        Some(Value::String(msg)) => msg,
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map).to_string()),
        Some(Value::Null) | None => "mockup task failed".to_string(),
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl TaskStatusSource for PrintfulApi {
    async fn task_status(&self, task_key: &str) -> Result<TaskStatus, ApiError> {
        self.mockup_task_status(task_key).await
    }
}

#[async_trait]
impl MockupTaskService for PrintfulApi {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        self.create_mockup_task(request).await
    }
}

#[async_trait]
impl FileUploader for PrintfulApi {
    async fn upload(&self, bytes: Vec<u8>, filename: &str, mime: &str) -> Result<String, ApiError> {
        self.upload_file(bytes, filename, mime).await
    }
}

#[async_trait]
impl CatalogSource for PrintfulApi {
    async fn catalog(&self, product_id: u64) -> Result<PrintFileCatalog, ApiError> {
        self.print_files(product_id).await
    }
}
