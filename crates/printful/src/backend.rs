//! Trait seams over the backend, implemented by
//! [`PrintfulApi`](crate::PrintfulApi) and by test doubles.

use async_trait::async_trait;
use printlab_core::{PrintFileCatalog, TaskStatus};

use crate::api::{ApiError, CreateTaskRequest};

/// Reports the status of a mockup task.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task_key: &str) -> Result<TaskStatus, ApiError>;
}

/// Submits mockup-generation tasks.
#[async_trait]
pub trait MockupTaskService: Send + Sync {
    /// Submit a task, returning its task key.
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError>;
}

/// Stores a file and returns a URL the mockup service can read.
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str, mime: &str) -> Result<String, ApiError>;
}

/// Provides print-file catalogs by product id.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn catalog(&self, product_id: u64) -> Result<PrintFileCatalog, ApiError>;
}
