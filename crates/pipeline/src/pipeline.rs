//! End-to-end mockup generation: merge placements, submit the task, poll.

use std::sync::Arc;

use printlab_core::{DesignFile, MockupFormat, PrintFileCatalog};
use printlab_printful::{
    poll_mockup_status, ApiError, CatalogSource, CreateTaskRequest, MockupTaskService, PollConfig,
    PollError, TaskFile, TaskStatusSource,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::merge::{MergeError, MergeOrchestrator};

/// A request to preview one product with a set of design files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupJob {
    pub product_id: u64,
    pub variant_ids: Vec<u64>,
    #[serde(default)]
    pub format: MockupFormat,
    pub files: Vec<DesignFile>,
    /// Print-file catalog; fetched from the backend when absent.
    #[serde(default)]
    pub catalog: Option<PrintFileCatalog>,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockupOutcome {
    pub task_key: String,
    pub mockup_url: String,
    /// The per-placement files that were submitted.
    pub files: Vec<DesignFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid mockup job: {0}")]
    InvalidJob(String),

    #[error("Failed to load print files for product {product_id}: {source}")]
    Catalog {
        product_id: u64,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Failed to submit mockup task: {0}")]
    Submit(#[source] ApiError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("Mockup generation cancelled")]
    Cancelled,
}

pub struct MockupPipeline {
    merger: MergeOrchestrator,
    tasks: Arc<dyn MockupTaskService>,
    status: Arc<dyn TaskStatusSource>,
    catalogs: Arc<dyn CatalogSource>,
    poll: PollConfig,
}

impl MockupPipeline {
    /// Build a pipeline whose backend calls all go through `backend`.
    pub fn new<B>(merger: MergeOrchestrator, backend: Arc<B>, poll: PollConfig) -> Self
    where
        B: MockupTaskService + TaskStatusSource + CatalogSource + 'static,
    {
        Self {
            merger,
            tasks: backend.clone(),
            status: backend.clone(),
            catalogs: backend,
            poll,
        }
    }

    pub async fn generate(
        &self,
        job: &MockupJob,
        cancel: &CancellationToken,
    ) -> Result<MockupOutcome, PipelineError> {
        validate_job(job)?;

        let catalog = match &job.catalog {
            Some(catalog) => catalog.clone(),
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                catalog = self.catalogs.catalog(job.product_id) => {
                    catalog.map_err(|source| PipelineError::Catalog {
                        product_id: job.product_id,
                        source,
                    })?
                }
            },
        };

        let files = self
            .merger
            .merge(&job.files, &catalog, cancel)
            .await
            .map_err(|e| match e {
                MergeError::Cancelled => PipelineError::Cancelled,
                other => PipelineError::Merge(other),
            })?;

        let request = build_task_request(job, &files);
        let task_key = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            key = self.tasks.create_task(&request) => key.map_err(PipelineError::Submit)?,
        };

        tracing::info!(
            product_id = job.product_id,
            task_key = %task_key,
            placements = files.len(),
            "Polling mockup task",
        );

        let mockup_url = poll_mockup_status(self.status.as_ref(), &task_key, &self.poll, cancel)
            .await
            .map_err(|e| match e {
                PollError::Cancelled { .. } => PipelineError::Cancelled,
                other => PipelineError::Poll(other),
            })?;

        Ok(MockupOutcome {
            task_key,
            mockup_url,
            files,
        })
    }
}

fn validate_job(job: &MockupJob) -> Result<(), PipelineError> {
    if job.variant_ids.is_empty() {
        return Err(PipelineError::InvalidJob(
            "at least one variant id is required".to_string(),
        ));
    }
    if job.files.is_empty() {
        return Err(PipelineError::InvalidJob(
            "at least one design file is required".to_string(),
        ));
    }
    Ok(())
}

/// One task file per (merged) design file.
pub fn build_task_request(job: &MockupJob, files: &[DesignFile]) -> CreateTaskRequest {
    CreateTaskRequest {
        variant_ids: job.variant_ids.clone(),
        format: job.format,
        files: files
            .iter()
            .map(|f| TaskFile {
                placement: f.placement.clone(),
                image_url: f.url.clone(),
                position: Some(f.position),
            })
            .collect(),
    }
}
