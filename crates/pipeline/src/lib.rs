//! Mockup generation pipeline.
//!
//! [`MergeOrchestrator`] collapses multi-design placements into single
//! composited uploads; [`MockupPipeline`] runs merge, task submission and
//! status polling for one [`MockupJob`].

pub mod merge;
pub mod pipeline;

pub use merge::{MergeError, MergeFailurePolicy, MergeOrchestrator, PlacementMergeError};
pub use pipeline::{build_task_request, MockupJob, MockupOutcome, MockupPipeline, PipelineError};
