//! Merging several design files on one placement into a single upload.
//!
//! Placements with one file pass through untouched. Placements with more
//! are composited at print-area size, uploaded, and replaced by a single
//! design file spanning the whole print area.

use std::sync::Arc;

use printlab_compositor::{CompositeError, Compositor};
use printlab_core::{
    group_by_placement, CoreError, DesignFile, PlacementGroup, Position, PrintFileCatalog,
};
use printlab_printful::{upload_composite, ApiError, FileUploader};
use tokio_util::sync::CancellationToken;

/// What to do when a placement cannot be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeFailurePolicy {
    /// Fail the whole merge with the placement's error.
    #[default]
    Surface,
    /// Keep only the most recently added file of the placement and log the
    /// dropped ones.
    FallbackToLatest,
}

/// Why one placement could not be merged.
#[derive(Debug, thiserror::Error)]
pub enum PlacementMergeError {
    #[error(transparent)]
    PrintArea(#[from] CoreError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error("Composite upload failed: {0}")]
    Upload(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Failed to merge designs on placement '{placement}': {source}")]
    Placement {
        placement: String,
        #[source]
        source: PlacementMergeError,
    },

    #[error("Design merge cancelled")]
    Cancelled,
}

pub struct MergeOrchestrator {
    compositor: Arc<Compositor>,
    uploader: Arc<dyn FileUploader>,
    policy: MergeFailurePolicy,
}

impl MergeOrchestrator {
    pub fn new(
        compositor: Arc<Compositor>,
        uploader: Arc<dyn FileUploader>,
        policy: MergeFailurePolicy,
    ) -> Self {
        Self {
            compositor,
            uploader,
            policy,
        }
    }

    pub fn policy(&self) -> MergeFailurePolicy {
        self.policy
    }

    /// Reduce `files` to at most one design file per placement.
    ///
    /// Output follows the order in which placements first appear.
    pub async fn merge(
        &self,
        files: &[DesignFile],
        catalog: &PrintFileCatalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<DesignFile>, MergeError> {
        let groups = group_by_placement(files);
        let mut merged = Vec::with_capacity(groups.len());

        for group in groups {
            if !group.needs_merge() {
                merged.extend(group.files);
                continue;
            }

            match self.merge_group(&group, catalog, cancel).await {
                Ok(file) => merged.push(file),
                Err(PlacementMergeError::Composite(CompositeError::Cancelled)) => {
                    return Err(MergeError::Cancelled);
                }
                Err(_) if cancel.is_cancelled() => return Err(MergeError::Cancelled),
                Err(source) => merged.push(self.recover(group, source)?),
            }
        }

        Ok(merged)
    }

    async fn merge_group(
        &self,
        group: &PlacementGroup,
        catalog: &PrintFileCatalog,
        cancel: &CancellationToken,
    ) -> Result<DesignFile, PlacementMergeError> {
        let area = catalog.require_print_area(&group.placement)?;

        let composite = self
            .compositor
            .compose(&group.placement, &group.files, area, cancel)
            .await?;

        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompositeError::Cancelled.into()),
            url = upload_composite(self.uploader.as_ref(), &composite) => url?,
        };

        // The group is non-empty here, so `latest` always has a value.
        let id = group.latest().map(|f| f.id).unwrap_or(group.files[0].id);

        tracing::info!(
            placement = %group.placement,
            merged_files = group.files.len(),
            url = %url,
            "Placement designs merged",
        );

        Ok(DesignFile {
            id,
            url,
            filename: composite.filename,
            placement: group.placement.clone(),
            position: Position::full_area(area),
        })
    }

    /// Apply the failure policy to a placement that could not be merged.
    fn recover(
        &self,
        group: PlacementGroup,
        source: PlacementMergeError,
    ) -> Result<DesignFile, MergeError> {
        match self.policy {
            MergeFailurePolicy::Surface => Err(MergeError::Placement {
                placement: group.placement,
                source,
            }),
            MergeFailurePolicy::FallbackToLatest => {
                let kept = group
                    .latest()
                    .cloned()
                    .ok_or_else(|| MergeError::Placement {
                        placement: group.placement.clone(),
                        source: CompositeError::EmptyInput {
                            placement: group.placement.clone(),
                        }
                        .into(),
                    })?;
                let dropped: Vec<String> = group
                    .files
                    .iter()
                    .filter(|f| f.id != kept.id)
                    .map(|f| f.filename.clone())
                    .collect();
                tracing::warn!(
                    placement = %group.placement,
                    error = %source,
                    kept = %kept.filename,
                    dropped = ?dropped,
                    "Placement merge failed, keeping only the latest design",
                );
                Ok(kept)
            }
        }
    }
}
