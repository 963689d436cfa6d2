//! Uploading composited images.

use printlab_core::CompositeImage;

use crate::api::ApiError;
use crate::backend::FileUploader;

/// Upload a composite as a PNG file and return its persisted URL.
///
/// No retry is attempted; a response without a file URL is an error.
pub async fn upload_composite(
    uploader: &dyn FileUploader,
    composite: &CompositeImage,
) -> Result<String, ApiError> {
    tracing::debug!(
        placement = %composite.placement,
        filename = %composite.filename,
        bytes = composite.png.len(),
        "Uploading composite image",
    );
    uploader
        .upload(
            composite.png.clone(),
            &composite.filename,
            CompositeImage::MIME_TYPE,
        )
        .await
}
