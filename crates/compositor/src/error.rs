use printlab_core::CoreError;

/// Errors raised while building a composite image.
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    /// No design files were supplied for the placement.
    #[error("Cannot composite placement '{placement}': no design files")]
    EmptyInput { placement: String },

    /// An asset could not be fetched or decoded. Aborts the whole composite.
    #[error("Failed to load asset '{filename}': {reason}")]
    AssetLoad { filename: String, reason: String },

    /// The print area has no pixels to draw on.
    #[error("Cannot composite placement '{placement}': print area is {width}x{height}")]
    EmptyPrintArea {
        placement: String,
        width: u32,
        height: u32,
    },

    /// A design file carries an unusable position.
    #[error("Invalid position for '{filename}': {source}")]
    InvalidPosition {
        filename: String,
        #[source]
        source: CoreError,
    },

    /// A text asset was found but no font could be loaded to render it.
    #[error("No font available to render text: {0}")]
    FontUnavailable(String),

    /// The drawing task stopped before producing a canvas.
    #[error("Compositing task failed: {0}")]
    Render(String),

    /// PNG encoding of the finished canvas failed.
    #[error("Failed to encode composite: {0}")]
    Encode(#[from] image::ImageError),

    /// The caller cancelled the operation.
    #[error("Compositing cancelled")]
    Cancelled,
}

impl CompositeError {
    pub(crate) fn asset(filename: &str, reason: impl std::fmt::Display) -> Self {
        CompositeError::AssetLoad {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }
    }
}
