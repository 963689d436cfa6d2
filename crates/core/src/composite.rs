//! The merged raster produced for a placement with several design files.

/// One placement's composited design, encoded as PNG.
///
/// Owns its bytes; dropping it releases the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeImage {
    pub placement: String,
    /// Generated filename, e.g. `composite-front-<uuid>.png`.
    pub filename: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CompositeImage {
    pub const MIME_TYPE: &'static str = "image/png";
}
