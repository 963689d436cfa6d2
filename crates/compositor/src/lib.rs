//! Raster compositing of design overlays onto a placement's print area.
//!
//! - [`loader`]: [`AssetLoader`] seam plus the default `data:`/HTTP loader.
//! - [`text`]: rasterizes inline text assets with a system or configured font.
//! - [`compose`]: [`Compositor`], which merges a placement's design files
//!   into a single PNG of exactly the print-area size.

pub mod compose;
pub mod data_url;
pub mod error;
pub mod loader;
pub mod text;

pub use compose::{ClipRect, Compositor, OverlayRect};
pub use error::CompositeError;
pub use loader::{AssetLoader, DefaultAssetLoader, LoadedAsset};
pub use printlab_core::CompositeImage;
pub use text::TextRenderer;
