//! Ordered compositing of a placement's design files.
//!
//! Assets load concurrently, but nothing is drawn until every load has
//! finished; drawing then follows input order, so layering never depends on
//! which download completed first. Any load failure aborts the composite.
//! Only the part of each overlay that lands on the canvas is rasterized.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use printlab_core::{CompositeImage, DesignFile, Position, PrintArea};
use tokio_util::sync::CancellationToken;

use crate::error::CompositeError;
use crate::loader::{AssetLoader, LoadedAsset};
use crate::text::TextRenderer;

/// Pixel rectangle an overlay occupies on the print-area canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Window of an overlay that falls inside the canvas, in overlay-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipRect {
    /// The whole `width` x `height` box.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

impl OverlayRect {
    /// Map a position from its editor coordinate space onto `area`.
    ///
    /// Offsets and sizes are scaled by `area / position.area_*` (1.0 when
    /// the position carries no area size). With `limit_to_print_area` the
    /// box is shrunk to fit and shifted inside the canvas.
    pub fn for_position(position: &Position, area: PrintArea) -> Self {
        let sx = scale_factor(f64::from(area.width), position.area_width);
        let sy = scale_factor(f64::from(area.height), position.area_height);

        let mut rect = Self {
            x: offset(position.left * sx),
            y: offset(position.top * sy),
            width: ((position.width * sx).round() as u32).max(1),
            height: ((position.height * sy).round() as u32).max(1),
        };

        if position.limit_to_print_area {
            rect.width = rect.width.min(area.width.max(1));
            rect.height = rect.height.min(area.height.max(1));
            let max_x = (i64::from(area.width) - i64::from(rect.width)).max(0);
            let max_y = (i64::from(area.height) - i64::from(rect.height)).max(0);
            rect.x = rect.x.clamp(0, max_x);
            rect.y = rect.y.clamp(0, max_y);
        }

        rect
    }

    /// The part of this rect that lies on `area`, or `None` when it is
    /// entirely off-canvas.
    pub fn visible_in(&self, area: PrintArea) -> Option<ClipRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self
            .x
            .saturating_add(i64::from(self.width))
            .min(i64::from(area.width));
        let y1 = self
            .y
            .saturating_add(i64::from(self.height))
            .min(i64::from(area.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(ClipRect {
            x: (x0 - self.x) as u32,
            y: (y0 - self.y) as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Offsets are kept within `u32` range so clip arithmetic cannot overflow.
fn offset(value: f64) -> i64 {
    let bound = i64::from(u32::MAX);
    (value.round() as i64).clamp(-bound, bound)
}

fn scale_factor(target: f64, source: f64) -> f64 {
    if source > 0.0 {
        target / source
    } else {
        1.0
    }
}

/// A loaded asset ready to be painted.
struct Layer {
    filename: String,
    rect: OverlayRect,
    asset: LoadedAsset,
}

/// Merges several design files into one print-area-sized PNG.
pub struct Compositor {
    loader: Arc<dyn AssetLoader>,
    text: Option<Arc<TextRenderer>>,
}

impl Compositor {
    /// Create a compositor. Without a `text` renderer, text assets fail
    /// with [`CompositeError::FontUnavailable`].
    pub fn new(loader: Arc<dyn AssetLoader>, text: Option<Arc<TextRenderer>>) -> Self {
        Self { loader, text }
    }

    /// Composite `files` (all on `placement`) onto a transparent canvas of
    /// exactly `area` size, painting in list order.
    pub async fn compose(
        &self,
        placement: &str,
        files: &[DesignFile],
        area: PrintArea,
        cancel: &CancellationToken,
    ) -> Result<CompositeImage, CompositeError> {
        if files.is_empty() {
            return Err(CompositeError::EmptyInput {
                placement: placement.to_string(),
            });
        }
        if area.width == 0 || area.height == 0 {
            return Err(CompositeError::EmptyPrintArea {
                placement: placement.to_string(),
                width: area.width,
                height: area.height,
            });
        }
        for file in files {
            file.position
                .validate()
                .map_err(|source| CompositeError::InvalidPosition {
                    filename: file.filename.clone(),
                    source,
                })?;
        }

        tracing::debug!(
            placement,
            files = files.len(),
            width = area.width,
            height = area.height,
            "Compositing placement",
        );

        let loads = files.iter().map(|file| self.loader.load(file));
        let assets = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompositeError::Cancelled),
            loaded = futures::future::try_join_all(loads) => loaded?,
        };

        let layers: Vec<Layer> = files
            .iter()
            .zip(assets)
            .map(|(file, asset)| Layer {
                filename: file.filename.clone(),
                rect: OverlayRect::for_position(&file.position, area),
                asset,
            })
            .collect();

        // Resampling and encoding are CPU-bound.
        let text = self.text.clone();
        let painting = tokio::task::spawn_blocking(move || paint(layers, text.as_deref(), area));
        let png = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompositeError::Cancelled),
            joined = painting => {
                joined.map_err(|e| CompositeError::Render(e.to_string()))??
            }
        };

        let filename = format!("composite-{placement}-{}.png", uuid::Uuid::new_v4());
        tracing::info!(
            placement,
            filename = %filename,
            bytes = png.len(),
            "Composite image created",
        );

        Ok(CompositeImage {
            placement: placement.to_string(),
            filename,
            png,
            width: area.width,
            height: area.height,
        })
    }
}

/// Draw `layers` in order on a transparent canvas and encode it as PNG.
fn paint(
    layers: Vec<Layer>,
    text: Option<&TextRenderer>,
    area: PrintArea,
) -> Result<Vec<u8>, CompositeError> {
    let mut canvas = RgbaImage::new(area.width, area.height);
    for layer in layers {
        if matches!(layer.asset, LoadedAsset::Text(_)) && text.is_none() {
            return Err(CompositeError::FontUnavailable(format!(
                "text asset '{}' needs a text renderer",
                layer.filename
            )));
        }
        let Some(clip) = layer.rect.visible_in(area) else {
            tracing::debug!(filename = %layer.filename, "Overlay lies outside the print area");
            continue;
        };

        let overlay = match (layer.asset, text) {
            (LoadedAsset::Image(img), _) => scale_clipped(&img, layer.rect, clip),
            (LoadedAsset::Text(content), Some(renderer)) => {
                renderer.render_clipped(&content, layer.rect.width, layer.rect.height, clip)
            }
            (LoadedAsset::Text(_), None) => continue,
        };
        imageops::overlay(
            &mut canvas,
            &overlay,
            layer.rect.x + i64::from(clip.x),
            layer.rect.y + i64::from(clip.y),
        );
    }

    let mut png = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Scale `img` to the overlay size, producing only the `clip` window.
///
/// The matching source region is cropped first so an oversized box never
/// allocates more than the visible pixels.
fn scale_clipped(img: &RgbaImage, rect: OverlayRect, clip: ClipRect) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbaImage::new(clip.width, clip.height);
    }
    if (src_w, src_h) == (rect.width, rect.height) {
        return imageops::crop_imm(img, clip.x, clip.y, clip.width, clip.height).to_image();
    }
    if clip == ClipRect::full(rect.width, rect.height) {
        return imageops::resize(img, rect.width, rect.height, FilterType::Lanczos3);
    }

    let (x0, x1) = source_span(clip.x, clip.width, rect.width, src_w);
    let (y0, y1) = source_span(clip.y, clip.height, rect.height, src_h);
    let source = imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image();
    imageops::resize(&source, clip.width, clip.height, FilterType::Lanczos3)
}

/// Source pixel range `[start, end)` covering `offset..offset + len` of a
/// `scaled`-pixel axis drawn from `source` pixels.
fn source_span(offset: u32, len: u32, scaled: u32, source: u32) -> (u32, u32) {
    let ratio = f64::from(source) / f64::from(scaled);
    let start = ((f64::from(offset) * ratio).floor() as u32).min(source - 1);
    let end = ((f64::from(offset + len) * ratio).ceil() as u32).clamp(start + 1, source);
    (start, end)
}
