//! Rasterization of inline text assets.
//!
//! Fonts are discovered with [`fontdb`] (an explicitly configured file
//! first, otherwise the system's sans-serif face) and glyphs are drawn with
//! [`rusttype`]. Layout comes from [`printlab_core::text::TextLayout`].

use std::path::Path;

use image::{Rgba, RgbaImage};
use printlab_core::text::TextLayout;
use rusttype::{point, Font, Scale};

use crate::compose::ClipRect;
use crate::error::CompositeError;

/// Glyph colour.
const TEXT_COLOR: [u8; 3] = [0, 0, 0];

/// Renders text blocks into transparent RGBA images.
pub struct TextRenderer {
    font: Font<'static>,
}

impl TextRenderer {
    /// Load a renderer from `font_path`, or from system fonts when `None`.
    pub fn load(font_path: Option<&Path>) -> Result<Self, CompositeError> {
        let mut db = fontdb::Database::new();
        match font_path {
            Some(path) => db.load_font_file(path).map_err(|e| {
                CompositeError::FontUnavailable(format!("{}: {e}", path.display()))
            })?,
            None => db.load_system_fonts(),
        }

        let id = db
            .query(&fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..fontdb::Query::default()
            })
            .or_else(|| db.faces().next().map(|face| face.id))
            .ok_or_else(|| CompositeError::FontUnavailable("no font faces found".to_string()))?;

        let font = db
            .with_face_data(id, |data, index| {
                Font::try_from_vec_and_index(data.to_vec(), index)
            })
            .flatten()
            .ok_or_else(|| {
                CompositeError::FontUnavailable("font data could not be parsed".to_string())
            })?;

        tracing::debug!(faces = db.len(), "Text renderer font loaded");
        Ok(Self { font })
    }

    /// Build a renderer from raw TrueType/OpenType bytes.
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, CompositeError> {
        Font::try_from_vec(bytes)
            .map(|font| Self { font })
            .ok_or_else(|| {
                CompositeError::FontUnavailable("font data could not be parsed".to_string())
            })
    }

    /// Render `text` centred in a `width` x `height` transparent image.
    pub fn render(&self, text: &str, width: u32, height: u32) -> RgbaImage {
        self.render_clipped(text, width, height, ClipRect::full(width, height))
    }

    /// Lay `text` out in a `width` x `height` box but produce only the
    /// `clip` window of it.
    pub fn render_clipped(&self, text: &str, width: u32, height: u32, clip: ClipRect) -> RgbaImage {
        let mut canvas = RgbaImage::new(clip.width, clip.height);
        let layout = TextLayout::compute(text, width as f32, height as f32);
        let scale = Scale::uniform(layout.font_size);
        let v_metrics = self.font.v_metrics(scale);
        let (left, top) = (i64::from(clip.x), i64::from(clip.y));
        let (right, bottom) = (left + i64::from(clip.width), top + i64::from(clip.height));

        for line in &layout.lines {
            let line_width = self.line_width(&line.text, scale);
            let origin_x = line.center_x - line_width / 2.0;
            // Middle baseline: centre the ascent/descent span on the line centre.
            let baseline = line.center_y + (v_metrics.ascent + v_metrics.descent) / 2.0;

            for glyph in self.font.layout(&line.text, scale, point(origin_x, baseline)) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, coverage| {
                    let x = i64::from(bb.min.x) + i64::from(gx);
                    let y = i64::from(bb.min.y) + i64::from(gy);
                    if x < left || y < top || x >= right || y >= bottom {
                        return;
                    }
                    let alpha = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
                    let pixel = canvas.get_pixel_mut((x - left) as u32, (y - top) as u32);
                    if alpha > pixel[3] {
                        *pixel = Rgba([TEXT_COLOR[0], TEXT_COLOR[1], TEXT_COLOR[2], alpha]);
                    }
                });
            }
        }

        canvas
    }

    fn line_width(&self, text: &str, scale: Scale) -> f32 {
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .fold(0.0, f32::max)
    }
}
