//! Inline text assets and their layout inside an overlay box.
//!
//! Text design files carry their content in a `data:text/plain` URL and a
//! `.txt` filename. They are rendered, not fetched.

use crate::design::DesignFile;

/// URL prefix marking an inline text asset.
pub const TEXT_URL_PREFIX: &str = "data:text/plain";

/// Font size as a fraction of the box height.
pub const FONT_SIZE_RATIO: f32 = 0.6;

/// Upper bound on the font size in pixels.
pub const MAX_FONT_SIZE: f32 = 48.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Whether a design file is an inline text asset.
pub fn is_text_asset(file: &DesignFile) -> bool {
    file.filename.to_ascii_lowercase().ends_with(".txt") && file.url.starts_with(TEXT_URL_PREFIX)
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Horizontal centre of the line.
    pub center_x: f32,
    /// Vertical centre of the line.
    pub center_y: f32,
}

/// Centred, multi-line layout of a text block in a `width` x `height` box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub lines: Vec<TextLine>,
}

impl TextLayout {
    pub fn compute(text: &str, width: f32, height: f32) -> Self {
        let font_size = (height * FONT_SIZE_RATIO).min(MAX_FONT_SIZE);
        let line_height = font_size * LINE_HEIGHT_FACTOR;
        let parts: Vec<&str> = text.split('\n').collect();
        let block_height = line_height * parts.len() as f32;
        let first_center = height / 2.0 - block_height / 2.0 + line_height / 2.0;

        let lines = parts
            .into_iter()
            .enumerate()
            .map(|(i, line)| TextLine {
                text: line.to_string(),
                center_x: width / 2.0,
                center_y: first_center + line_height * i as f32,
            })
            .collect();

        Self {
            font_size,
            line_height,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{DesignFileId, Position};

    fn asset(filename: &str, url: &str) -> DesignFile {
        DesignFile {
            id: DesignFileId(1),
            url: url.to_string(),
            filename: filename.to_string(),
            placement: "front".to_string(),
            position: Position {
                area_width: 100.0,
                area_height: 100.0,
                width: 100.0,
                height: 40.0,
                top: 0.0,
                left: 0.0,
                limit_to_print_area: true,
            },
        }
    }

    #[test]
    fn detects_text_assets_by_filename_and_url() {
        assert!(is_text_asset(&asset("hello.txt", "data:text/plain;base64,aGk=")));
        assert!(is_text_asset(&asset("HELLO.TXT", "data:text/plain,hi")));
        assert!(!is_text_asset(&asset("hello.png", "data:text/plain,hi")));
        assert!(!is_text_asset(&asset("hello.txt", "https://cdn.example.com/hello.txt")));
    }

    #[test]
    fn font_size_is_sixty_percent_of_height() {
        let layout = TextLayout::compute("hi", 100.0, 40.0);
        assert!((layout.font_size - 24.0).abs() < f32::EPSILON);
    }

    #[test]
    fn font_size_is_capped() {
        let layout = TextLayout::compute("hi", 400.0, 400.0);
        assert_eq!(layout.font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn single_line_is_centred() {
        let layout = TextLayout::compute("hi", 100.0, 40.0);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.lines[0].center_x, 50.0);
        assert!((layout.lines[0].center_y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn multi_line_splits_with_even_spacing() {
        let layout = TextLayout::compute("one\ntwo\nthree", 200.0, 60.0);
        // 0.6 * 60 = 36px font, 43.2px lines.
        assert_eq!(layout.lines.len(), 3);
        assert_eq!(
            layout.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        let gap_a = layout.lines[1].center_y - layout.lines[0].center_y;
        let gap_b = layout.lines[2].center_y - layout.lines[1].center_y;
        assert!((gap_a - layout.line_height).abs() < 1e-4);
        assert!((gap_b - layout.line_height).abs() < 1e-4);
        // The block is centred around the box middle.
        assert!((layout.lines[1].center_y - 30.0).abs() < 1e-4);
    }
}
