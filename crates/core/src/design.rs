//! Design files and their placement on a garment's print area.
//!
//! A [`DesignFile`] is one asset (image or rendered text) a creator has put
//! on a named placement such as `front` or `back`. Its [`Position`] is
//! expressed in the coordinate space of the editor's print-area box
//! (`area_width` x `area_height`), matching the backend's mockup API.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::print_file::PrintArea;

/// Opaque, ordered identity of a design file.
///
/// Ids are allocated increasingly as files are added, so the highest id in
/// a placement is the most recently added file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignFileId(pub u64);

impl std::fmt::Display for DesignFileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an overlay sits inside a placement's print area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Width of the print-area box the offsets are relative to.
    pub area_width: f64,
    /// Height of the print-area box the offsets are relative to.
    pub area_height: f64,
    /// Overlay width.
    pub width: f64,
    /// Overlay height.
    pub height: f64,
    /// Offset from the top edge of the print area.
    pub top: f64,
    /// Offset from the left edge of the print area.
    pub left: f64,
    /// Whether the overlay must stay within the printable bounds.
    #[serde(default)]
    pub limit_to_print_area: bool,
}

impl Position {
    /// A position covering the whole print area, anchored at (0, 0).
    pub fn full_area(area: PrintArea) -> Self {
        let (w, h) = (f64::from(area.width), f64::from(area.height));
        Self {
            area_width: w,
            area_height: h,
            width: w,
            height: h,
            top: 0.0,
            left: 0.0,
            limit_to_print_area: true,
        }
    }

    /// Reject non-finite values and negative or zero overlay sizes.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            self.area_width,
            self.area_height,
            self.width,
            self.height,
            self.top,
            self.left,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::Validation(
                "Position values must be finite numbers".to_string(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Overlay size must be positive (got {}x{})",
                self.width, self.height
            )));
        }
        if self.area_width < 0.0 || self.area_height < 0.0 {
            return Err(CoreError::Validation(
                "Print-area size must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A user-selected asset placed on one garment area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignFile {
    pub id: DesignFileId,
    /// HTTP(S) URL or `data:` URL of the asset.
    pub url: String,
    /// Display filename; `.txt` marks inline text assets.
    pub filename: String,
    /// Placement name, e.g. `front`.
    pub placement: String,
    pub position: Position,
}

/// All design files assigned to one placement, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGroup {
    pub placement: String,
    pub files: Vec<DesignFile>,
}

impl PlacementGroup {
    /// Whether this placement needs compositing (more than one file).
    pub fn needs_merge(&self) -> bool {
        self.files.len() > 1
    }

    /// The most recently added file (highest id), if any.
    pub fn latest(&self) -> Option<&DesignFile> {
        self.files.iter().max_by_key(|f| f.id)
    }
}

/// Group design files by placement.
///
/// Groups appear in the order their placement is first seen, and files keep
/// their input order within a group (that order is the paint order).
pub fn group_by_placement(files: &[DesignFile]) -> Vec<PlacementGroup> {
    let mut groups: Vec<PlacementGroup> = Vec::new();
    for file in files {
        match groups.iter_mut().find(|g| g.placement == file.placement) {
            Some(group) => group.files.push(file.clone()),
            None => groups.push(PlacementGroup {
                placement: file.placement.clone(),
                files: vec![file.clone()],
            }),
        }
    }
    groups
}
