//! Print-file catalog and placement resolution.
//!
//! The backend describes, per catalog product, the printable raster of each
//! placement ([`PrintFile`]) and, per variant, which print file backs which
//! placement ([`VariantPrintFiles`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Printable raster dimensions of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintArea {
    pub width: u32,
    pub height: u32,
}

/// One placement's printable area on a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintFile {
    #[serde(rename = "printfile_id")]
    pub id: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub dpi: Option<u32>,
    #[serde(default)]
    pub fill_mode: Option<String>,
    #[serde(default)]
    pub can_rotate: bool,
}

impl PrintFile {
    pub fn area(&self) -> PrintArea {
        PrintArea {
            width: self.width,
            height: self.height,
        }
    }
}

/// Placement name -> print-file id mapping for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPrintFiles {
    pub variant_id: u64,
    pub placements: BTreeMap<String, u64>,
}

/// All print files of a catalog product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrintFileCatalog {
    #[serde(default)]
    pub product_id: u64,
    /// Placement name -> human-readable label.
    #[serde(default)]
    pub available_placements: BTreeMap<String, String>,
    #[serde(default)]
    pub printfiles: Vec<PrintFile>,
    #[serde(default)]
    pub variant_printfiles: Vec<VariantPrintFiles>,
}

impl PrintFileCatalog {
    /// Print area for `placement`, looked up through the first variant.
    ///
    /// All variants of a product are assumed to share one print-file
    /// layout. When they do not, a warning is logged and the first
    /// variant still wins; use [`Self::resolve_print_area_for_variant`]
    /// when the variant is known.
    pub fn resolve_print_area(&self, placement: &str) -> Option<PrintArea> {
        let first = self.variant_printfiles.first()?;
        if !self.variants_share_layout() {
            tracing::warn!(
                product_id = self.product_id,
                placement,
                first_variant_id = first.variant_id,
                "Variants have diverging print-file layouts, resolving through the first variant",
            );
        }
        self.area_for_mapping(first, placement)
    }

    /// Print area for `placement` on a specific variant.
    pub fn resolve_print_area_for_variant(
        &self,
        variant_id: u64,
        placement: &str,
    ) -> Option<PrintArea> {
        let mapping = self
            .variant_printfiles
            .iter()
            .find(|v| v.variant_id == variant_id)?;
        self.area_for_mapping(mapping, placement)
    }

    /// Like [`Self::resolve_print_area`] but as a `NotFound` error.
    pub fn require_print_area(&self, placement: &str) -> Result<PrintArea, CoreError> {
        self.resolve_print_area(placement)
            .ok_or_else(|| CoreError::NotFound {
                entity: "print area",
                id: placement.to_string(),
            })
    }

    /// Whether every variant maps placements to the same print files.
    pub fn variants_share_layout(&self) -> bool {
        match self.variant_printfiles.split_first() {
            Some((first, rest)) => rest.iter().all(|v| v.placements == first.placements),
            None => true,
        }
    }

    pub fn print_file(&self, id: u64) -> Option<&PrintFile> {
        self.printfiles.iter().find(|p| p.id == id)
    }

    fn area_for_mapping(&self, mapping: &VariantPrintFiles, placement: &str) -> Option<PrintArea> {
        let id = mapping.placements.get(placement)?;
        self.print_file(*id).map(PrintFile::area)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn catalog() -> PrintFileCatalog {
        serde_json::from_value(serde_json::json!({
            "product_id": 71,
            "available_placements": { "front": "Front print", "back": "Back print" },
            "printfiles": [
                { "printfile_id": 1, "width": 1800, "height": 2400, "dpi": 150, "fill_mode": "fit", "can_rotate": false },
                { "printfile_id": 2, "width": 1200, "height": 1200 }
            ],
            "variant_printfiles": [
                { "variant_id": 4012, "placements": { "front": 1, "back": 2 } },
                { "variant_id": 4013, "placements": { "front": 1, "back": 2 } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn resolves_area_through_first_variant() {
        let area = catalog().resolve_print_area("front").unwrap();
        assert_eq!(area, PrintArea { width: 1800, height: 2400 });
        assert_eq!(
            catalog().resolve_print_area("back"),
            Some(PrintArea { width: 1200, height: 1200 })
        );
    }

    #[test]
    fn unknown_placement_is_not_found() {
        assert_eq!(catalog().resolve_print_area("sleeve_left"), None);
        assert_matches!(
            catalog().require_print_area("sleeve_left"),
            Err(CoreError::NotFound { entity: "print area", .. })
        );
    }

    #[test]
    fn mapping_to_missing_print_file_is_not_found() {
        let mut c = catalog();
        c.printfiles.retain(|p| p.id != 2);
        assert_eq!(c.resolve_print_area("back"), None);
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        assert_eq!(PrintFileCatalog::default().resolve_print_area("front"), None);
        assert!(PrintFileCatalog::default().variants_share_layout());
    }

    #[test]
    fn diverging_variants_still_use_first_mapping() {
        let mut c = catalog();
        c.variant_printfiles[1].placements.insert("front".into(), 2);
        assert!(!c.variants_share_layout());
        assert_eq!(
            c.resolve_print_area("front"),
            Some(PrintArea { width: 1800, height: 2400 })
        );
        assert_eq!(
            c.resolve_print_area_for_variant(4013, "front"),
            Some(PrintArea { width: 1200, height: 1200 })
        );
        assert_eq!(c.resolve_print_area_for_variant(9999, "front"), None);
    }
}
