//! Domain types and pure logic for the printlab mockup subsystem.
//!
//! Nothing in this crate performs I/O. It defines the design-file model,
//! the print-file catalog and placement resolver, text-asset layout, and
//! the mockup task state machine shared by the compositor, the backend
//! client and the pipeline.

pub mod composite;
pub mod design;
pub mod error;
pub mod print_file;
pub mod task;
pub mod text;

pub use composite::CompositeImage;
pub use design::{group_by_placement, DesignFile, DesignFileId, PlacementGroup, Position};
pub use error::CoreError;
pub use print_file::{PrintArea, PrintFile, PrintFileCatalog, VariantPrintFiles};
pub use task::{MockupFormat, TaskState, TaskStatus};
