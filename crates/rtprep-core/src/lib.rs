//! # rtprep-core
//!
//! Core types shared by every rtprep crate.
//!
//! - Manifest line types and tab-delimited parsing for the three control lists
//! - The per-unit error taxonomy (`UnitError`) used by every batch stage
//! - Outcome enums written into reports
//! - 3-D points and half-to-even rounding used by the tolerance checks
//! - Report row types and the self-describing report document

pub mod enums;
pub mod errors;
pub mod geometry;
pub mod manifest;
pub mod numeric;
pub mod reports;

pub use errors::{ManifestError, UnitError};
pub use geometry::Point3;
pub use manifest::{
    CleanupManifest, ExtractionManifest, ManifestEntry, PlanSlot, RejectedLine, ValidationManifest,
};
