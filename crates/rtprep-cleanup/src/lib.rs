//! # rtprep-cleanup
//!
//! Normalizes exported treatment records against the cleanup manifest.
//!
//! Per manifest entry the pipeline runs, in order:
//!
//! 1. [`matcher`]: find the plan by label and its dose by reference field
//! 2. [`fractions`]: prescribe the delivered fraction count and rescale the dose grid
//! 3. [`identity`]: number the plan `P{n}` and keep the old label as its name
//! 4. [`anatomy`]: rename heart and esophagus regions (first plan of a patient only)
//! 5. [`scrub`]: drop setup notes
//!
//! and then persists plan and dose. [`extraction`] holds the file-count check
//! that runs before cleanup.

pub mod anatomy;
pub mod context;
pub mod extraction;
pub mod fractions;
pub mod identity;
pub mod matcher;
pub mod pipeline;
pub mod scrub;

pub use anatomy::{LabelPattern, LabelRule, LabelRuleSet};
pub use context::EntryContext;
pub use extraction::ExtractionQc;
pub use fractions::FractionRescale;
pub use identity::{PlanRelabel, plan_ordinal};
pub use matcher::{CrossReferenceMatcher, MatchedRecord};
pub use pipeline::CleanupPipeline;
