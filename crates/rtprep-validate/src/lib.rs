//! # rtprep-validate
//!
//! Checks the research store against the clinical source of truth, and
//! collects dose metrics from it once it is trusted.
//!
//! - [`ResearchStore`]: the downstream data, one open patient at a time, with
//!   [`PatientSession`] guaranteeing the patient is closed again
//! - [`CrossValidator`]: seven agreement checks per patient, plus the direct
//!   intensity sample reported alongside them
//! - [`Collector`]: course mean dose and volume-at-dose per patient

pub mod collection;
pub mod error;
pub mod model;
pub mod reference;
pub mod sampling;
pub mod store;
pub mod validator;

pub use collection::Collector;
pub use error::StoreError;
pub use model::{Course, Dvh, DvhPoint, Image, Patient, PlanSetup, PlanSum, Structure, StructureSet};
pub use reference::{PrefixPreferenceStrategy, Reference, ReferenceStrategy};
pub use store::{JsonResearchStore, PatientSession, ResearchStore};
pub use validator::{CrossValidator, Tolerances};
