//! Removal of free-text setup notes.
//!
//! Setup technique descriptions can carry identifying remarks that the export
//! pseudonymization does not cover.

use rtprep_records::{Record, tags};

/// Remove every setup technique description from the plan. Returns how many were removed.
pub fn remove_setup_notes(plan: &mut Record) -> usize {
    plan.remove(tags::SETUP_TECHNIQUE_DESCRIPTION)
}
