//! Per-entry processing context.

use std::path::{Path, PathBuf};

use rtprep_core::{CleanupManifest, ManifestEntry, PlanSlot};

use crate::identity::plan_ordinal;

/// Everything one manifest entry needs from the rest of the batch.
///
/// Built fresh for every entry so that no stage keeps state between entries.
#[derive(Debug, Clone)]
pub struct EntryContext<'a> {
    pub entry: &'a ManifestEntry,
    /// Numbering slots of the same patient, in manifest order, including
    /// `entry` and any line rejected for its fraction count.
    pub patient_slots: Vec<&'a PlanSlot>,
    /// `<workdir>/<patient key>`.
    pub patient_dir: PathBuf,
}

impl<'a> EntryContext<'a> {
    #[must_use]
    pub fn new(manifest: &'a CleanupManifest, entry: &'a ManifestEntry, workdir: &Path) -> Self {
        Self {
            entry,
            patient_slots: manifest.slots_for_patient(&entry.patient_key).collect(),
            patient_dir: workdir.join(&entry.patient_key),
        }
    }

    /// 1-based plan number of this entry within its patient.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        plan_ordinal(
            &self.patient_slots,
            &self.entry.plan_key,
            self.entry.first_fraction_date,
        )
    }

    /// Whether this entry carries the patient's first plan key in manifest order.
    #[must_use]
    pub fn is_first_plan(&self) -> bool {
        self.patient_slots
            .first()
            .is_some_and(|first| first.plan_key == self.entry.plan_key)
    }
}
