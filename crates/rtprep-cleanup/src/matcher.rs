//! Cross-reference matching of plan and dose records.
//!
//! File names are only a pre-filter. A plan is identified by its label, and
//! its dose by the dose's referenced-instance field pointing at the plan's
//! instance uid. Candidates are read in path order and the first match wins.

use std::path::{Path, PathBuf};

use rtprep_core::UnitError;
use rtprep_records::{Depth, Record, RecordKind, RecordPatterns, RecordStore, tags};

/// A record together with the path it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRecord {
    pub path: PathBuf,
    pub record: Record,
}

pub struct CrossReferenceMatcher<'a, S> {
    store: &'a S,
    patterns: &'a RecordPatterns,
}

impl<'a, S: RecordStore> CrossReferenceMatcher<'a, S> {
    pub const fn new(store: &'a S, patterns: &'a RecordPatterns) -> Self {
        Self { store, patterns }
    }

    /// The plan under `patient_dir` whose label equals `plan_key`.
    pub fn find_plan(
        &self,
        patient_dir: &Path,
        plan_key: &str,
    ) -> Result<Option<MatchedRecord>, UnitError> {
        self.first_matching(patient_dir, RecordKind::Plan, |record| {
            record.text(tags::RT_PLAN_LABEL).as_deref() == Some(plan_key)
        })
    }

    /// The dose under `patient_dir` that references the plan instance `plan_uid`.
    pub fn find_dose(
        &self,
        patient_dir: &Path,
        plan_uid: &str,
    ) -> Result<Option<MatchedRecord>, UnitError> {
        self.first_matching(patient_dir, RecordKind::Dose, |record| {
            record.text(tags::REFERENCED_SOP_INSTANCE_UID).as_deref() == Some(plan_uid)
        })
    }

    fn first_matching(
        &self,
        patient_dir: &Path,
        kind: RecordKind,
        predicate: impl Fn(&Record) -> bool,
    ) -> Result<Option<MatchedRecord>, UnitError> {
        let candidates = self
            .patterns
            .find(patient_dir, kind, Depth::Recursive)
            .map_err(UnitError::external)?;

        for path in candidates {
            let record = match self.store.read(&path) {
                Ok(record) => record,
                Err(error) => {
                    tracing::debug!(%error, ?kind, "skipping unreadable candidate");
                    continue;
                }
            };
            if predicate(&record) {
                return Ok(Some(MatchedRecord { path, record }));
            }
        }
        Ok(None)
    }
}
