//! The per-entry cleanup pipeline.
//!
//! Every manifest entry is processed on its own and produces exactly one
//! [`CleanupRow`]. A failing entry is logged and reported, and the batch moves
//! on. Plan and dose are written only after every step of the entry has
//! succeeded, plan first. Structure sets are written by the anatomy step itself.

use std::path::{Path, PathBuf};

use rtprep_core::reports::CleanupRow;
use rtprep_core::{CleanupManifest, ManifestEntry, RejectedLine, UnitError};
use rtprep_records::{RecordPatterns, RecordStore, tags};

use crate::anatomy::LabelRuleSet;
use crate::context::EntryContext;
use crate::fractions;
use crate::identity;
use crate::matcher::CrossReferenceMatcher;
use crate::scrub;

pub struct CleanupPipeline<'a, S> {
    store: &'a S,
    patterns: &'a RecordPatterns,
    workdir: PathBuf,
    rules: LabelRuleSet,
}

impl<'a, S: RecordStore> CleanupPipeline<'a, S> {
    pub fn new(store: &'a S, patterns: &'a RecordPatterns, workdir: &Path) -> Self {
        Self {
            store,
            patterns,
            workdir: workdir.to_path_buf(),
            rules: LabelRuleSet::default(),
        }
    }

    /// Replace the anatomy rule table.
    #[must_use]
    pub fn with_rules(mut self, rules: LabelRuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Process every entry, calling `on_row` after each one. Rows come back in manifest line order.
    pub fn run(
        &self,
        manifest: &CleanupManifest,
        mut on_row: impl FnMut(&CleanupRow),
    ) -> Vec<CleanupRow> {
        let _span = tracing::info_span!("cleanup", entries = manifest.entries.len()).entered();

        let mut rows = manifest
            .rejected
            .iter()
            .map(rejected_row)
            .inspect(|row| on_row(row))
            .collect::<Vec<_>>();
        for entry in &manifest.entries {
            let row = self.process(manifest, entry);
            on_row(&row);
            rows.push(row);
        }
        rows.sort_by_key(|row| row.line);
        rows
    }

    /// Process a single entry of `manifest`.
    pub fn process(&self, manifest: &CleanupManifest, entry: &ManifestEntry) -> CleanupRow {
        let _span = tracing::info_span!(
            "entry",
            study = %entry.patient_key,
            plan = %entry.plan_key,
            line = entry.line
        )
        .entered();

        let context = EntryContext::new(manifest, entry, &self.workdir);
        let mut row = CleanupRow::pending(&entry.patient_key, entry.line, &entry.plan_key);
        match self.normalize(&context, &mut row) {
            Ok(()) => tracing::info!(label = ?row.new_label, "plan normalized"),
            Err(error) => {
                tracing::warn!(%error, "entry skipped");
                row.outcome = error.outcome();
                row.message = Some(error.to_string());
            }
        }
        row
    }

    fn normalize(&self, context: &EntryContext<'_>, row: &mut CleanupRow) -> Result<(), UnitError> {
        let entry = context.entry;
        let matcher = CrossReferenceMatcher::new(self.store, self.patterns);

        let mut plan = matcher
            .find_plan(&context.patient_dir, &entry.plan_key)?
            .ok_or_else(|| {
                UnitError::resolution(
                    "plan",
                    format!(
                        "no plan labelled '{}' under {}",
                        entry.plan_key,
                        context.patient_dir.display()
                    ),
                )
            })?;
        let plan_uid = plan
            .record
            .text(tags::SOP_INSTANCE_UID)
            .map(std::borrow::Cow::into_owned)
            .ok_or_else(|| UnitError::parse("SOPInstanceUID", "missing in plan record"))?;
        let mut dose = matcher
            .find_dose(&context.patient_dir, &plan_uid)?
            .ok_or_else(|| {
                UnitError::resolution("dose", format!("no dose references plan {plan_uid}"))
            })?;

        let rescale =
            fractions::rescale(&mut plan.record, &mut dose.record, entry.delivered_fractions)?;
        row.fractions_before = Some(rescale.old_fractions);
        row.fractions_after = Some(rescale.new_fractions);
        row.dose_scale_before = Some(rescale.old_scale);
        row.dose_scale_after = Some(rescale.new_scale);

        let relabel = identity::relabel(&mut plan.record, context.ordinal())?;
        row.new_label = Some(relabel.new_label);

        if context.is_first_plan() {
            row.renamed_structures = self.rules.normalize_structure_sets(
                self.store,
                self.patterns,
                &context.patient_dir,
            )?;
            row.anatomy_normalized = true;
        }

        let removed = scrub::remove_setup_notes(&mut plan.record);
        tracing::debug!(removed, "setup notes removed");

        self.store
            .write(&plan.record, &plan.path)
            .map_err(UnitError::external)?;
        self.store
            .write(&dose.record, &dose.path)
            .map_err(UnitError::external)?;
        Ok(())
    }
}

fn rejected_row(rejected: &RejectedLine) -> CleanupRow {
    let error = &rejected.error;
    tracing::warn!(%error, study = %rejected.patient_key, "manifest line rejected");
    let unit = UnitError::from(error.clone());
    let mut row = CleanupRow::pending(&rejected.patient_key, error.line(), &rejected.plan_key);
    row.outcome = unit.outcome();
    row.message = Some(unit.to_string());
    row
}
