//! File-count check of the exported record set.
//!
//! For every study of the extraction manifest, the export directory must hold
//! one plan and one dose per requested plan, plus at least one image and one
//! structure set. Only files directly inside the study directory count.

use std::path::{Path, PathBuf};

use rtprep_core::ExtractionManifest;
use rtprep_core::numeric::to_count;
use rtprep_core::reports::ExtractionRow;
use rtprep_records::{RecordKind, RecordPatterns};

pub struct ExtractionQc<'a> {
    patterns: &'a RecordPatterns,
    workdir: PathBuf,
}

impl<'a> ExtractionQc<'a> {
    pub fn new(patterns: &'a RecordPatterns, workdir: &Path) -> Self {
        Self {
            patterns,
            workdir: workdir.to_path_buf(),
        }
    }

    /// One row per distinct study id, in manifest order.
    pub fn run(
        &self,
        manifest: &ExtractionManifest,
        mut on_row: impl FnMut(&ExtractionRow),
    ) -> Vec<ExtractionRow> {
        let _span = tracing::info_span!("extraction_qc").entered();
        for error in &manifest.rejected {
            tracing::warn!(%error, "manifest line rejected");
        }

        manifest
            .study_ids()
            .into_iter()
            .map(|study_id| {
                let row = self.check(manifest, study_id);
                on_row(&row);
                row
            })
            .collect()
    }

    /// Count the files of one study.
    pub fn check(&self, manifest: &ExtractionManifest, study_id: &str) -> ExtractionRow {
        let dir = self.workdir.join(study_id);
        let mut row = ExtractionRow {
            study_id: study_id.to_string(),
            manifest_rows: to_count(manifest.plan_count(study_id)),
            ..ExtractionRow::default()
        };

        if dir.is_dir() {
            row.plan_files = self.count(&dir, RecordKind::Plan);
            row.dose_files = self.count(&dir, RecordKind::Dose);
            row.structure_set_files = self.count(&dir, RecordKind::StructureSet);
            row.image_files = self.count(&dir, RecordKind::Image);
        } else {
            tracing::warn!(study = study_id, dir = %dir.display(), "export directory missing");
        }
        row.correct = row.counts_agree();

        if !row.correct {
            tracing::warn!(
                study = study_id,
                plans = row.plan_files,
                doses = row.dose_files,
                expected = row.manifest_rows,
                "export incomplete"
            );
        }
        row
    }

    fn count(&self, dir: &Path, kind: RecordKind) -> u32 {
        match self.patterns.count_top_level(dir, kind) {
            Ok(count) => to_count(count),
            Err(error) => {
                tracing::warn!(%error, ?kind, "could not count files");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const MANIFEST: &str = "pat1\tS1\tC1\tplanA\n\
                            pat1\tS1\tC1\tplanB\n\
                            pat2\tS2\tC1\tplanX\n";

    fn patterns() -> RecordPatterns {
        RecordPatterns::new("*RP*.dcm", "*RD*.dcm", "*RS*.dcm", "*CT*.dcm").unwrap()
    }

    fn touch(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), b"{}").unwrap();
        }
    }

    #[test]
    fn complete_export_is_correct() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        touch(
            &temp.path().join("S1"),
            &["RP.1.dcm", "RP.2.dcm", "RD.1.dcm", "RD.2.dcm", "RS.1.dcm", "CT.1.dcm"],
        );
        // Files below the study directory do not count.
        touch(&temp.path().join("S1/old"), &["RP.3.dcm"]);

        let manifest = ExtractionManifest::parse(MANIFEST);
        let patterns = patterns();
        let qc = ExtractionQc::new(&patterns, temp.path());
        let row = qc.check(&manifest, "S1");

        assert_eq!(
            row,
            ExtractionRow {
                study_id: "S1".into(),
                manifest_rows: 2,
                correct: true,
                plan_files: 2,
                dose_files: 2,
                structure_set_files: 1,
                image_files: 1,
            }
        );
    }

    #[test]
    fn missing_directory_and_missing_dose_are_reported() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        touch(
            &temp.path().join("S1"),
            &["RP.1.dcm", "RP.2.dcm", "RD.1.dcm", "RS.1.dcm", "CT.1.dcm"],
        );

        let manifest = ExtractionManifest::parse(MANIFEST);
        let patterns = patterns();
        let qc = ExtractionQc::new(&patterns, temp.path());
        let mut seen = 0;
        let rows = qc.run(&manifest, |_| seen += 1);

        assert_eq!(seen, 2);
        assert_eq!(rows[0].study_id, "S1");
        assert_eq!(rows[0].dose_files, 1);
        assert!(!rows[0].correct);
        assert_eq!(rows[1].study_id, "S2");
        assert_eq!(rows[1].manifest_rows, 1);
        assert_eq!(rows[1].plan_files, 0);
        assert!(!rows[1].correct);
    }
}
