//! `rtprep run`: the enabled stages in fixed order, one report per stage.
//!
//! Unit failures inside a stage end up in its report. Only errors that stop a
//! whole stage (unreadable manifest, unwritable report) abort the command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rtprep_cleanup::{CleanupPipeline, ExtractionQc};
use rtprep_config::{RtPrepConfig, StagesConfig};
use rtprep_core::enums::Stage;
use rtprep_core::reports::ReportRow;
use rtprep_core::{CleanupManifest, ExtractionManifest, ValidationManifest};
use rtprep_records::{JsonRecordStore, RecordPatterns};
use rtprep_validate::{
    Collector, CrossValidator, JsonResearchStore, PrefixPreferenceStrategy, Tolerances,
};
use serde::Serialize;

use crate::cli::{GlobalFlags, RunArgs};
use crate::output::output;
use crate::progress::Progress;
use crate::report;

/// What one stage did, as printed after the run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub rows: usize,
    pub failures: usize,
    pub report: PathBuf,
}

/// Handle `rtprep run`.
pub fn handle(args: &RunArgs, config: &RtPrepConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let stages = args.apply(config.stages);
    if !stages.any_enabled() {
        tracing::warn!("no stage enabled, nothing to run");
    }
    let summaries = run_stages(config, stages)?;
    output(&summaries, flags.format)
}

pub fn run_stages(
    config: &RtPrepConfig,
    stages: StagesConfig,
) -> anyhow::Result<Vec<StageSummary>> {
    let records = &config.records;
    let patterns = RecordPatterns::new(
        &records.plan_glob,
        &records.dose_glob,
        &records.structure_set_glob,
        &records.image_glob,
    )
    .context("invalid record file patterns")?;

    let mut summaries = Vec::new();
    if stages.extraction_qc {
        summaries.push(extraction_qc(config, &patterns)?);
    }
    if stages.cleanup {
        summaries.push(cleanup(config, &patterns)?);
    }
    if stages.cleanup_qc || stages.collection {
        let mut store = JsonResearchStore::new(config.research_snapshot_dir());
        if stages.cleanup_qc {
            summaries.push(cleanup_qc(config, &mut store)?);
        }
        if stages.collection {
            summaries.push(collection(config, &mut store)?);
        }
    }
    Ok(summaries)
}

fn extraction_qc(config: &RtPrepConfig, patterns: &RecordPatterns) -> anyhow::Result<StageSummary> {
    let _span = tracing::info_span!("stage", stage = %Stage::ExtractionQc).entered();
    let folder = &config.workspace.folder;
    let manifest = ExtractionManifest::parse(&read_manifest(
        &config.workspace.extraction_manifest_path(),
    )?);

    let progress = Progress::stage(Stage::ExtractionQc, manifest.study_ids().len());
    let rows = ExtractionQc::new(patterns, folder).run(&manifest, |row| {
        progress.tick(&row.study_id);
    });
    let failures = rows.iter().filter(|row| !row.correct).count();
    finish(Stage::ExtractionQc, folder, rows, failures, &progress)
}

fn cleanup(config: &RtPrepConfig, patterns: &RecordPatterns) -> anyhow::Result<StageSummary> {
    let _span = tracing::info_span!("stage", stage = %Stage::Cleanup).entered();
    let folder = &config.workspace.folder;
    let manifest =
        CleanupManifest::parse(&read_manifest(&config.workspace.cleanup_manifest_path())?);

    let progress = Progress::stage(
        Stage::Cleanup,
        manifest.entries.len() + manifest.rejected.len(),
    );
    let rows = CleanupPipeline::new(&JsonRecordStore, patterns, folder).run(&manifest, |row| {
        progress.tick(&row.plan_key);
    });
    let failures = rows.iter().filter(|row| !row.outcome.is_ok()).count();
    finish(Stage::Cleanup, folder, rows, failures, &progress)
}

fn cleanup_qc(config: &RtPrepConfig, store: &mut JsonResearchStore) -> anyhow::Result<StageSummary> {
    let _span = tracing::info_span!("stage", stage = %Stage::CleanupQc).entered();
    let folder = &config.workspace.folder;
    let extraction = ExtractionManifest::parse(&read_manifest(
        &config.workspace.extraction_manifest_path(),
    )?);
    let validation = ValidationManifest::parse(&read_manifest(
        &config.workspace.validation_manifest_path(),
    )?);

    let reference = &config.reference;
    let strategy =
        PrefixPreferenceStrategy::new(&reference.plan, &reference.prefix, &reference.preferred);
    let tolerances = Tolerances {
        dose: config.tolerances.dose,
        distance: config.tolerances.distance,
        intensity: config.tolerances.intensity,
    };

    let progress = Progress::stage(Stage::CleanupQc, extraction.study_ids().len());
    let rows = CrossValidator::new(store, strategy, tolerances, &extraction, &validation).run(
        |row| {
            progress.tick(&row.study_id);
        },
    );
    let failures = rows.iter().filter(|row| !row.everything_correct).count();
    finish(Stage::CleanupQc, folder, rows, failures, &progress)
}

fn collection(config: &RtPrepConfig, store: &mut JsonResearchStore) -> anyhow::Result<StageSummary> {
    let _span = tracing::info_span!("stage", stage = %Stage::Collection).entered();
    let folder = &config.workspace.folder;
    let extraction = ExtractionManifest::parse(&read_manifest(
        &config.workspace.extraction_manifest_path(),
    )?);

    let settings = &config.collection;
    let progress = Progress::stage(Stage::Collection, extraction.study_ids().len());
    let rows = Collector::new(store, settings.structure.as_str(), settings.dose_level).run(
        &extraction,
        |row| {
            progress.tick(&row.study_id);
        },
    );
    let failures = rows
        .iter()
        .filter(|row| row.mean_dose.is_none() || row.volume_at_dose.is_none())
        .count();
    finish(Stage::Collection, folder, rows, failures, &progress)
}

fn read_manifest(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))
}

fn finish<R: ReportRow>(
    stage: Stage,
    folder: &Path,
    rows: Vec<R>,
    failures: usize,
    progress: &Progress,
) -> anyhow::Result<StageSummary> {
    let count = rows.len();
    match report::write(folder, rows) {
        Ok(report) => {
            progress.finish(&format!("{failures}/{count} need attention"));
            tracing::info!(rows = count, failures, "stage complete");
            Ok(StageSummary {
                stage,
                rows: count,
                failures,
                report,
            })
        }
        Err(error) => {
            progress.abandon("report not written");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rtprep_config::WorkspaceConfig;

    use super::*;

    fn config_in(folder: &Path) -> RtPrepConfig {
        RtPrepConfig {
            workspace: WorkspaceConfig {
                folder: folder.to_path_buf(),
                ..WorkspaceConfig::default()
            },
            ..RtPrepConfig::default()
        }
    }

    fn export(folder: &Path) {
        std::fs::write(folder.join("listExtraction.txt"), "p1\tS1\tC1\tplanA\n")
            .expect("write extraction manifest");
        std::fs::write(folder.join("listCleanup.txt"), "S9\tC1\tplanA\t5\t2021-01-01\n")
            .expect("write cleanup manifest");
        let patient = folder.join("S1");
        std::fs::create_dir(&patient).expect("create patient dir");
        for name in ["RP1.dcm", "RD1.dcm", "RS1.dcm", "CT1.dcm"] {
            std::fs::write(patient.join(name), "{}").expect("write record");
        }
    }

    #[test]
    fn enabled_stages_run_in_order_and_write_reports() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        export(temp.path());
        let stages = StagesConfig {
            extraction_qc: true,
            cleanup: true,
            cleanup_qc: false,
            collection: true,
        };

        let summaries = run_stages(&config_in(temp.path()), stages).expect("stages should run");

        let outline = summaries
            .iter()
            .map(|summary| (summary.stage, summary.rows, summary.failures))
            .collect::<Vec<_>>();
        assert_eq!(
            outline,
            vec![
                (Stage::ExtractionQc, 1, 0),
                (Stage::Cleanup, 1, 1),
                (Stage::Collection, 1, 1),
            ]
        );
        for (summary, file) in summaries
            .iter()
            .zip(["resultsQC1.json", "resultsCleanup.json", "CollectedResults.json"])
        {
            assert_eq!(summary.report, temp.path().join(file));
            assert!(summary.report.is_file());
        }
    }

    #[test]
    fn no_enabled_stage_runs_nothing() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let stages = StagesConfig {
            extraction_qc: false,
            cleanup: false,
            cleanup_qc: false,
            collection: false,
        };
        let summaries = run_stages(&config_in(temp.path()), stages).expect("nothing to fail");
        assert!(summaries.is_empty());
    }

    #[test]
    fn unreadable_manifest_aborts_the_run() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        export(temp.path());
        let stages = StagesConfig {
            extraction_qc: false,
            cleanup: false,
            cleanup_qc: true,
            collection: false,
        };

        let err = run_stages(&config_in(temp.path()), stages).expect_err("validation manifest missing");
        assert!(format!("{err:#}").contains("listQC2.txt"));
    }
}
