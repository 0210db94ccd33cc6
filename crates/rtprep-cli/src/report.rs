//! Stage report files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rtprep_core::reports::{ReportDocument, ReportRow};

/// Write `rows` as `<folder>/<table>.json`, replacing any previous report.
pub fn write<R: ReportRow>(folder: &Path, rows: Vec<R>) -> anyhow::Result<PathBuf> {
    let path = folder.join(format!("{}.json", R::TABLE_NAME));
    let document = ReportDocument::new(rows)
        .with_context(|| format!("failed to build report {}", R::TABLE_NAME))?;
    let json = serde_json::to_vec_pretty(&document)
        .with_context(|| format!("failed to serialize report {}", R::TABLE_NAME))?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = document.rows.len(), "report written");
    Ok(path)
}
