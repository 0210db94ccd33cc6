//! Working directory and manifest locations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_extraction_manifest() -> String {
    String::from("listExtraction.txt")
}

fn default_cleanup_manifest() -> String {
    String::from("listCleanup.txt")
}

fn default_validation_manifest() -> String {
    String::from("listQC2.txt")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Directory holding one sub-directory per study id, the manifests, and the reports.
    #[serde(default = "default_folder")]
    pub folder: PathBuf,

    /// Extraction manifest file name, relative to `folder` unless absolute.
    #[serde(default = "default_extraction_manifest")]
    pub extraction_manifest: String,

    /// Cleanup manifest file name.
    #[serde(default = "default_cleanup_manifest")]
    pub cleanup_manifest: String,

    /// Cross-validation manifest file name.
    #[serde(default = "default_validation_manifest")]
    pub validation_manifest: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            extraction_manifest: default_extraction_manifest(),
            cleanup_manifest: default_cleanup_manifest(),
            validation_manifest: default_validation_manifest(),
        }
    }
}

impl WorkspaceConfig {
    /// Resolve a configured file name against the working folder.
    #[must_use]
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.folder.join(path)
        }
    }

    /// Directory holding one patient's exported records.
    #[must_use]
    pub fn patient_dir(&self, study_id: &str) -> PathBuf {
        self.folder.join(study_id)
    }

    #[must_use]
    pub fn extraction_manifest_path(&self) -> PathBuf {
        self.resolve(&self.extraction_manifest)
    }

    #[must_use]
    pub fn cleanup_manifest_path(&self) -> PathBuf {
        self.resolve(&self.cleanup_manifest)
    }

    #[must_use]
    pub fn validation_manifest_path(&self) -> PathBuf {
        self.resolve(&self.validation_manifest)
    }

    /// Path of a stage report: `<folder>/<table>.json`.
    #[must_use]
    pub fn report_path(&self, table: &str) -> PathBuf {
        self.folder.join(format!("{table}.json"))
    }
}
