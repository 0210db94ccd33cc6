//! Research store location.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("research")
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResearchConfig {
    /// Directory of `<study id>.json` patient snapshots, relative to the
    /// working folder unless absolute.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

impl ResearchConfig {
    #[must_use]
    pub fn snapshot_dir_in(&self, folder: &Path) -> PathBuf {
        if self.snapshot_dir.is_absolute() {
            self.snapshot_dir.clone()
        } else {
            folder.join(&self.snapshot_dir)
        }
    }
}
