//! Stage switches.

use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

/// Which stages a run executes. Each switch is independent.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct StagesConfig {
    #[serde(default)]
    pub extraction_qc: bool,

    #[serde(default = "default_true")]
    pub cleanup: bool,

    #[serde(default)]
    pub cleanup_qc: bool,

    #[serde(default)]
    pub collection: bool,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            extraction_qc: false,
            cleanup: default_true(),
            cleanup_qc: false,
            collection: false,
        }
    }
}

impl StagesConfig {
    #[must_use]
    pub const fn any_enabled(&self) -> bool {
        self.extraction_qc || self.cleanup || self.cleanup_qc || self.collection
    }
}
