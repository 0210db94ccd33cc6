//! File-name pre-filters for the exported record set.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_plan_glob() -> String {
    String::from("*RP*.dcm")
}

fn default_dose_glob() -> String {
    String::from("*RD*.dcm")
}

fn default_structure_set_glob() -> String {
    String::from("*RS*.dcm")
}

fn default_image_glob() -> String {
    String::from("*CT*.dcm")
}

/// Glob patterns matched case-insensitively against file names.
///
/// Patterns are only a coarse pre-filter: plans and doses are linked by their
/// reference fields, never by name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RecordsConfig {
    #[serde(default = "default_plan_glob")]
    pub plan_glob: String,

    #[serde(default = "default_dose_glob")]
    pub dose_glob: String,

    #[serde(default = "default_structure_set_glob")]
    pub structure_set_glob: String,

    #[serde(default = "default_image_glob")]
    pub image_glob: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            plan_glob: default_plan_glob(),
            dose_glob: default_dose_glob(),
            structure_set_glob: default_structure_set_glob(),
            image_glob: default_image_glob(),
        }
    }
}

impl RecordsConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (field, glob) in [
            ("records.plan_glob", &self.plan_glob),
            ("records.dose_glob", &self.dose_glob),
            ("records.structure_set_glob", &self.structure_set_glob),
            ("records.image_glob", &self.image_glob),
        ] {
            if glob.trim().is_empty() {
                return Err(ConfigError::invalid(field, "pattern must not be empty"));
            }
        }
        Ok(())
    }
}
