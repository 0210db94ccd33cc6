//! Data collection settings.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_structure() -> String {
    String::from("Heart")
}

const fn default_dose_level() -> f64 {
    20.0
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CollectionConfig {
    /// Structure id whose dose metrics are collected.
    #[serde(default = "default_structure")]
    pub structure: String,

    /// Dose level [Gy] for the volume-at-dose metric.
    #[serde(default = "default_dose_level")]
    pub dose_level: f64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            structure: default_structure(),
            dose_level: default_dose_level(),
        }
    }
}

impl CollectionConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.structure.is_empty() {
            return Err(ConfigError::invalid(
                "collection.structure",
                "structure must not be empty",
            ));
        }
        if !self.dose_level.is_finite() || self.dose_level < 0.0 {
            return Err(ConfigError::invalid(
                "collection.dose_level",
                format!("must be a non-negative number, got {}", self.dose_level),
            ));
        }
        Ok(())
    }
}
