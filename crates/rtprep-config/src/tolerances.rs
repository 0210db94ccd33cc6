//! Agreement tolerances for the cross-validation checks.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_dose() -> f64 {
    0.1
}

const fn default_distance() -> f64 {
    0.3
}

const fn default_intensity() -> f64 {
    5.0
}

/// Absolute tolerances; a check passes when the difference is strictly smaller.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct TolerancesConfig {
    /// Course dose to the reference structure [Gy].
    #[serde(default = "default_dose")]
    pub dose: f64,

    /// Center point distance [mm].
    #[serde(default = "default_distance")]
    pub distance: f64,

    /// Image intensity at the center point [HU].
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl Default for TolerancesConfig {
    fn default() -> Self {
        Self {
            dose: default_dose(),
            distance: default_distance(),
            intensity: default_intensity(),
        }
    }
}

impl TolerancesConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tolerances.dose", self.dose),
            ("tolerances.distance", self.distance),
            ("tolerances.intensity", self.intensity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a positive number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_clinical_tolerances() {
        let config = TolerancesConfig::default();
        assert!((config.dose - 0.1).abs() < f64::EPSILON);
        assert!((config.distance - 0.3).abs() < f64::EPSILON);
        assert!((config.intensity - 5.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let config = TolerancesConfig {
            distance: 0.0,
            ..TolerancesConfig::default()
        };
        let err = config.validate().expect_err("zero distance");
        assert!(err.to_string().contains("tolerances.distance"));
    }
}
