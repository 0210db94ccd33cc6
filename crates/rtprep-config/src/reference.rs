//! Reference-structure selection used by the cross-validation checks.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_prefix() -> String {
    String::from("Lung")
}

fn default_preferred() -> String {
    String::from("Lung_L")
}

fn default_plan() -> String {
    String::from("P1")
}

/// Structures of `plan`'s structure set whose id starts with `prefix` are
/// candidates; with several candidates the one named `preferred` wins.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReferenceConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_preferred")]
    pub preferred: String,

    /// Plan whose structure set and image are inspected.
    #[serde(default = "default_plan")]
    pub plan: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            preferred: default_preferred(),
            plan: default_plan(),
        }
    }
}

impl ReferenceConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::invalid(
                "reference.prefix",
                "prefix must not be empty",
            ));
        }
        if self.plan.is_empty() {
            return Err(ConfigError::invalid("reference.plan", "plan must not be empty"));
        }
        Ok(())
    }
}
