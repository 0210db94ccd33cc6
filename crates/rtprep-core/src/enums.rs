//! Outcome enums written into stage reports.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// UnitOutcome
// ---------------------------------------------------------------------------

/// Result of one unit of work as recorded in a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    Ok,
    ResolutionFailure,
    ParseFailure,
    ExternalFailure,
}

impl UnitOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ResolutionFailure => "resolution_failure",
            Self::ParseFailure => "parse_failure",
            Self::ExternalFailure => "external_failure",
        }
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline stages, in the order they run when several are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExtractionQc,
    Cleanup,
    CleanupQc,
    Collection,
}

impl Stage {
    pub const ALL: [Self; 4] = [
        Self::ExtractionQc,
        Self::Cleanup,
        Self::CleanupQc,
        Self::Collection,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtractionQc => "extraction_qc",
            Self::Cleanup => "cleanup",
            Self::CleanupQc => "cleanup_qc",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
