//! Error types for rtprep.
//!
//! `UnitError` is the result type of one unit of work (a manifest entry, a
//! patient check, or a single field). Batch code treats any `Err` as "record and
//! continue", so one unit can never abort the batch. Crate-specific errors
//! (`RecordError`, `StoreError`, `ConfigError`) live in their own crates and are
//! folded into `UnitError::External` at the unit boundary.

use thiserror::Error;

use crate::enums::UnitOutcome;

/// Failure of a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// An expected record was not found by cross-reference.
    #[error("{what} not found: {detail}")]
    Resolution { what: String, detail: String },

    /// A manifest field or record field is malformed or non-numeric.
    #[error("parse failure in {field}: {reason}")]
    Parse { field: String, reason: String },

    /// The record store, the research store, or the filesystem failed.
    #[error("external failure: {0}")]
    External(String),
}

impl UnitError {
    pub fn resolution(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Resolution {
            what: what.into(),
            detail: detail.into(),
        }
    }

    pub fn parse(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn external(error: impl std::fmt::Display) -> Self {
        Self::External(error.to_string())
    }

    /// The report outcome for this failure kind.
    #[must_use]
    pub const fn outcome(&self) -> UnitOutcome {
        match self {
            Self::Resolution { .. } => UnitOutcome::ResolutionFailure,
            Self::Parse { .. } => UnitOutcome::ParseFailure,
            Self::External(_) => UnitOutcome::ExternalFailure,
        }
    }
}

/// A manifest line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("line {line}: expected {expected} tab-separated columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: &'static str,
        found: usize,
    },

    #[error("line {line}: invalid {column} '{value}': {reason}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}

impl ManifestError {
    /// 1-based line number of the offending line.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::ColumnCount { line, .. } | Self::InvalidValue { line, .. } => *line,
        }
    }
}

impl From<ManifestError> for UnitError {
    fn from(error: ManifestError) -> Self {
        let field = match &error {
            ManifestError::ColumnCount { .. } => "manifest line",
            ManifestError::InvalidValue { column, .. } => *column,
        };
        Self::parse(field, error.to_string())
    }
}
