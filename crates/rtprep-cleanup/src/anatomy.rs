//! Region-name normalization for structure sets.
//!
//! Clinical region names are free text ("hjarta", "Esophagus_PRV", "eosophagus").
//! A [`LabelRuleSet`] maps them onto a controlled vocabulary. Each rule renames
//! at most one region per structure set: the first one, in document order, that
//! matches any of the rule's patterns. A structure set without a match is left
//! as it is.

use std::path::Path;

use rtprep_core::UnitError;
use rtprep_records::{Depth, Record, RecordKind, RecordPatterns, RecordStore, tags};

/// A case-insensitive name pattern: a prefix, optionally with a required substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPattern {
    prefix: String,
    contains: Option<String>,
}

impl LabelPattern {
    #[must_use]
    pub fn prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            contains: None,
        }
    }

    #[must_use]
    pub fn prefix_containing(prefix: &str, contains: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            contains: Some(contains.to_lowercase()),
        }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        name.starts_with(&self.prefix)
            && self
                .contains
                .as_deref()
                .is_none_or(|needle| name.contains(needle))
    }
}

/// Canonical name and the patterns that select the region to rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRule {
    pub canonical: String,
    pub patterns: Vec<LabelPattern>,
}

impl LabelRule {
    #[must_use]
    pub fn new(canonical: &str, patterns: Vec<LabelPattern>) -> Self {
        Self {
            canonical: canonical.to_string(),
            patterns,
        }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// Rename the first matching region. Returns `"old -> new"` when the name changed.
    pub fn apply(&self, structure_set: &mut Record) -> Option<String> {
        let element = structure_set
            .find_all_mut(tags::ROI_NAME)
            .into_iter()
            .find(|element| element.as_text().is_some_and(|name| self.matches(&name)))?;

        let old = element.as_text()?.into_owned();
        if old == self.canonical {
            return None;
        }
        element.set_text(self.canonical.clone());
        Some(format!("{old} -> {}", self.canonical))
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRuleSet {
    rules: Vec<LabelRule>,
}

impl Default for LabelRuleSet {
    /// Heart and esophagus, including common misspellings and the Swedish "hjärta".
    fn default() -> Self {
        Self::new(vec![
            LabelRule::new(
                "Heart",
                vec![
                    LabelPattern::prefix("heart"),
                    LabelPattern::prefix_containing("hj", "rta"),
                ],
            ),
            LabelRule::new(
                "Esophagus",
                vec![
                    LabelPattern::prefix("eso"),
                    LabelPattern::prefix("eosophagus"),
                    LabelPattern::prefix("eosopagus"),
                ],
            ),
        ])
    }
}

impl LabelRuleSet {
    #[must_use]
    pub const fn new(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    /// Apply every rule to one structure set.
    pub fn apply(&self, structure_set: &mut Record) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(structure_set))
            .collect()
    }

    /// Normalize every structure set under `patient_dir` and write each one back.
    pub fn normalize_structure_sets<S: RecordStore>(
        &self,
        store: &S,
        patterns: &RecordPatterns,
        patient_dir: &Path,
    ) -> Result<Vec<String>, UnitError> {
        let paths = patterns
            .find(patient_dir, RecordKind::StructureSet, Depth::Recursive)
            .map_err(UnitError::external)?;

        let mut renamed = Vec::new();
        for path in paths {
            let mut structure_set = store.read(&path).map_err(UnitError::external)?;
            let changes = self.apply(&mut structure_set);
            tracing::debug!(path = %path.display(), renamed = changes.len(), "normalized structure set");
            store
                .write(&structure_set, &path)
                .map_err(UnitError::external)?;
            renamed.extend(changes);
        }
        Ok(renamed)
    }
}
