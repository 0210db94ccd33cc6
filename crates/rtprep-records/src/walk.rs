//! Record file discovery.
//!
//! Uses the `ignore` crate's walker with every standard filter disabled: an
//! export directory has no `.gitignore` semantics and hidden files still count.
//! File names are matched against case-insensitive globs, which are only a
//! coarse pre-filter; callers link records by their reference fields.
//!
//! Siblings are visited in file-name order so that "first match" is
//! deterministic across filesystems.

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::error::RecordError;

/// The kinds of exported record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Plan,
    Dose,
    StructureSet,
    Image,
}

/// How far below the patient directory to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Only files directly inside the directory.
    TopLevel,
    /// The whole tree.
    Recursive,
}

/// Compiled file-name globs, one per record kind.
#[derive(Debug, Clone)]
pub struct RecordPatterns {
    plan: GlobMatcher,
    dose: GlobMatcher,
    structure_set: GlobMatcher,
    image: GlobMatcher,
}

impl RecordPatterns {
    pub fn new(
        plan: &str,
        dose: &str,
        structure_set: &str,
        image: &str,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            plan: compile(plan)?,
            dose: compile(dose)?,
            structure_set: compile(structure_set)?,
            image: compile(image)?,
        })
    }

    const fn matcher(&self, kind: RecordKind) -> &GlobMatcher {
        match kind {
            RecordKind::Plan => &self.plan,
            RecordKind::Dose => &self.dose,
            RecordKind::StructureSet => &self.structure_set,
            RecordKind::Image => &self.image,
        }
    }

    /// Whether a bare file name matches the glob of `kind`.
    #[must_use]
    pub fn matches(&self, kind: RecordKind, file_name: &str) -> bool {
        self.matcher(kind).is_match(file_name)
    }

    /// Files of `kind` under `root`.
    ///
    /// Entries the walker cannot read are skipped and logged at debug level.
    pub fn find(
        &self,
        root: &Path,
        kind: RecordKind,
        depth: Depth,
    ) -> Result<Vec<PathBuf>, RecordError> {
        if !root.is_dir() {
            return Err(RecordError::MissingDirectory(root.to_path_buf()));
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(false)
            .follow_links(true)
            .sort_by_file_name(std::cmp::Ord::cmp);
        if depth == Depth::TopLevel {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::debug!(%error, root = %root.display(), "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.matches(kind, &name) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Number of files of `kind` directly inside `root`.
    pub fn count_top_level(&self, root: &Path, kind: RecordKind) -> Result<usize, RecordError> {
        self.find(root, kind, Depth::TopLevel).map(|files| files.len())
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher, RecordError> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| RecordError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn patterns() -> RecordPatterns {
        RecordPatterns::new("*RP*.dcm", "*RD*.dcm", "*RS*.dcm", "*CT*.dcm").unwrap()
    }

    // Helper: patient directory with files at two depths.
    fn create_fixture(dir: &Path) {
        fs::create_dir_all(dir.join("course1")).unwrap();
        for name in [
            "RP.b.dcm",
            "RP.a.dcm",
            "rd.a.dcm",
            "CT.1.dcm",
            "CT.2.dcm",
            "RS.1.dcm",
            "notes.txt",
            "course1/RP.c.dcm",
            "course1/RD.c.dcm",
        ] {
            fs::write(dir.join(name), b"{}").unwrap();
        }
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn recursive_search_is_sorted_and_filtered() {
        let temp = tempfile::tempdir().unwrap();
        create_fixture(temp.path());

        let plans = patterns()
            .find(temp.path(), RecordKind::Plan, Depth::Recursive)
            .unwrap();
        assert_eq!(
            names(&plans, temp.path()),
            vec!["RP.a.dcm", "RP.b.dcm", "course1/RP.c.dcm"]
        );
    }

    #[test]
    fn top_level_search_ignores_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        create_fixture(temp.path());
        let patterns = patterns();

        assert_eq!(patterns.count_top_level(temp.path(), RecordKind::Plan).unwrap(), 2);
        assert_eq!(patterns.count_top_level(temp.path(), RecordKind::Dose).unwrap(), 1);
        assert_eq!(patterns.count_top_level(temp.path(), RecordKind::Image).unwrap(), 2);
        assert_eq!(
            patterns
                .count_top_level(temp.path(), RecordKind::StructureSet)
                .unwrap(),
            1
        );
    }

    #[test]
    fn globs_are_case_insensitive() {
        let patterns = patterns();
        assert!(patterns.matches(RecordKind::Dose, "rd.a.dcm"));
        assert!(patterns.matches(RecordKind::Dose, "RD1.2.3.DCM"));
        assert!(!patterns.matches(RecordKind::Dose, "RP.a.dcm"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = patterns()
            .find(&temp.path().join("nope"), RecordKind::Plan, Depth::Recursive)
            .expect_err("missing dir");
        assert!(matches!(err, RecordError::MissingDirectory(_)));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = RecordPatterns::new("[", "*", "*", "*").expect_err("bad glob");
        assert!(matches!(err, RecordError::Pattern { .. }));
    }
}
