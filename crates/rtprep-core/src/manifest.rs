//! Manifest parsing.
//!
//! Three tab-delimited control lists drive the pipeline:
//!
//! ```text
//! extraction: patientId  studyId  courseId  planId
//! cleanup:    studyId  courseId  planId  deliveredFractions  firstFractionDate
//!             studyId  planId  deliveredFractions  firstFractionDate      (legacy)
//! validation: studyId  referenceDose  x,y,z  centerPointIntensity
//! ```
//!
//! Blank lines are skipped but still counted, so line numbers in errors match
//! what an editor shows. A malformed line is rejected on its own and never
//! prevents the rest of the manifest from loading.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{ManifestError, UnitError};
use crate::geometry::Point3;

/// Split a manifest into `(1-based line number, trimmed columns)`, skipping blank lines.
fn split_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.split('\t').map(str::trim).collect()))
}

/// Parse a first-fraction date. Any time-of-day component is discarded.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(datetime.date());
        }
    }
    Err("expected YYYY-MM-DD".to_string())
}

// ---------------------------------------------------------------------------
// Extraction manifest
// ---------------------------------------------------------------------------

/// One requested export: a single treatment plan of one patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionLine {
    pub line: usize,
    pub patient_id: String,
    pub study_id: String,
    pub course_id: String,
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionManifest {
    pub lines: Vec<ExtractionLine>,
    pub rejected: Vec<ManifestError>,
}

impl ExtractionManifest {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();
        for (line, columns) in split_lines(text) {
            match columns.as_slice() {
                [patient_id, study_id, course_id, plan_id, ..] => {
                    manifest.lines.push(ExtractionLine {
                        line,
                        patient_id: (*patient_id).to_string(),
                        study_id: (*study_id).to_string(),
                        course_id: (*course_id).to_string(),
                        plan_id: (*plan_id).to_string(),
                    });
                }
                _ => manifest.rejected.push(ManifestError::ColumnCount {
                    line,
                    expected: "4",
                    found: columns.len(),
                }),
            }
        }
        manifest
    }

    /// Distinct study ids in first-appearance order.
    #[must_use]
    pub fn study_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for line in &self.lines {
            if !ids.contains(&line.study_id.as_str()) {
                ids.push(&line.study_id);
            }
        }
        ids
    }

    /// Number of requested plans for `study_id`.
    #[must_use]
    pub fn plan_count(&self, study_id: &str) -> usize {
        self.lines
            .iter()
            .filter(|line| line.study_id == study_id)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Cleanup manifest
// ---------------------------------------------------------------------------

/// One delivered treatment plan, as curated for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// 1-based line number in the manifest file.
    pub line: usize,
    pub patient_key: String,
    /// Absent in the legacy four-column form.
    pub course_key: Option<String>,
    pub plan_key: String,
    pub delivered_fractions: u32,
    pub first_fraction_date: NaiveDate,
}

impl ManifestEntry {
    /// The numbering inputs of this entry.
    #[must_use]
    pub fn slot(&self) -> PlanSlot {
        PlanSlot {
            line: self.line,
            patient_key: self.patient_key.clone(),
            plan_key: self.plan_key.clone(),
            first_fraction_date: self.first_fraction_date,
        }
    }
}

/// What plan numbering needs from a manifest line.
///
/// Kept for every line whose keys and date are readable, including lines
/// rejected for their fraction count, so that a rejected line still holds
/// its place among the patient's plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    pub line: usize,
    pub patient_key: String,
    pub plan_key: String,
    pub first_fraction_date: NaiveDate,
}

/// A cleanup line that could not become an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub error: ManifestError,
    /// Raw first column.
    pub patient_key: String,
    /// Raw plan column, empty when the layout is not recognised.
    pub plan_key: String,
}

/// Columns of one cleanup line in either layout, still unparsed.
struct CleanupColumns<'c> {
    line: usize,
    patient: &'c str,
    course: Option<&'c str>,
    plan: &'c str,
    fractions: &'c str,
    date: &'c str,
}

impl<'c> CleanupColumns<'c> {
    fn split(line: usize, columns: &[&'c str]) -> Result<Self, ManifestError> {
        let (patient, course, plan, fractions, date) = match columns {
            [patient, course, plan, fractions, date, ..] => {
                (*patient, Some(*course), *plan, *fractions, *date)
            }
            [patient, plan, fractions, date] => (*patient, None, *plan, *fractions, *date),
            _ => {
                return Err(ManifestError::ColumnCount {
                    line,
                    expected: "4 or 5",
                    found: columns.len(),
                });
            }
        };
        Ok(Self {
            line,
            patient,
            course,
            plan,
            fractions,
            date,
        })
    }

    fn date(&self) -> Result<NaiveDate, ManifestError> {
        parse_date(self.date).map_err(|reason| ManifestError::InvalidValue {
            line: self.line,
            column: "firstFractionDate",
            value: self.date.to_string(),
            reason,
        })
    }

    fn slot(&self, first_fraction_date: NaiveDate) -> PlanSlot {
        PlanSlot {
            line: self.line,
            patient_key: self.patient.to_string(),
            plan_key: self.plan.to_string(),
            first_fraction_date,
        }
    }

    fn entry(
        &self,
        date: Result<NaiveDate, ManifestError>,
    ) -> Result<ManifestEntry, ManifestError> {
        let delivered_fractions =
            self.fractions
                .parse::<u32>()
                .map_err(|error| ManifestError::InvalidValue {
                    line: self.line,
                    column: "deliveredFractions",
                    value: self.fractions.to_string(),
                    reason: error.to_string(),
                })?;

        Ok(ManifestEntry {
            line: self.line,
            patient_key: self.patient.to_string(),
            course_key: self.course.map(str::to_string),
            plan_key: self.plan.to_string(),
            delivered_fractions,
            first_fraction_date: date?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupManifest {
    pub entries: Vec<ManifestEntry>,
    pub rejected: Vec<RejectedLine>,
    /// Numbering inputs, in manifest order.
    pub slots: Vec<PlanSlot>,
}

impl CleanupManifest {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();
        for (line, columns) in split_lines(text) {
            let parsed = CleanupColumns::split(line, &columns).and_then(|raw| {
                let date = raw.date();
                if let Ok(date) = &date {
                    manifest.slots.push(raw.slot(*date));
                }
                raw.entry(date)
            });
            match parsed {
                Ok(entry) => manifest.entries.push(entry),
                Err(error) => manifest.rejected.push(RejectedLine {
                    error,
                    patient_key: columns
                        .first()
                        .map_or_else(String::new, |key| (*key).to_string()),
                    plan_key: plan_column(&columns).to_string(),
                }),
            }
        }
        manifest
    }

    /// Build a manifest from already-parsed entries.
    #[must_use]
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Self {
            slots: entries.iter().map(ManifestEntry::slot).collect(),
            entries,
            rejected: Vec::new(),
        }
    }

    /// Numbering inputs of one patient, in manifest order.
    pub fn slots_for_patient<'a>(
        &'a self,
        patient_key: &str,
    ) -> impl Iterator<Item = &'a PlanSlot> {
        self.slots
            .iter()
            .filter(move |slot| slot.patient_key == patient_key)
    }
}

/// The plan column of a cleanup line: the second in the legacy layout, the third otherwise.
fn plan_column<'c>(columns: &[&'c str]) -> &'c str {
    let index = if columns.len() == 4 { 1 } else { 2 };
    columns.get(index).copied().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Validation manifest
// ---------------------------------------------------------------------------

/// Declared reference values for one patient.
///
/// Fields stay raw so that a malformed value only fails the check that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationLine {
    pub line: usize,
    pub study_id: String,
    raw_dose: String,
    raw_center_point: Option<String>,
    raw_intensity: Option<String>,
}

impl ValidationLine {
    /// Declared course dose to the reference structure (Gy).
    pub fn reference_dose(&self) -> Result<f64, UnitError> {
        self.raw_dose
            .parse::<f64>()
            .map_err(|error| self.invalid("referenceDose", &self.raw_dose, &error.to_string()))
    }

    /// Declared center point of the reference structure (mm).
    pub fn center_point(&self) -> Result<Point3, UnitError> {
        let raw = self.raw_center_point.as_deref().ok_or_else(|| {
            UnitError::parse("centerPoint", format!("line {}: column missing", self.line))
        })?;
        raw.parse::<Point3>()
            .map_err(|reason| self.invalid("centerPoint", raw, &reason))
    }

    /// Declared image intensity at the center point (HU).
    pub fn center_point_intensity(&self) -> Result<f64, UnitError> {
        let raw = self.raw_intensity.as_deref().ok_or_else(|| {
            UnitError::parse(
                "centerPointIntensity",
                format!("line {}: column missing", self.line),
            )
        })?;
        raw.parse::<f64>()
            .map_err(|error| self.invalid("centerPointIntensity", raw, &error.to_string()))
    }

    fn invalid(&self, column: &'static str, value: &str, reason: &str) -> UnitError {
        ManifestError::InvalidValue {
            line: self.line,
            column,
            value: value.to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationManifest {
    pub lines: Vec<ValidationLine>,
    pub rejected: Vec<ManifestError>,
}

impl ValidationManifest {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();
        for (line, columns) in split_lines(text) {
            match columns.as_slice() {
                [study_id, dose, rest @ ..] => manifest.lines.push(ValidationLine {
                    line,
                    study_id: (*study_id).to_string(),
                    raw_dose: (*dose).to_string(),
                    raw_center_point: rest.first().map(|value| (*value).to_string()),
                    raw_intensity: rest.get(1).map(|value| (*value).to_string()),
                }),
                _ => manifest.rejected.push(ManifestError::ColumnCount {
                    line,
                    expected: "4",
                    found: columns.len(),
                }),
            }
        }
        manifest
    }

    /// The first line declared for `study_id`.
    #[must_use]
    pub fn find(&self, study_id: &str) -> Option<&ValidationLine> {
        self.lines.iter().find(|line| line.study_id == study_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cleanup_parses_five_column_form() {
        let manifest = CleanupManifest::parse("S1\tC1\tplanA\t25\t2021-01-04\n");
        assert!(manifest.rejected.is_empty());
        let entry = &manifest.entries[0];
        assert_eq!(entry.patient_key, "S1");
        assert_eq!(entry.course_key.as_deref(), Some("C1"));
        assert_eq!(entry.plan_key, "planA");
        assert_eq!(entry.delivered_fractions, 25);
        assert_eq!(
            entry.first_fraction_date,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
    }

    #[test]
    fn cleanup_accepts_legacy_four_column_form() {
        let manifest = CleanupManifest::parse("S1\tplanA\t3\t2021-01-04 08:30\r\n");
        let entry = &manifest.entries[0];
        assert_eq!(entry.course_key, None);
        assert_eq!(entry.plan_key, "planA");
        assert_eq!(entry.delivered_fractions, 3);
    }

    #[test]
    fn cleanup_rejects_bad_lines_without_dropping_others() {
        let text = "S1\tC1\tplanA\tten\t2021-01-04\n\nS1\tC1\tplanB\t5\t2021-02-01\nS2\tx\n";
        let manifest = CleanupManifest::parse(text);
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].line, 3);
        assert_eq!(manifest.rejected.len(), 2);
        assert_eq!(manifest.rejected[0].error.line(), 1);
        assert_eq!(manifest.rejected[0].patient_key, "S1");
        assert_eq!(manifest.rejected[0].plan_key, "planA");
        assert_eq!(manifest.rejected[1].error.line(), 4);
        assert_eq!(manifest.rejected[1].patient_key, "S2");
        assert_eq!(manifest.rejected[1].plan_key, "");
    }

    #[test]
    fn rejected_fraction_count_keeps_the_numbering_slot() {
        let text = "S2\tC1\tplanX\tfive\t2021-03-03\n\
                    S2\tplanW\t4\tnot a date\n\
                    S2\tC1\tplanY\t10\t2021-03-03\n";
        let manifest = CleanupManifest::parse(text);
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.rejected[1].plan_key, "planW");
        let slots = manifest
            .slots_for_patient("S2")
            .map(|slot| (slot.line, slot.plan_key.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(slots, vec![(1, "planX"), (3, "planY")]);
    }

    #[test]
    fn patient_grouping_uses_exact_keys() {
        let text = "S1\tC\tplanA\t1\t2021-01-01\nS10\tC\tplanZ\t1\t2020-01-01\nS1\tC\tplanB\t1\t2021-02-01\n";
        let manifest = CleanupManifest::parse(text);
        let keys = manifest
            .slots_for_patient("S1")
            .map(|slot| slot.plan_key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["planA", "planB"]);
        assert_eq!(manifest.slots_for_patient("S3").count(), 0);
        assert_eq!(CleanupManifest::from_entries(manifest.entries.clone()).slots, manifest.slots);
    }

    #[test]
    fn extraction_counts_plans_per_study() {
        let text = "p1\tS1\tC1\tplanA\np1\tS1\tC1\tplanB\np2\tS2\tC1\tplanA\nshort\n";
        let manifest = ExtractionManifest::parse(text);
        assert_eq!(manifest.study_ids(), vec!["S1", "S2"]);
        assert_eq!(manifest.plan_count("S1"), 2);
        assert_eq!(manifest.plan_count("S3"), 0);
        assert_eq!(manifest.rejected.len(), 1);
    }

    #[test]
    fn validation_fields_fail_independently() {
        let manifest = ValidationManifest::parse("S1\tabc\t1,2,3\t-700\n");
        let line = manifest.find("S1").expect("line exists");
        assert!(line.reference_dose().is_err());
        assert_eq!(line.center_point().unwrap(), Point3::new(1.0, 2.0, 3.0));
        assert!((line.center_point_intensity().unwrap() + 700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validation_missing_columns_are_parse_failures() {
        let manifest = ValidationManifest::parse("S1\t12.5\n");
        let line = manifest.find("S1").unwrap();
        assert!((line.reference_dose().unwrap() - 12.5).abs() < f64::EPSILON);
        assert!(matches!(
            line.center_point(),
            Err(UnitError::Parse { ref field, .. }) if field == "centerPoint"
        ));
    }

    #[test]
    fn date_parser_discards_time() {
        assert_eq!(
            parse_date("2021-03-03T10:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 3).unwrap()
        );
        assert!(parse_date("03/03/2021").is_err());
    }
}
