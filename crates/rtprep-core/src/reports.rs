//! Report row types, one table per pipeline stage.
//!
//! Column names match the tables the clinic already reads (`Study ID`,
//! `Patient Exists`, ...). Each report is written as a self-describing
//! [`ReportDocument`]: the table name, the JSON Schema of a row, and the rows.
//! Unset optional columns are omitted from the row.

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::enums::UnitOutcome;

/// A row type that forms one stage's report table.
pub trait ReportRow: Serialize + DeserializeOwned + JsonSchema {
    /// Table name, also used as the report file stem.
    const TABLE_NAME: &'static str;
}

/// A report table together with its row schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDocument<R> {
    pub table: String,
    pub schema: serde_json::Value,
    pub rows: Vec<R>,
}

impl<R: ReportRow> ReportDocument<R> {
    pub fn new(rows: Vec<R>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            table: R::TABLE_NAME.to_string(),
            schema: serde_json::to_value(schema_for!(R))?,
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// Extraction QC
// ---------------------------------------------------------------------------

/// File counts of one patient's export against the extraction manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExtractionRow {
    #[serde(rename = "Study ID")]
    pub study_id: String,
    #[serde(rename = "# Rows In Indata")]
    pub manifest_rows: u32,
    #[serde(rename = "Correct (Same # RP and RD as # Rows)")]
    pub correct: bool,
    #[serde(rename = "# RP Files")]
    pub plan_files: u32,
    #[serde(rename = "# RD Files")]
    pub dose_files: u32,
    #[serde(rename = "# RS Files")]
    pub structure_set_files: u32,
    #[serde(rename = "# CT Files")]
    pub image_files: u32,
}

impl ExtractionRow {
    /// Plans and doses match the manifest and at least one image and structure set exist.
    #[must_use]
    pub const fn counts_agree(&self) -> bool {
        self.manifest_rows == self.plan_files
            && self.manifest_rows == self.dose_files
            && self.image_files >= 1
            && self.structure_set_files >= 1
    }
}

impl ReportRow for ExtractionRow {
    const TABLE_NAME: &'static str = "resultsQC1";
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Outcome of normalizing one manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CleanupRow {
    #[serde(rename = "Study ID")]
    pub study_id: String,
    #[serde(rename = "Manifest Line")]
    pub line: usize,
    #[serde(rename = "Plan ID")]
    pub plan_key: String,
    #[serde(rename = "Outcome")]
    pub outcome: UnitOutcome,
    #[serde(rename = "New Plan ID", default, skip_serializing_if = "Option::is_none")]
    pub new_label: Option<String>,
    #[serde(rename = "Fractions Before", default, skip_serializing_if = "Option::is_none")]
    pub fractions_before: Option<i64>,
    #[serde(rename = "Fractions After", default, skip_serializing_if = "Option::is_none")]
    pub fractions_after: Option<u32>,
    #[serde(rename = "Dose Scale Before", default, skip_serializing_if = "Option::is_none")]
    pub dose_scale_before: Option<f64>,
    #[serde(rename = "Dose Scale After", default, skip_serializing_if = "Option::is_none")]
    pub dose_scale_after: Option<f64>,
    #[serde(rename = "Structures Normalized", default)]
    pub anatomy_normalized: bool,
    #[serde(rename = "Structures Renamed", default, skip_serializing_if = "Vec::is_empty")]
    pub renamed_structures: Vec<String>,
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CleanupRow {
    /// A row for an entry whose processing has not produced anything yet.
    #[must_use]
    pub fn pending(study_id: &str, line: usize, plan_key: &str) -> Self {
        Self {
            study_id: study_id.to_string(),
            line,
            plan_key: plan_key.to_string(),
            outcome: UnitOutcome::Ok,
            new_label: None,
            fractions_before: None,
            fractions_after: None,
            dose_scale_before: None,
            dose_scale_after: None,
            anatomy_normalized: false,
            renamed_structures: Vec::new(),
            message: None,
        }
    }
}

impl ReportRow for CleanupRow {
    const TABLE_NAME: &'static str = "resultsCleanup";
}

// ---------------------------------------------------------------------------
// Cleanup QC (cross-validation)
// ---------------------------------------------------------------------------

/// One patient's cross-validation result.
///
/// Every check is `None` until its stage has run; an unset check counts as
/// failed in [`ValidationRow::everything_correct`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ValidationRow {
    #[serde(rename = "Study ID")]
    pub study_id: String,
    #[serde(rename = "Everything Correct", default)]
    pub everything_correct: bool,

    #[serde(rename = "Patient Exists", default, skip_serializing_if = "Option::is_none")]
    pub patient_exists: Option<bool>,
    #[serde(rename = "Correct No Of Plans", default, skip_serializing_if = "Option::is_none")]
    pub correct_plan_count: Option<bool>,
    #[serde(rename = "Correct Names Of Plans", default, skip_serializing_if = "Option::is_none")]
    pub correct_plan_names: Option<bool>,
    #[serde(rename = "Plans Have Dose", default, skip_serializing_if = "Option::is_none")]
    pub plans_have_dose: Option<bool>,
    #[serde(rename = "Plans Have Correct Dose", default, skip_serializing_if = "Option::is_none")]
    pub correct_dose: Option<bool>,
    #[serde(rename = "Correct CenterPoint", default, skip_serializing_if = "Option::is_none")]
    pub correct_center_point: Option<bool>,
    #[serde(rename = "Correct HU In CenterPoint", default, skip_serializing_if = "Option::is_none")]
    pub correct_center_intensity: Option<bool>,
    #[serde(rename = "Correct HU Among Neighbours", default, skip_serializing_if = "Option::is_none")]
    pub correct_neighbour_intensity: Option<bool>,

    #[serde(rename = "No Of Plans Extracted", default, skip_serializing_if = "Option::is_none")]
    pub plans_extracted: Option<u32>,
    #[serde(rename = "No Of Plans In Research", default, skip_serializing_if = "Option::is_none")]
    pub plans_in_research: Option<u32>,
    #[serde(rename = "Dose In Clinical", default, skip_serializing_if = "Option::is_none")]
    pub clinical_dose: Option<f64>,
    #[serde(rename = "Dose In Research", default, skip_serializing_if = "Option::is_none")]
    pub research_dose: Option<f64>,
    #[serde(rename = "CenterPoint In Clinical", default, skip_serializing_if = "Option::is_none")]
    pub clinical_center_point: Option<String>,
    #[serde(rename = "CenterPoint In Research", default, skip_serializing_if = "Option::is_none")]
    pub research_center_point: Option<String>,
    #[serde(rename = "HU In CenterPoint In Clinical", default, skip_serializing_if = "Option::is_none")]
    pub clinical_center_intensity: Option<f64>,
    #[serde(rename = "HU In CenterPoint In Research", default, skip_serializing_if = "Option::is_none")]
    pub research_center_intensity: Option<f64>,
    #[serde(rename = "HU Among Neighbours In Research", default, skip_serializing_if = "Option::is_none")]
    pub research_neighbour_intensities: Option<String>,
}

impl ValidationRow {
    #[must_use]
    pub fn new(study_id: &str) -> Self {
        Self {
            study_id: study_id.to_string(),
            ..Self::default()
        }
    }

    /// The seven checks that make up the aggregate, in report order.
    #[must_use]
    pub const fn aggregate_checks(&self) -> [Option<bool>; 7] {
        [
            self.patient_exists,
            self.correct_plan_count,
            self.correct_plan_names,
            self.plans_have_dose,
            self.correct_dose,
            self.correct_center_point,
            self.correct_neighbour_intensity,
        ]
    }

    /// Recompute `everything_correct` from the individual checks.
    pub fn finalize(&mut self) {
        self.everything_correct = self
            .aggregate_checks()
            .iter()
            .all(|check| *check == Some(true));
    }
}

impl ReportRow for ValidationRow {
    const TABLE_NAME: &'static str = "ResultsQC2";
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Dose metrics collected from the normalized research store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CollectionRow {
    #[serde(rename = "Study ID")]
    pub study_id: String,
    #[serde(rename = "Structure")]
    pub structure: String,
    #[serde(rename = "Mean dose [Gy]", default, skip_serializing_if = "Option::is_none")]
    pub mean_dose: Option<f64>,
    #[serde(rename = "Dose Level [Gy]")]
    pub dose_level: f64,
    #[serde(rename = "Volume At Dose Level [%]", default, skip_serializing_if = "Option::is_none")]
    pub volume_at_dose: Option<f64>,
}

impl ReportRow for CollectionRow {
    const TABLE_NAME: &'static str = "CollectedResults";
}
