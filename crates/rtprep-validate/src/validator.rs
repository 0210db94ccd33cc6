//! Per-patient cross-validation of the research store.
//!
//! Each check is its own step. A step that fails leaves only its own columns
//! unset and is logged; the row is still written and the batch continues.
//! The patient session is closed when the row is complete, whatever happened.

use rtprep_core::manifest::ValidationLine;
use rtprep_core::numeric::{round_to, to_count, within};
use rtprep_core::reports::ValidationRow;
use rtprep_core::{ExtractionManifest, UnitError, ValidationManifest};

use crate::model::{Image, Patient};
use crate::reference::{Reference, ReferenceStrategy};
use crate::sampling;
use crate::store::{PatientSession, ResearchStore};

/// Largest differences still counted as agreement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Gy.
    pub dose: f64,
    /// mm.
    pub distance: f64,
    /// HU.
    pub intensity: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            dose: 0.1,
            distance: 0.3,
            intensity: 5.0,
        }
    }
}

pub struct CrossValidator<'a, S: ?Sized, R> {
    store: &'a mut S,
    strategy: R,
    tolerances: Tolerances,
    extraction: &'a ExtractionManifest,
    validation: &'a ValidationManifest,
}

impl<'a, S: ResearchStore + ?Sized, R: ReferenceStrategy> CrossValidator<'a, S, R> {
    pub fn new(
        store: &'a mut S,
        strategy: R,
        tolerances: Tolerances,
        extraction: &'a ExtractionManifest,
        validation: &'a ValidationManifest,
    ) -> Self {
        Self {
            store,
            strategy,
            tolerances,
            extraction,
            validation,
        }
    }

    /// Validate every study of the extraction manifest, in manifest order.
    pub fn run(&mut self, mut on_row: impl FnMut(&ValidationRow)) -> Vec<ValidationRow> {
        let _span = tracing::info_span!("cleanup_qc").entered();
        for error in &self.validation.rejected {
            tracing::warn!(%error, "validation manifest line rejected");
        }

        let study_ids = self
            .extraction
            .study_ids()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        study_ids
            .iter()
            .map(|study_id| {
                let row = self.validate(study_id);
                on_row(&row);
                row
            })
            .collect()
    }

    /// Validate one patient.
    pub fn validate(&mut self, study_id: &str) -> ValidationRow {
        let _span = tracing::info_span!("patient", study = study_id).entered();
        let mut row = ValidationRow::new(study_id);

        match self.store.patient_exists(study_id) {
            Ok(true) => row.patient_exists = Some(true),
            Ok(false) => {
                tracing::warn!("patient missing from research store");
                row.patient_exists = Some(false);
                row.finalize();
                return row;
            }
            Err(error) => {
                tracing::warn!(%error, "could not query research store");
                row.finalize();
                return row;
            }
        }

        let session = match PatientSession::open(&mut *self.store, study_id) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(%error, "could not open patient");
                row.finalize();
                return row;
            }
        };
        let patient = match session.patient() {
            Ok(patient) => patient,
            Err(error) => {
                tracing::warn!(%error, "could not open patient");
                row.finalize();
                return row;
            }
        };

        let checks = Checks {
            patient,
            study_id,
            tolerances: self.tolerances,
            extraction: self.extraction,
            line: self.validation.find(study_id),
        };
        checks.run(&self.strategy, &mut row);
        drop(session);

        row.finalize();
        tracing::info!(correct = row.everything_correct, "patient validated");
        row
    }
}

/// Check steps over one open patient.
struct Checks<'a> {
    patient: &'a Patient,
    study_id: &'a str,
    tolerances: Tolerances,
    extraction: &'a ExtractionManifest,
    line: Option<&'a ValidationLine>,
}

impl Checks<'_> {
    fn run(&self, strategy: &impl ReferenceStrategy, row: &mut ValidationRow) {
        step("plan count", self.plan_count(row));
        step("plan names", self.plan_names(row));
        step("dose presence", self.dose_presence(row));

        let reference = match strategy.select(self.patient) {
            Ok(reference) => reference,
            Err(error) => {
                tracing::warn!(%error, "reference structure not selected");
                return;
            }
        };
        step("reference dose", self.reference_dose(&reference, row));
        step("center point", self.center_point(&reference, row));

        let image = match self.patient.image(&reference.structure_set.image_id) {
            Ok(image) => image,
            Err(error) => {
                tracing::warn!(%error, "reference image missing");
                return;
            }
        };
        step("center intensity", self.center_intensity(&reference, image, row));
        step(
            "neighbour intensity",
            self.neighbour_intensity(&reference, image, row),
        );
    }

    fn manifest_line(&self) -> Result<&ValidationLine, UnitError> {
        self.line.ok_or_else(|| {
            UnitError::resolution("validation manifest line", self.study_id.to_string())
        })
    }

    fn research_plan_count(&self) -> Result<usize, UnitError> {
        self.patient
            .first_course()
            .map(|course| course.plans.len())
            .map_err(UnitError::external)
    }

    fn plan_count(&self, row: &mut ValidationRow) -> Result<(), UnitError> {
        let extracted = self.extraction.plan_count(self.study_id);
        let research = self.research_plan_count()?;
        row.correct_plan_count = Some(extracted == research);
        row.plans_extracted = Some(to_count(extracted));
        row.plans_in_research = Some(to_count(research));
        Ok(())
    }

    fn plan_names(&self, row: &mut ValidationRow) -> Result<(), UnitError> {
        let course = self.patient.first_course().map_err(UnitError::external)?;
        let correct = (1..=course.plans.len()).all(|ordinal| {
            let label = format!("P{ordinal}");
            course.plans.iter().filter(|plan| plan.id == label).count() == 1
        });
        row.correct_plan_names = Some(correct);
        Ok(())
    }

    fn dose_presence(&self, row: &mut ValidationRow) -> Result<(), UnitError> {
        let course = self.patient.first_course().map_err(UnitError::external)?;
        row.plans_have_dose = Some(course.plans.iter().all(|plan| plan.is_dose_valid));
        Ok(())
    }

    fn reference_dose(
        &self,
        reference: &Reference<'_>,
        row: &mut ValidationRow,
    ) -> Result<(), UnitError> {
        let clinical = round_to(self.manifest_line()?.reference_dose()?, 2);
        let course = self.patient.first_course().map_err(UnitError::external)?;
        let research = round_to(
            course
                .plans
                .iter()
                .filter_map(|plan| plan.mean_dose(&reference.structure.id))
                .sum(),
            2,
        );

        row.correct_dose = Some(within(clinical, research, self.tolerances.dose));
        row.clinical_dose = Some(clinical);
        row.research_dose = Some(research);
        Ok(())
    }

    fn center_point(
        &self,
        reference: &Reference<'_>,
        row: &mut ValidationRow,
    ) -> Result<(), UnitError> {
        let clinical = self.manifest_line()?.center_point()?;
        let research = reference.structure.center_point;

        row.correct_center_point = Some(clinical.distance(research) < self.tolerances.distance);
        row.clinical_center_point = Some(clinical.to_string());
        row.research_center_point = Some(research.to_string());
        Ok(())
    }

    fn center_intensity(
        &self,
        reference: &Reference<'_>,
        image: &Image,
        row: &mut ValidationRow,
    ) -> Result<(), UnitError> {
        let clinical = self.manifest_line()?.center_point_intensity()?;
        let research = sampling::sample(image, reference.structure.center_point)
            .map_err(UnitError::external)?;

        row.correct_center_intensity =
            Some(within(clinical, research, self.tolerances.intensity));
        row.clinical_center_intensity = Some(clinical);
        row.research_center_intensity = Some(research);
        Ok(())
    }

    fn neighbour_intensity(
        &self,
        reference: &Reference<'_>,
        image: &Image,
        row: &mut ValidationRow,
    ) -> Result<(), UnitError> {
        let clinical = self.manifest_line()?.center_point_intensity()?;
        let values = sampling::neighbourhood(image, reference.structure.center_point)
            .map_err(UnitError::external)?;

        #[allow(clippy::float_cmp)]
        let found = values.iter().any(|value| *value == clinical);
        row.correct_neighbour_intensity = Some(found);
        row.research_neighbour_intensities = Some(
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        );
        Ok(())
    }
}

fn step(name: &str, result: Result<(), UnitError>) {
    if let Err(error) = result {
        tracing::warn!(check = name, outcome = %error.outcome(), %error, "check not completed");
    }
}
