//! Dose metric collection from the normalized research store.
//!
//! After cleanup every plan carries the dose actually delivered, so course
//! totals are plain sums over the plans of the first course.

use rtprep_core::numeric::round_to;
use rtprep_core::reports::CollectionRow;
use rtprep_core::{ExtractionManifest, UnitError};

use crate::model::Patient;
use crate::store::{PatientSession, ResearchStore};

pub struct Collector<'a, S: ?Sized> {
    store: &'a mut S,
    structure: String,
    dose_level: f64,
}

impl<'a, S: ResearchStore + ?Sized> Collector<'a, S> {
    pub fn new(store: &'a mut S, structure: impl Into<String>, dose_level: f64) -> Self {
        Self {
            store,
            structure: structure.into(),
            dose_level,
        }
    }

    /// Collect every study of the extraction manifest, in manifest order.
    pub fn run(
        &mut self,
        manifest: &ExtractionManifest,
        mut on_row: impl FnMut(&CollectionRow),
    ) -> Vec<CollectionRow> {
        let _span = tracing::info_span!("collection", structure = %self.structure).entered();
        manifest
            .study_ids()
            .into_iter()
            .map(|study_id| {
                let row = self.collect(study_id);
                on_row(&row);
                row
            })
            .collect()
    }

    /// Collect one patient. Values that cannot be computed stay unset.
    pub fn collect(&mut self, study_id: &str) -> CollectionRow {
        let _span = tracing::info_span!("patient", study = study_id).entered();
        let mut row = CollectionRow {
            study_id: study_id.to_string(),
            structure: self.structure.clone(),
            dose_level: self.dose_level,
            ..CollectionRow::default()
        };

        let mut session = match PatientSession::open(&mut *self.store, study_id) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(%error, "patient not collected");
                return row;
            }
        };

        match session.patient().map_err(UnitError::external).and_then(|patient| {
            mean_dose(patient, &self.structure)
        }) {
            Ok(dose) => row.mean_dose = Some(dose),
            Err(error) => tracing::warn!(%error, "mean dose not collected"),
        }
        match volume_at_dose(&mut session, &self.structure, self.dose_level) {
            Ok(volume) => row.volume_at_dose = volume,
            Err(error) => tracing::warn!(%error, "volume at dose not collected"),
        }
        row
    }
}

/// Sum of the plans' mean doses to `structure`, rounded to 2 decimals.
///
/// A plan whose structure set lacks the structure contributes nothing.
pub fn mean_dose(patient: &Patient, structure: &str) -> Result<f64, UnitError> {
    let course = patient.first_course().map_err(UnitError::external)?;
    let total = course
        .plans
        .iter()
        .filter(|plan| {
            patient
                .plan_structure_set(plan)
                .is_ok_and(|set| set.structure(structure).is_some())
        })
        .filter_map(|plan| plan.mean_dose(structure))
        .sum();
    Ok(round_to(total, 2))
}

/// Relative volume (%) of `structure` receiving `dose_level` Gy in the sum of all dosed plans.
///
/// `Some(0.0)` when the plans lie on different images, or when the sum has no
/// curve for the structure or no point at the dose level. `None` when no plan
/// has a valid dose.
pub fn volume_at_dose<S: ResearchStore + ?Sized>(
    session: &mut PatientSession<'_, S>,
    structure: &str,
    dose_level: f64,
) -> Result<Option<f64>, UnitError> {
    let (plan_ids, image_id) = {
        let patient = session.patient().map_err(UnitError::external)?;
        let course = patient.first_course().map_err(UnitError::external)?;

        let mut plan_ids = Vec::new();
        let mut image_id: Option<&str> = None;
        for plan in course.plans.iter().filter(|plan| plan.is_dose_valid) {
            let image = patient
                .plan_structure_set(plan)
                .map_err(UnitError::external)?
                .image_id
                .as_str();
            match image_id {
                None => image_id = Some(image),
                Some(first) if first != image => {
                    tracing::info!(plan = %plan.id, "plans lie on more than one image");
                    return Ok(Some(0.0));
                }
                Some(_) => {}
            }
            plan_ids.push(plan.id.clone());
        }
        match image_id {
            Some(image_id) => (plan_ids, image_id.to_string()),
            None => {
                tracing::info!("no plan with valid dose");
                return Ok(None);
            }
        }
    };

    let sum = session
        .create_plan_sum(&plan_ids, &image_id)
        .map_err(UnitError::external)?;
    #[allow(clippy::float_cmp)]
    let volume = sum
        .dvh
        .get(structure)
        .and_then(|dvh| {
            dvh.curve
                .iter()
                .find(|point| round_to(point.dose, 3) == dose_level)
        })
        .map_or(0.0, |point| point.volume);
    Ok(Some(volume))
}
