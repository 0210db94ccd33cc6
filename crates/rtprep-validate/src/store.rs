//! Research store access.
//!
//! The store holds one open patient at a time. [`PatientSession`] opens a
//! patient and closes it again when dropped, so a failing check can never
//! leave a patient open for the next one.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::{Patient, PlanSum};

pub trait ResearchStore {
    fn patient_exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Open a patient, closing any previously open one.
    fn open_patient(&mut self, id: &str) -> Result<(), StoreError>;

    /// The open patient, if any.
    fn patient(&self) -> Option<&Patient>;

    fn close_patient(&mut self);

    /// Sum `plan_ids` of the open patient on `image_id`.
    fn create_plan_sum(&mut self, plan_ids: &[String], image_id: &str)
    -> Result<PlanSum, StoreError>;
}

/// Exclusive hold on one open patient. Closes the patient on drop.
pub struct PatientSession<'s, S: ResearchStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: ResearchStore + ?Sized> PatientSession<'s, S> {
    pub fn open(store: &'s mut S, id: &str) -> Result<Self, StoreError> {
        store.open_patient(id)?;
        Ok(Self { store })
    }

    pub fn patient(&self) -> Result<&Patient, StoreError> {
        self.store.patient().ok_or(StoreError::NoPatientOpen)
    }

    pub fn create_plan_sum(
        &mut self,
        plan_ids: &[String],
        image_id: &str,
    ) -> Result<PlanSum, StoreError> {
        self.store.create_plan_sum(plan_ids, image_id)
    }
}

impl<S: ResearchStore + ?Sized> Drop for PatientSession<'_, S> {
    fn drop(&mut self) {
        self.store.close_patient();
    }
}

/// Research store backed by one JSON snapshot per patient: `<dir>/<id>.json`.
///
/// Plan sums cannot be computed from per-plan summaries, so they must be
/// present in the snapshot; `create_plan_sum` looks them up.
#[derive(Debug, Clone)]
pub struct JsonResearchStore {
    dir: PathBuf,
    current: Option<Patient>,
}

impl JsonResearchStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl ResearchStore for JsonResearchStore {
    fn patient_exists(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.snapshot_path(id);
        match std::fs::metadata(&path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn open_patient(&mut self, id: &str) -> Result<(), StoreError> {
        self.current = None;
        let path = self.snapshot_path(id);
        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::PatientNotFound(id.to_string())
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let patient = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Snapshot { path, source })?;
        tracing::debug!(patient = id, "patient opened");
        self.current = Some(patient);
        Ok(())
    }

    fn patient(&self) -> Option<&Patient> {
        self.current.as_ref()
    }

    fn close_patient(&mut self) {
        if let Some(patient) = self.current.take() {
            tracing::debug!(patient = %patient.id, "patient closed");
        }
    }

    fn create_plan_sum(
        &mut self,
        plan_ids: &[String],
        image_id: &str,
    ) -> Result<PlanSum, StoreError> {
        let patient = self.current.as_ref().ok_or(StoreError::NoPatientOpen)?;
        patient
            .plan_sums
            .iter()
            .find(|sum| sum.covers(plan_ids, image_id))
            .cloned()
            .ok_or_else(|| StoreError::PlanSum {
                plans: plan_ids.join(","),
                image: image_id.to_string(),
            })
    }
}
