//! Research store error types.

use std::path::PathBuf;

use rtprep_core::Point3;

/// Errors raised while reading from the research store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error while reading a patient snapshot.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A patient snapshot is not valid JSON or does not match the model.
    #[error("invalid patient snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No patient with this id exists in the store.
    #[error("patient not found: {0}")]
    PatientNotFound(String),

    /// An operation needs an open patient.
    #[error("no patient is open")]
    NoPatientOpen,

    /// A referenced object is missing from the patient.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The store cannot sum this combination of plans.
    #[error("no plan sum of [{plans}] on image {image}")]
    PlanSum { plans: String, image: String },

    /// A voxel index falls outside the image.
    #[error("voxel ({x}, {y}, {z}) is outside image {image}")]
    VoxelOutOfRange {
        image: String,
        x: i64,
        y: i64,
        z: i64,
    },

    /// A point maps to no usable voxel index: far outside the image, or the
    /// image geometry has a zero spacing or direction.
    #[error("point ({point}) has no voxel index in image {image}")]
    PointOutsideImage { image: String, point: Point3 },

    /// The image voxel buffer does not match its dimensions.
    #[error("image {image} holds {found} voxels, expected {expected}")]
    VoxelCount {
        image: String,
        expected: usize,
        found: usize,
    },
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
