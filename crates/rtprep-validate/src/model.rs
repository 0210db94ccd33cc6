//! Patient data as held by the research store.
//!
//! Only what the checks and the collection read is modelled: courses of plans
//! with their dose-volume summaries, structure sets, image volumes, and plan
//! sums. Ids are matched exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rtprep_core::Point3;

use crate::error::StoreError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub structure_sets: Vec<StructureSet>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub plan_sums: Vec<PlanSum>,
}

impl Patient {
    /// The course the pipeline works on: the first one.
    pub fn first_course(&self) -> Result<&Course, StoreError> {
        self.courses
            .first()
            .ok_or_else(|| StoreError::not_found("course", &self.id))
    }

    pub fn structure_set(&self, id: &str) -> Result<&StructureSet, StoreError> {
        self.structure_sets
            .iter()
            .find(|set| set.id == id)
            .ok_or_else(|| StoreError::not_found("structure set", id))
    }

    pub fn image(&self, id: &str) -> Result<&Image, StoreError> {
        self.images
            .iter()
            .find(|image| image.id == id)
            .ok_or_else(|| StoreError::not_found("image", id))
    }

    /// The structure set a plan was planned on.
    pub fn plan_structure_set(&self, plan: &PlanSetup) -> Result<&StructureSet, StoreError> {
        let id = plan
            .structure_set_id
            .as_deref()
            .ok_or_else(|| StoreError::not_found("structure set of plan", &plan.id))?;
        self.structure_set(id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub plans: Vec<PlanSetup>,
}

impl Course {
    pub fn plan(&self, id: &str) -> Result<&PlanSetup, StoreError> {
        self.plans
            .iter()
            .find(|plan| plan.id == id)
            .ok_or_else(|| StoreError::not_found("plan", id))
    }
}

/// An external-beam plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanSetup {
    pub id: String,
    #[serde(default)]
    pub is_dose_valid: bool,
    #[serde(default)]
    pub structure_set_id: Option<String>,
    /// Dose-volume summaries keyed by structure id.
    #[serde(default)]
    pub dvh: BTreeMap<String, Dvh>,
}

impl PlanSetup {
    /// Mean dose (Gy) to a structure, if the plan has a summary for it.
    #[must_use]
    pub fn mean_dose(&self, structure_id: &str) -> Option<f64> {
        self.dvh.get(structure_id).map(|dvh| dvh.mean_dose)
    }
}

/// Cumulative dose-volume histogram of one structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dvh {
    /// Absolute mean dose (Gy).
    pub mean_dose: f64,
    /// Curve points, dose in Gy and volume in percent of the structure.
    #[serde(default)]
    pub curve: Vec<DvhPoint>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DvhPoint {
    pub dose: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructureSet {
    pub id: String,
    pub image_id: String,
    #[serde(default)]
    pub structures: Vec<Structure>,
}

impl StructureSet {
    #[must_use]
    pub fn structure(&self, id: &str) -> Option<&Structure> {
        self.structures.iter().find(|structure| structure.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Structure {
    pub id: String,
    pub center_point: Point3,
}

fn default_slope() -> f64 {
    1.0
}

fn default_direction() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// A 3-D image volume.
///
/// `voxels` holds raw stored values, x fastest, then y, then z (slice).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: String,
    /// Voxel counts along x, y and z.
    pub size: [usize; 3],
    /// Patient coordinates (mm) of the first voxel.
    pub origin: Point3,
    /// Voxel spacing (mm).
    pub resolution: [f64; 3],
    /// Axis direction signs along x, y and z.
    #[serde(default = "default_direction")]
    pub direction: [f64; 3],
    #[serde(default = "default_slope")]
    pub slope: f64,
    #[serde(default)]
    pub intercept: f64,
    pub voxels: Vec<i32>,
}

impl Image {
    /// Display value (HU) of the voxel at integer index `(x, y, z)`.
    pub fn display_value(&self, x: i64, y: i64, z: i64) -> Result<f64, StoreError> {
        let expected = self.size.iter().product::<usize>();
        if self.voxels.len() != expected {
            return Err(StoreError::VoxelCount {
                image: self.id.clone(),
                expected,
                found: self.voxels.len(),
            });
        }

        let out_of_range = || StoreError::VoxelOutOfRange {
            image: self.id.clone(),
            x,
            y,
            z,
        };
        let axis = |value: i64, len: usize| {
            usize::try_from(value)
                .ok()
                .filter(|index| *index < len)
                .ok_or_else(&out_of_range)
        };
        let (ix, iy, iz) = (
            axis(x, self.size[0])?,
            axis(y, self.size[1])?,
            axis(z, self.size[2])?,
        );

        let raw = self.voxels[ix + self.size[0] * (iy + self.size[1] * iz)];
        Ok(f64::from(raw).mul_add(self.slope, self.intercept))
    }
}

/// A summation of several plans on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanSum {
    pub plan_ids: Vec<String>,
    pub image_id: String,
    /// Relative cumulative dose-volume histograms keyed by structure id.
    #[serde(default)]
    pub dvh: BTreeMap<String, Dvh>,
}

impl PlanSum {
    /// Whether this sum covers exactly `plan_ids` (in any order) on `image_id`.
    #[must_use]
    pub fn covers(&self, plan_ids: &[String], image_id: &str) -> bool {
        let mut own = self.plan_ids.iter().collect::<Vec<_>>();
        let mut wanted = plan_ids.iter().collect::<Vec<_>>();
        own.sort_unstable();
        wanted.sort_unstable();
        self.image_id == image_id && own == wanted
    }
}
