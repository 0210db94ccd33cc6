//! Reference structure selection.
//!
//! The dose and geometry checks compare one anatomical region between the
//! clinical and the research data. Which region depends on the study, so the
//! choice is a [`ReferenceStrategy`].

use rtprep_core::UnitError;

use crate::model::{Patient, Structure, StructureSet};

/// The selected region and the structure set it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'p> {
    pub structure: &'p Structure,
    pub structure_set: &'p StructureSet,
}

pub trait ReferenceStrategy {
    fn select<'p>(&self, patient: &'p Patient) -> Result<Reference<'p>, UnitError>;
}

/// Regions of one plan's structure set whose id starts with `prefix`.
///
/// With several candidates the one named exactly `preferred` is taken;
/// a single candidate is taken whatever its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixPreferenceStrategy {
    pub plan: String,
    pub prefix: String,
    pub preferred: String,
}

impl PrefixPreferenceStrategy {
    pub fn new(
        plan: impl Into<String>,
        prefix: impl Into<String>,
        preferred: impl Into<String>,
    ) -> Self {
        Self {
            plan: plan.into(),
            prefix: prefix.into(),
            preferred: preferred.into(),
        }
    }
}

impl Default for PrefixPreferenceStrategy {
    fn default() -> Self {
        Self::new("P1", "Lung", "Lung_L")
    }
}

impl ReferenceStrategy for PrefixPreferenceStrategy {
    fn select<'p>(&self, patient: &'p Patient) -> Result<Reference<'p>, UnitError> {
        let plan = patient
            .first_course()
            .and_then(|course| course.plan(&self.plan))
            .map_err(UnitError::external)?;
        let structure_set = patient
            .plan_structure_set(plan)
            .map_err(UnitError::external)?;

        let candidates = structure_set
            .structures
            .iter()
            .filter(|structure| structure.id.starts_with(&self.prefix))
            .collect::<Vec<_>>();

        let structure = match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            several => several
                .iter()
                .find(|structure| structure.id == self.preferred)
                .copied(),
        }
        .ok_or_else(|| {
            UnitError::resolution(
                "reference structure",
                format!(
                    "{} candidate(s) starting with '{}' in plan {}, none named '{}'",
                    candidates.len(),
                    self.prefix,
                    self.plan,
                    self.preferred
                ),
            )
        })?;

        Ok(Reference {
            structure,
            structure_set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, PlanSetup};
    use rstest::rstest;
    use rtprep_core::Point3;

    fn patient(structures: &[&str]) -> Patient {
        Patient {
            id: "S1".into(),
            courses: vec![Course {
                id: "C1".into(),
                plans: vec![PlanSetup {
                    id: "P1".into(),
                    structure_set_id: Some("SS1".into()),
                    ..PlanSetup::default()
                }],
            }],
            structure_sets: vec![StructureSet {
                id: "SS1".into(),
                image_id: "CT1".into(),
                structures: structures
                    .iter()
                    .map(|id| Structure {
                        id: (*id).to_string(),
                        center_point: Point3::default(),
                    })
                    .collect(),
            }],
            ..Patient::default()
        }
    }

    #[rstest]
    #[case(&["BODY", "Lung_R", "Lung_L"], "Lung_L")]
    #[case(&["BODY", "Lung_R"], "Lung_R")]
    #[case(&["LungTotal"], "LungTotal")]
    fn selects_reference(#[case] structures: &[&str], #[case] expected: &str) {
        let patient = patient(structures);
        let selected = PrefixPreferenceStrategy::default().select(&patient).unwrap();
        assert_eq!(selected.structure.id, expected);
        assert_eq!(selected.structure_set.image_id, "CT1");
    }

    #[rstest]
    #[case(&["BODY"])]
    #[case(&["Lung_R", "LungTotal"])]
    fn no_unambiguous_reference(#[case] structures: &[&str]) {
        let err = PrefixPreferenceStrategy::default()
            .select(&patient(structures))
            .unwrap_err();
        assert!(matches!(err, UnitError::Resolution { .. }));
    }

    #[test]
    fn missing_plan_is_external() {
        let strategy = PrefixPreferenceStrategy::new("P9", "Lung", "Lung_L");
        let err = strategy.select(&patient(&["Lung_L"])).unwrap_err();
        assert!(matches!(err, UnitError::External(_)));
    }
}
