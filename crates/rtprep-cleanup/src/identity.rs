//! Plan numbering and relabelling.
//!
//! Plans of a patient are numbered `P1`, `P2`, ... by first-fraction date.
//! When the entry's date is shared with another entry of the same patient the
//! date cannot order them, and the plan's position in the manifest is used
//! instead. The two rules are applied per entry, so a patient mixing unique
//! and shared dates can end up with colliding numbers; that case is left for
//! the cross-validation names check to catch.

use chrono::NaiveDate;
use rtprep_core::{PlanSlot, UnitError};
use rtprep_records::{Element, Record, Vr, tags};

/// 1-based ordinal of the plan `plan_key`, first given on `date`, among
/// `patient_slots` (manifest order, the plan itself included).
#[must_use]
pub fn plan_ordinal(patient_slots: &[&PlanSlot], plan_key: &str, date: NaiveDate) -> usize {
    let mut dates = patient_slots
        .iter()
        .map(|slot| slot.first_fraction_date)
        .collect::<Vec<_>>();
    dates.sort_unstable();

    let same_date = dates.iter().filter(|other| **other == date).count();

    let position = if same_date > 1 {
        patient_slots.iter().position(|slot| slot.plan_key == plan_key)
    } else {
        dates.iter().position(|other| *other == date)
    };
    position.map_or(0, |index| index + 1)
}

/// Label change applied to one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRelabel {
    pub old_label: String,
    pub new_label: String,
}

/// Keep the current label as the plan name and label the plan `P{ordinal}`.
///
/// The name element is created when the plan has none.
pub fn relabel(plan: &mut Record, ordinal: usize) -> Result<PlanRelabel, UnitError> {
    let old_label = plan
        .text(tags::RT_PLAN_LABEL)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| UnitError::parse("RTPlanLabel", "missing in plan record"))?;
    let new_label = format!("P{ordinal}");

    match plan.find_first_mut(tags::RT_PLAN_NAME) {
        Some(name) => name.set_text(old_label.clone()),
        None => plan.add(Element::text(tags::RT_PLAN_NAME, Vr::LO, old_label.clone())),
    }
    if let Some(label) = plan.find_first_mut(tags::RT_PLAN_LABEL) {
        label.set_text(new_label.clone());
    }

    Ok(PlanRelabel {
        old_label,
        new_label,
    })
}
