//! Fraction count and dose-grid rescaling.
//!
//! A plan exported before the course finished still prescribes the planned
//! number of fractions, and its dose grid holds the planned total. Both are
//! rewritten to what was delivered: the fraction count is replaced and the
//! grid scale factor is multiplied by `delivered / prescribed`.

use rtprep_core::UnitError;
use rtprep_records::{Element, Record, tags};

/// Values before and after rescaling one plan/dose pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionRescale {
    pub old_fractions: i64,
    pub new_fractions: u32,
    pub old_scale: f64,
    pub new_scale: f64,
}

impl FractionRescale {
    /// Compute the rescale without touching any record.
    pub fn compute(plan: &Record, dose: &Record, delivered: u32) -> Result<Self, UnitError> {
        let old_fractions = plan
            .find_first(tags::NUMBER_OF_FRACTIONS_PLANNED)
            .ok_or_else(|| UnitError::parse("NumberOfFractionsPlanned", "missing in plan record"))?
            .as_i64()
            .ok_or_else(|| UnitError::parse("NumberOfFractionsPlanned", "not an integer"))?;
        if old_fractions <= 0 {
            return Err(UnitError::parse(
                "NumberOfFractionsPlanned",
                format!("prescribed fraction count must be positive, found {old_fractions}"),
            ));
        }

        let old_scale = dose
            .find_first(tags::DOSE_GRID_SCALING)
            .ok_or_else(|| UnitError::parse("DoseGridScaling", "missing in dose record"))?
            .as_f64()
            .ok_or_else(|| UnitError::parse("DoseGridScaling", "not a number"))?;

        #[allow(clippy::cast_precision_loss)]
        let new_scale = old_scale * f64::from(delivered) / old_fractions as f64;

        Ok(Self {
            old_fractions,
            new_fractions: delivered,
            old_scale,
            new_scale,
        })
    }

    /// Write the new values into the plan and dose records.
    pub fn apply(&self, plan: &mut Record, dose: &mut Record) {
        plan.replace(Element::int(
            tags::NUMBER_OF_FRACTIONS_PLANNED,
            i64::from(self.new_fractions),
        ));
        dose.replace(Element::decimal(tags::DOSE_GRID_SCALING, self.new_scale));
    }
}

/// Rescale a plan/dose pair to `delivered` fractions.
///
/// On error neither record has been modified.
pub fn rescale(
    plan: &mut Record,
    dose: &mut Record,
    delivered: u32,
) -> Result<FractionRescale, UnitError> {
    let rescale = FractionRescale::compute(plan, dose, delivered)?;
    rescale.apply(plan, dose);
    Ok(rescale)
}
