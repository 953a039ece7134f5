//! Folding equipment modifiers into an adjusted cost or weight.
//!
//! Both folds visit the stages in [`ModifierStage::ORDER`]. Within a stage,
//! multiplicative adjustments apply in the order the enabled modifiers appear on
//! the trait. Results never go below zero.

use crate::error::CalcResult;
use crate::fxp::Fixed6;
use crate::units::Weight;

use super::{CostAdjustment, EquipmentModifier, ModifierStage, WeightAdjustment};

/// Lowest aggregate cost factor the base stage accepts.
pub const MIN_COST_FACTOR: Fixed6 = Fixed6::from_decimal(-8, 1);

fn enabled_in<'a>(
    modifiers: &'a [EquipmentModifier],
    stage: ModifierStage,
    stage_of: fn(&EquipmentModifier) -> ModifierStage,
) -> impl Iterator<Item = &'a EquipmentModifier> {
    modifiers
        .iter()
        .filter(move |modifier| modifier.enabled && stage_of(modifier) == stage)
}

/// Adjusts `value` for the cost adjustments of the enabled `modifiers`.
pub fn value_adjusted_for_modifiers(
    value: Fixed6,
    modifiers: &[EquipmentModifier],
) -> CalcResult<Fixed6> {
    let mut cost = additive_cost_stage(ModifierStage::Original, value, modifiers)?;

    let mut factor = Fixed6::ZERO;
    for modifier in enabled_in(modifiers, ModifierStage::Base, |m| m.cost_stage) {
        factor += match modifier.cost {
            CostAdjustment::Multiplier(amount) => amount - Fixed6::ONE,
            CostAdjustment::Percentage(amount) => amount.div_int(100)?,
            CostAdjustment::Addition(amount) | CostAdjustment::CostFactor(amount) => amount,
        };
    }
    if !factor.is_zero() {
        factor = factor.max(MIN_COST_FACTOR);
        cost = cost.checked_mul(factor + Fixed6::ONE)?;
    }

    cost = additive_cost_stage(ModifierStage::FinalBase, cost, modifiers)?;
    cost = additive_cost_stage(ModifierStage::Final, cost, modifiers)?;
    Ok(cost.max(Fixed6::ZERO))
}

fn additive_cost_stage(
    stage: ModifierStage,
    value: Fixed6,
    modifiers: &[EquipmentModifier],
) -> CalcResult<Fixed6> {
    let mut cost = value;
    let mut additions = Fixed6::ZERO;
    let mut percentages = Fixed6::ZERO;
    for modifier in enabled_in(modifiers, stage, |m| m.cost_stage) {
        match modifier.cost {
            CostAdjustment::Addition(amount) => additions += amount,
            CostAdjustment::Percentage(amount) => percentages += amount,
            CostAdjustment::Multiplier(amount) => cost = cost.checked_mul(amount)?,
            // Outside the base stage a cost factor reads as a percentage.
            CostAdjustment::CostFactor(amount) => percentages += amount.mul_int(100),
        }
    }
    cost = cost.checked_add(additions)?;
    if !percentages.is_zero() {
        cost = cost.checked_add(value.checked_mul(percentages)?.div_int(100)?)?;
    }
    Ok(cost)
}

/// Adjusts `weight` for the weight adjustments of the enabled `modifiers`.
///
/// The result keeps the units of `weight`; additions are converted into them.
pub fn weight_adjusted_for_modifiers(
    weight: Weight,
    modifiers: &[EquipmentModifier],
    simple_metric: bool,
) -> CalcResult<Weight> {
    let units = weight.units;
    let original = weight.value;
    let mut value = original;
    let mut percentages = Fixed6::ZERO;
    for modifier in enabled_in(modifiers, ModifierStage::Original, |m| m.weight_stage) {
        match modifier.weight {
            WeightAdjustment::Addition(extra) => {
                value = value.checked_add(extra.convert_to(units, simple_metric)?.value)?;
            }
            WeightAdjustment::Percentage(amount) => percentages += amount,
            WeightAdjustment::Multiplier(fraction) => {
                value = value
                    .checked_mul(fraction.numerator)?
                    .checked_div(fraction.denominator)?;
            }
            WeightAdjustment::PercentageMultiplier(fraction) => {
                value = value
                    .checked_mul(fraction.numerator)?
                    .checked_div(fraction.denominator.mul_int(100))?;
            }
        }
    }
    if !percentages.is_zero() {
        value = value.checked_add(original.checked_mul(percentages)?.div_int(100)?)?;
    }

    for stage in [ModifierStage::Base, ModifierStage::FinalBase, ModifierStage::Final] {
        value = multiplicative_weight_stage(stage, Weight::new(value, units), modifiers, simple_metric)?;
    }
    Ok(Weight::new(value.max(Fixed6::ZERO), units))
}

fn multiplicative_weight_stage(
    stage: ModifierStage,
    weight: Weight,
    modifiers: &[EquipmentModifier],
    simple_metric: bool,
) -> CalcResult<Fixed6> {
    let mut value = weight.value;
    let mut sum = Fixed6::ZERO;
    for modifier in enabled_in(modifiers, stage, |m| m.weight_stage) {
        match modifier.weight {
            WeightAdjustment::Addition(extra) => {
                sum = sum.checked_add(extra.convert_to(weight.units, simple_metric)?.value)?;
            }
            WeightAdjustment::Multiplier(fraction) => {
                value = value
                    .checked_mul(fraction.numerator)?
                    .checked_div(fraction.denominator)?;
            }
            WeightAdjustment::PercentageMultiplier(fraction) => {
                value = value
                    .checked_mul(fraction.numerator)?
                    .checked_div(fraction.denominator.mul_int(100))?;
            }
            WeightAdjustment::Percentage(amount) => {
                value = value.checked_mul(amount)?.div_int(100)?;
            }
        }
    }
    value.checked_add(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;
    use crate::modifier::Fraction;
    use crate::units::WeightUnits;

    fn cost(stage: ModifierStage, text: &str) -> EquipmentModifier {
        EquipmentModifier::with_cost(text, stage, text.parse().unwrap())
    }

    fn weight(stage: ModifierStage, text: &str) -> EquipmentModifier {
        EquipmentModifier::with_weight(text, stage, text.parse().unwrap())
    }

    fn fx(value: i64) -> Fixed6 {
        Fixed6::from_int(value)
    }

    #[test]
    fn empty_modifier_list_is_identity() {
        assert_eq!(value_adjusted_for_modifiers(fx(100), &[]).unwrap(), fx(100));
        let base = Weight::new(Fixed6::from_decimal(25, 1), WeightUnits::Kilogram);
        assert_eq!(weight_adjusted_for_modifiers(base, &[], true).unwrap(), base);
    }

    #[test]
    fn original_stage_percentages_use_the_pre_stage_value() {
        let mods = [
            cost(ModifierStage::Original, "+50%"),
            cost(ModifierStage::Original, "+25%"),
        ];
        assert_eq!(value_adjusted_for_modifiers(fx(100), &mods).unwrap(), fx(175));
    }

    #[test]
    fn multipliers_apply_before_additions_and_percentages() {
        let mods = [
            cost(ModifierStage::Original, "+10"),
            cost(ModifierStage::Original, "x2"),
            cost(ModifierStage::Original, "+10%"),
        ];
        // 100 * 2 + 10 + 100 * 10%
        assert_eq!(value_adjusted_for_modifiers(fx(100), &mods).unwrap(), fx(220));
    }

    #[test]
    fn base_cost_factor_is_clamped() {
        let mods = [EquipmentModifier::with_cost(
            "Cheap",
            ModifierStage::Base,
            CostAdjustment::CostFactor(Fixed6::from_decimal(-95, 2)),
        )];
        assert_eq!(value_adjusted_for_modifiers(fx(100), &mods).unwrap(), fx(20));
    }

    #[test]
    fn base_multipliers_contribute_amount_minus_one() {
        let mods = [
            cost(ModifierStage::Base, "x3"),
            cost(ModifierStage::Base, "+1 CF"),
        ];
        // CF = (3 - 1) + 1 = 3, so the cost quadruples.
        assert_eq!(value_adjusted_for_modifiers(fx(50), &mods).unwrap(), fx(200));
        let neutral = [cost(ModifierStage::Base, "x1")];
        assert_eq!(value_adjusted_for_modifiers(fx(50), &neutral).unwrap(), fx(50));
    }

    #[test]
    fn later_stages_and_zero_floor() {
        let mods = [
            cost(ModifierStage::Final, "-500"),
            cost(ModifierStage::FinalBase, "x2"),
        ];
        assert_eq!(value_adjusted_for_modifiers(fx(100), &mods).unwrap(), Fixed6::ZERO);
    }

    #[test]
    fn disabled_modifiers_are_ignored() {
        let mut doubled = cost(ModifierStage::Original, "x2");
        doubled.enabled = false;
        assert_eq!(value_adjusted_for_modifiers(fx(100), &[doubled]).unwrap(), fx(100));
    }

    #[test]
    fn weight_stages() {
        let base = Weight::pounds(10);
        let mods = [
            weight(ModifierStage::Original, "+2 lb"),
            weight(ModifierStage::Original, "+50%"),
            weight(ModifierStage::Base, "x1/2"),
            weight(ModifierStage::Final, "x50%"),
            weight(ModifierStage::Final, "+1 kg"),
        ];
        // ((10 + 2 + 5) / 2) * 50% + 2
        let adjusted = weight_adjusted_for_modifiers(base, &mods, true).unwrap();
        assert_eq!(adjusted.to_string(), "6.25 lb");
    }

    #[test]
    fn weight_floor_and_zero_denominator() {
        let lighter = [weight(ModifierStage::Final, "-20 lb")];
        let adjusted = weight_adjusted_for_modifiers(Weight::pounds(5), &lighter, true).unwrap();
        assert!(adjusted.is_zero());

        let broken = [EquipmentModifier::with_weight(
            "broken",
            ModifierStage::Base,
            WeightAdjustment::Multiplier(Fraction::new(Fixed6::ONE, Fixed6::ZERO)),
        )];
        assert_eq!(
            weight_adjusted_for_modifiers(Weight::pounds(5), &broken, true),
            Err(ArithmeticError::DivisionByZero)
        );
    }
}
