use crate::error::CalcResult;
use crate::feature::{Feature, WeightReduction};
use crate::fxp::Fixed6;
use crate::modifier::{EquipmentModifier, value_adjusted_for_modifiers, weight_adjusted_for_modifiers};
use crate::prereq::PrereqList;
use crate::units::{Weight, WeightUnits};

use super::Satisfaction;

/// A piece of equipment, possibly containing other equipment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Equipment {
    pub name: String,
    pub notes: String,
    pub equipped: bool,
    pub quantity: Fixed6,
    /// Value of one unit before modifiers.
    pub value: Fixed6,
    /// Weight of one unit before modifiers.
    pub weight: Weight,
    pub weight_ignored_for_skills: bool,
    pub categories: Vec<String>,
    pub features: Vec<Feature>,
    pub modifiers: Vec<EquipmentModifier>,
    pub prereqs: PrereqList,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub extended_value: Fixed6,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub extended_weight: Weight,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub extended_weight_for_skills: Weight,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub satisfaction: Satisfaction,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            equipped: true,
            quantity: Fixed6::ONE,
            value: Fixed6::ZERO,
            weight: Weight::zero(WeightUnits::Pound),
            weight_ignored_for_skills: false,
            categories: Vec::new(),
            features: Vec::new(),
            modifiers: Vec::new(),
            prereqs: PrereqList::default(),
            extended_value: Fixed6::ZERO,
            extended_weight: Weight::zero(WeightUnits::Pound),
            extended_weight_for_skills: Weight::zero(WeightUnits::Pound),
            satisfaction: Satisfaction::default(),
        }
    }
}

impl Equipment {
    pub fn new(name: impl Into<String>, value: Fixed6, weight: Weight) -> Self {
        Self {
            name: name.into(),
            value,
            weight,
            ..Self::default()
        }
    }

    /// Equipped with at least one unit; only active equipment feeds the
    /// feature index.
    pub fn is_active(&self) -> bool {
        self.equipped && self.quantity >= Fixed6::ONE
    }

    pub fn enabled_modifiers(&self) -> impl Iterator<Item = &EquipmentModifier> {
        self.modifiers.iter().filter(|modifier| modifier.enabled)
    }

    /// Unit value after cost modifiers.
    pub fn adjusted_value(&self) -> CalcResult<Fixed6> {
        value_adjusted_for_modifiers(self.value, &self.modifiers)
    }

    /// Unit weight after weight modifiers, in `units`.
    pub fn adjusted_weight(&self, units: WeightUnits, simple_metric: bool) -> CalcResult<Weight> {
        weight_adjusted_for_modifiers(self.weight, &self.modifiers, simple_metric)?
            .convert_to(units, simple_metric)
    }

    /// Reductions this container applies to the weight of its contents, from
    /// its own features and those of its enabled modifiers.
    pub fn contained_weight_reductions(&self) -> impl Iterator<Item = &WeightReduction> {
        self.features
            .iter()
            .chain(self.enabled_modifiers().flat_map(|modifier| modifier.features.iter()))
            .filter_map(|feature| match feature {
                Feature::ContainedWeightReduction(contained) => Some(&contained.reduction),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ContainedWeightReduction;
    use crate::modifier::{CostAdjustment, ModifierStage};

    #[test]
    fn activity_requires_equipped_whole_units() {
        let mut rope = Equipment::new("Rope", Fixed6::from_int(5), Weight::pounds(2));
        assert!(rope.is_active());
        rope.quantity = Fixed6::HALF;
        assert!(!rope.is_active());
        rope.quantity = Fixed6::TWO;
        rope.equipped = false;
        assert!(!rope.is_active());
    }

    #[test]
    fn adjusted_value_uses_modifiers() {
        let mut sword = Equipment::new("Sword", Fixed6::from_int(500), Weight::pounds(3));
        sword.modifiers.push(EquipmentModifier::with_cost(
            "Fine",
            ModifierStage::Base,
            CostAdjustment::CostFactor(Fixed6::from_int(3)),
        ));
        assert_eq!(sword.adjusted_value().unwrap(), Fixed6::from_int(2000));
    }

    #[test]
    fn reductions_come_from_features_and_enabled_modifiers() {
        let reduction = |text: &str| {
            Feature::ContainedWeightReduction(ContainedWeightReduction {
                reduction: text.parse().unwrap(),
            })
        };
        let mut bag = Equipment::new("Bag of Holding", Fixed6::ZERO, Weight::pounds(1));
        bag.features.push(reduction("50%"));
        let mut enchanted = EquipmentModifier::default();
        enchanted.features.push(reduction("5 lb"));
        let mut dormant = EquipmentModifier::default();
        dormant.enabled = false;
        dormant.features.push(reduction("10 lb"));
        bag.modifiers.extend([enchanted, dormant]);
        assert_eq!(bag.contained_weight_reductions().count(), 2);
    }
}
