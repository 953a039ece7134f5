//! Bottom-up weight and value totals for equipment forests.

use crate::error::CalcResult;
use crate::feature::WeightReduction;
use crate::forest::{Forest, NodeId};
use crate::fxp::Fixed6;
use crate::model::Equipment;
use crate::units::{Weight, WeightUnits};

/// Recomputes extended value and weights of every item, children before
/// parents.
pub(super) fn update_extended(
    forest: &mut Forest<Equipment>,
    units: WeightUnits,
    simple_metric: bool,
) -> CalcResult<()> {
    for id in forest.ids().into_iter().rev() {
        let Some(item) = forest.get(id) else { continue };
        let children: Vec<&Equipment> = forest
            .children(id)
            .iter()
            .filter_map(|&child| forest.get(child))
            .collect();

        let value = extended_value(item, &children)?;
        let weight = extended_weight(item, &children, false, units, simple_metric)?;
        let for_skills = extended_weight(item, &children, true, units, simple_metric)?;

        if let Some(item) = forest.get_mut(id) {
            item.extended_value = value;
            item.extended_weight = weight;
            item.extended_weight_for_skills = for_skills;
        }
    }
    Ok(())
}

fn extended_value(item: &Equipment, children: &[&Equipment]) -> CalcResult<Fixed6> {
    if !item.quantity.is_positive() {
        return Ok(Fixed6::ZERO);
    }
    let mut value = item.adjusted_value()?;
    for child in children {
        value = value.checked_add(child.extended_value)?;
    }
    value.checked_mul(item.quantity)
}

fn extended_weight(
    item: &Equipment,
    children: &[&Equipment],
    for_skills: bool,
    units: WeightUnits,
    simple_metric: bool,
) -> CalcResult<Weight> {
    if !item.quantity.is_positive() {
        return Ok(Weight::zero(units));
    }
    // Ignoring an item's weight for skills leaves its contents counted.
    let mut total = if for_skills && item.weight_ignored_for_skills && item.equipped {
        Fixed6::ZERO
    } else {
        item.adjusted_weight(units, simple_metric)?.value
    };
    if !children.is_empty() {
        let mut contained = Fixed6::ZERO;
        for child in children {
            let weight = if for_skills {
                child.extended_weight_for_skills
            } else {
                child.extended_weight
            };
            contained = contained.checked_add(weight.convert_to(units, simple_metric)?.value)?;
        }

        let mut percentage = Fixed6::ZERO;
        let mut fixed = Fixed6::ZERO;
        for reduction in item.contained_weight_reductions() {
            match reduction {
                WeightReduction::Percentage(pct) => percentage = percentage.checked_add(*pct)?,
                WeightReduction::Fixed(weight) => {
                    fixed = fixed.checked_add(weight.convert_to(units, simple_metric)?.value)?;
                }
            }
        }
        if percentage >= Fixed6::HUNDRED {
            contained = Fixed6::ZERO;
        } else if percentage.is_positive() {
            let removed = contained.checked_mul(percentage)?.div_int(100)?;
            contained = contained.checked_sub(removed)?;
        }
        total = total.checked_add(contained.checked_sub(fixed)?.max(Fixed6::ZERO))?;
    }
    Ok(Weight::new(total.checked_mul(item.quantity)?, units))
}

/// Sum of the root items' extended weight.
pub(super) fn carried_weight(forest: &Forest<Equipment>, for_skills: bool, units: WeightUnits) -> Weight {
    let total = forest
        .roots()
        .iter()
        .filter_map(|&id| forest.get(id))
        .map(|item| {
            if for_skills {
                item.extended_weight_for_skills.value
            } else {
                item.extended_weight.value
            }
        })
        .sum();
    Weight::new(total, units)
}

/// Sum of the root items' extended value.
pub(super) fn wealth(forest: &Forest<Equipment>) -> Fixed6 {
    forest
        .roots()
        .iter()
        .filter_map(|&id| forest.get(id))
        .map(|item| item.extended_value)
        .sum()
}

/// Weight of a container's contents and the number of items inside it,
/// nested items included.
pub(super) fn contents_of(forest: &Forest<Equipment>, id: NodeId, units: WeightUnits) -> (Weight, Fixed6) {
    let weight = forest
        .children(id)
        .iter()
        .filter_map(|&child| forest.get(child))
        .map(|item| item.extended_weight.value)
        .sum();
    let mut quantity = Fixed6::ZERO;
    let mut pending: Vec<NodeId> = forest.children(id).to_vec();
    while let Some(child) = pending.pop() {
        if let Some(item) = forest.get(child) {
            quantity += item.quantity;
        }
        pending.extend_from_slice(forest.children(child));
    }
    (Weight::new(weight, units), quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{ContainedWeightReduction, Feature};

    fn item(name: &str, value: i64, pounds: i64) -> Equipment {
        Equipment::new(name, Fixed6::from_int(value), Weight::pounds(pounds))
    }

    fn reduce(item: &mut Equipment, text: &str) {
        item.features.push(Feature::ContainedWeightReduction(ContainedWeightReduction {
            reduction: text.parse().unwrap(),
        }));
    }

    #[test]
    fn containers_total_their_contents_times_quantity() {
        let mut forest = Forest::new();
        let mut pack = item("Backpack", 60, 3);
        pack.quantity = Fixed6::TWO;
        let pack = forest.push_root(pack);
        let mut arrows = item("Arrow", 2, 1);
        arrows.quantity = Fixed6::from_int(10);
        forest.push_child(pack, arrows);
        forest.push_child(pack, item("Rope", 5, 10));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();

        let pack_item = forest.get(pack).unwrap();
        assert_eq!(pack_item.extended_value, Fixed6::from_int(170));
        assert_eq!(pack_item.extended_weight, Weight::pounds(46));
        assert_eq!(wealth(&forest), Fixed6::from_int(170));
        assert_eq!(carried_weight(&forest, false, WeightUnits::Pound), Weight::pounds(46));
        let (weight, quantity) = contents_of(&forest, pack, WeightUnits::Pound);
        assert_eq!(weight, Weight::pounds(20));
        assert_eq!(quantity, Fixed6::from_int(11));
    }

    #[test]
    fn reductions_apply_to_contents_only() {
        let mut forest = Forest::new();
        let mut bag = item("Bag of Holding", 0, 2);
        reduce(&mut bag, "50%");
        reduce(&mut bag, "3 lb");
        let bag = forest.push_root(bag);
        forest.push_child(bag, item("Anvil", 0, 20));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(forest.get(bag).unwrap().extended_weight, Weight::pounds(9));

        let mut forest = Forest::new();
        let mut void = item("Void Sack", 0, 1);
        reduce(&mut void, "60%");
        reduce(&mut void, "50%");
        let void = forest.push_root(void);
        forest.push_child(void, item("Anvil", 0, 20));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(forest.get(void).unwrap().extended_weight, Weight::pounds(1));

        let mut forest = Forest::new();
        let mut pouch = item("Pouch", 0, 1);
        reduce(&mut pouch, "10 lb");
        let pouch = forest.push_root(pouch);
        forest.push_child(pouch, item("Coin", 0, 2));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(forest.get(pouch).unwrap().extended_weight, Weight::pounds(1));
    }

    #[test]
    fn skill_weight_skips_ignored_equipped_items() {
        let mut forest = Forest::new();
        let mut armor = item("Armor", 100, 25);
        armor.weight_ignored_for_skills = true;
        forest.push_root(armor);
        forest.push_root(item("Shield", 40, 15));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(carried_weight(&forest, false, WeightUnits::Pound), Weight::pounds(40));
        assert_eq!(carried_weight(&forest, true, WeightUnits::Pound), Weight::pounds(15));
    }

    #[test]
    fn ignored_containers_still_carry_their_contents_for_skills() {
        let mut forest = Forest::new();
        let mut backpack = item("Backpack", 60, 10);
        backpack.weight_ignored_for_skills = true;
        let backpack = forest.push_root(backpack);
        forest.push_child(backpack, item("Rope", 5, 30));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(carried_weight(&forest, false, WeightUnits::Pound), Weight::pounds(40));
        assert_eq!(carried_weight(&forest, true, WeightUnits::Pound), Weight::pounds(30));
    }

    #[test]
    fn non_positive_quantities_weigh_and_cost_nothing() {
        let mut forest = Forest::new();
        let mut debt = item("Borrowed Sword", 500, 3);
        debt.quantity = Fixed6::from_int(-2);
        forest.push_root(debt);
        let mut empty = item("Empty Sack", 2, 1);
        empty.quantity = Fixed6::ZERO;
        let empty = forest.push_root(empty);
        forest.push_child(empty, item("Coin", 1, 1));
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(wealth(&forest), Fixed6::ZERO);
        assert_eq!(carried_weight(&forest, false, WeightUnits::Pound), Weight::pounds(0));
    }

    #[test]
    fn mixed_units_convert_to_the_sheet_units() {
        let mut forest = Forest::new();
        let crate_ = forest.push_root(item("Crate", 0, 1));
        forest.push_child(
            crate_,
            Equipment::new("Ingot", Fixed6::ZERO, Weight::new(Fixed6::from_int(2), WeightUnits::Kilogram)),
        );
        update_extended(&mut forest, WeightUnits::Pound, true).unwrap();
        assert_eq!(forest.get(crate_).unwrap().extended_weight, Weight::pounds(5));
    }
}
