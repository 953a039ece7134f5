use crate::config::SheetSettings;
use crate::forest::{Forest, NodeId};
use crate::fxp::Fixed6;
use crate::model::Equipment;

use super::Character;

/// Which equipment list a setter targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipmentList {
    Carried,
    Other,
}

/// One stored value that a setter actually changed.
///
/// Setters return `None` when the new value equals the stored one, so every
/// `SheetChange` corresponds to a real edit worth recording for undo.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetChange {
    Name { before: String, after: String },
    TotalPoints { before: i32, after: i32 },
    SizeModifier { before: i32, after: i32 },
    AttributeAdj { id: String, before: Fixed6, after: Fixed6 },
    AttributeDamage { id: String, before: Fixed6, after: Fixed6 },
    AdvantageEnabled { id: NodeId, before: bool, after: bool },
    AdvantageLevels { id: NodeId, before: Option<i32>, after: Option<i32> },
    Equipped { list: EquipmentList, id: NodeId, before: bool, after: bool },
    Quantity { list: EquipmentList, id: NodeId, before: Fixed6, after: Fixed6 },
    SkillPoints { id: NodeId, before: i32, after: i32 },
    SpellPoints { id: NodeId, before: i32, after: i32 },
    Settings { before: Box<SheetSettings>, after: Box<SheetSettings> },
}

/// Writes `value` into `slot` and hands back the old value, unless they are
/// equal.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> Option<T> {
    if *slot == value {
        None
    } else {
        Some(core::mem::replace(slot, value))
    }
}

impl Character {
    fn equipment_list_mut(&mut self, list: EquipmentList) -> &mut Forest<Equipment> {
        match list {
            EquipmentList::Carried => &mut self.equipment,
            EquipmentList::Other => &mut self.other_equipment,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Option<SheetChange> {
        let after = name.into();
        replace(&mut self.name, after.clone()).map(|before| SheetChange::Name { before, after })
    }

    pub fn set_total_points(&mut self, total_points: i32) -> Option<SheetChange> {
        replace(&mut self.total_points, total_points).map(|before| SheetChange::TotalPoints {
            before,
            after: total_points,
        })
    }

    pub fn set_size_modifier(&mut self, size_modifier: i32) -> Option<SheetChange> {
        replace(&mut self.size_modifier, size_modifier).map(|before| SheetChange::SizeModifier {
            before,
            after: size_modifier,
        })
    }

    /// Sets the levels bought for attribute `id`. Ids without a definition in
    /// the settings are rejected.
    pub fn set_attribute_adj(&mut self, id: &str, adj: Fixed6) -> Option<SheetChange> {
        if self.settings.attribute(id).is_none() {
            tracing::warn!(attribute = id, "ignoring adjustment of undefined attribute");
            return None;
        }
        let attribute = self.attributes.entry(id.to_string()).or_default();
        replace(&mut attribute.adj, adj).map(|before| SheetChange::AttributeAdj {
            id: id.to_string(),
            before,
            after: adj,
        })
    }

    /// Sets the damage taken by pool `id`.
    pub fn set_attribute_damage(&mut self, id: &str, damage: Fixed6) -> Option<SheetChange> {
        if self.settings.attribute(id).is_none() {
            tracing::warn!(attribute = id, "ignoring damage to undefined attribute");
            return None;
        }
        let attribute = self.attributes.entry(id.to_string()).or_default();
        replace(&mut attribute.damage, damage).map(|before| SheetChange::AttributeDamage {
            id: id.to_string(),
            before,
            after: damage,
        })
    }

    pub fn set_advantage_enabled(&mut self, id: NodeId, enabled: bool) -> Option<SheetChange> {
        let advantage = self.advantages.get_mut(id)?;
        replace(&mut advantage.enabled, enabled).map(|before| SheetChange::AdvantageEnabled {
            id,
            before,
            after: enabled,
        })
    }

    pub fn set_advantage_levels(&mut self, id: NodeId, levels: Option<i32>) -> Option<SheetChange> {
        let advantage = self.advantages.get_mut(id)?;
        replace(&mut advantage.levels, levels).map(|before| SheetChange::AdvantageLevels {
            id,
            before,
            after: levels,
        })
    }

    pub fn set_equipped(&mut self, list: EquipmentList, id: NodeId, equipped: bool) -> Option<SheetChange> {
        let item = self.equipment_list_mut(list).get_mut(id)?;
        replace(&mut item.equipped, equipped).map(|before| SheetChange::Equipped {
            list,
            id,
            before,
            after: equipped,
        })
    }

    /// Sets an item's quantity; negative quantities clamp to zero.
    pub fn set_quantity(&mut self, list: EquipmentList, id: NodeId, quantity: Fixed6) -> Option<SheetChange> {
        let quantity = quantity.max(Fixed6::ZERO);
        let item = self.equipment_list_mut(list).get_mut(id)?;
        replace(&mut item.quantity, quantity).map(|before| SheetChange::Quantity {
            list,
            id,
            before,
            after: quantity,
        })
    }

    pub fn set_skill_points(&mut self, id: NodeId, points: i32) -> Option<SheetChange> {
        let skill = self.skills.get_mut(id)?;
        replace(&mut skill.points, points).map(|before| SheetChange::SkillPoints {
            id,
            before,
            after: points,
        })
    }

    pub fn set_spell_points(&mut self, id: NodeId, points: i32) -> Option<SheetChange> {
        let spell = self.spells.get_mut(id)?;
        replace(&mut spell.points, points).map(|before| SheetChange::SpellPoints {
            id,
            before,
            after: points,
        })
    }

    /// Replaces the settings. Attribute definitions new to the sheet get an
    /// unadjusted allocation; existing allocations are kept.
    pub fn set_settings(&mut self, settings: SheetSettings) -> Option<SheetChange> {
        for def in &settings.attributes {
            self.attributes.entry(def.id.clone()).or_default();
        }
        let after = Box::new(settings.clone());
        replace(&mut self.settings, settings).map(|before| SheetChange::Settings {
            before: Box::new(before),
            after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Advantage, Skill};
    use crate::units::Weight;

    #[test]
    fn equal_values_report_nothing() {
        let mut sheet = Character::default();
        assert_eq!(sheet.set_total_points(Character::DEFAULT_TOTAL_POINTS), None);
        assert_eq!(sheet.set_size_modifier(0), None);
        assert_eq!(sheet.set_attribute_adj("st", Fixed6::ZERO), None);
        assert_eq!(sheet.set_settings(SheetSettings::default()), None);
    }

    #[test]
    fn changes_carry_both_values() {
        let mut sheet = Character::default();
        assert_eq!(
            sheet.set_total_points(200),
            Some(SheetChange::TotalPoints { before: 150, after: 200 })
        );
        assert_eq!(
            sheet.set_attribute_damage("hp", Fixed6::from_int(4)),
            Some(SheetChange::AttributeDamage {
                id: "hp".into(),
                before: Fixed6::ZERO,
                after: Fixed6::from_int(4),
            })
        );
        assert_eq!(sheet.attribute("hp").map(|hp| hp.damage), Some(Fixed6::from_int(4)));
        assert_eq!(sheet.set_attribute_damage("hp", Fixed6::from_int(4)), None);
    }

    #[test]
    fn unknown_targets_are_ignored() {
        let mut sheet = Character::default();
        assert_eq!(sheet.set_attribute_adj("luck", Fixed6::ONE), None);
        assert!(sheet.attribute("luck").is_none());

        let mut other = Forest::new();
        let stray = other.push_root(Skill::new("Stray", Default::default(), 1));
        assert_eq!(sheet.set_skill_points(stray, 4), None);
    }

    #[test]
    fn trait_setters_touch_the_right_node() {
        let mut sheet = Character::default();
        let fit = sheet.advantages.push_root(Advantage::new("Fit", 5));
        let rope = sheet.other_equipment.push_root(Equipment::new("Rope", Fixed6::from_int(5), Weight::pounds(3)));

        assert_eq!(
            sheet.set_advantage_enabled(fit, false),
            Some(SheetChange::AdvantageEnabled { id: fit, before: true, after: false })
        );
        assert_eq!(
            sheet.set_quantity(EquipmentList::Other, rope, Fixed6::from_int(-2)),
            Some(SheetChange::Quantity {
                list: EquipmentList::Other,
                id: rope,
                before: Fixed6::ONE,
                after: Fixed6::ZERO,
            })
        );
        assert_eq!(sheet.set_equipped(EquipmentList::Carried, rope, false), None);
    }

    #[test]
    fn new_settings_allocate_new_attributes() {
        let mut sheet = Character::default();
        let mut settings = SheetSettings::default();
        settings.attributes.truncate(4);
        settings.attributes.push(crate::attribute::AttributeDef::new(
            "luck",
            "Luck",
            crate::attribute::AttributeKind::Integer,
            crate::attribute::Formula::constant(10),
            15,
        ));
        assert!(matches!(sheet.set_settings(settings), Some(SheetChange::Settings { .. })));
        assert!(sheet.attribute("luck").is_some());
        assert!(sheet.attribute("hp").is_some());
    }
}
