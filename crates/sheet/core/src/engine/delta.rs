use bitflags::bitflags;

use super::ResolvedSheet;

bitflags! {
    /// Tracks which parts of the resolved sheet changed during a
    /// recalculation.
    ///
    /// `LEVELS` and `PREREQS` cover values stored on the traits themselves;
    /// the remaining bits map onto [`ResolvedSheet`] fields.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SheetFields: u16 {
        const ATTRIBUTES  = 1 << 0;
        const SIZE        = 1 << 1;
        const LIFT        = 1 << 2;
        const DAMAGE      = 1 << 3;
        const ENCUMBRANCE = 1 << 4;
        const MOVE        = 1 << 5;
        const DODGE       = 1 << 6;
        const WEIGHT      = 1 << 7;
        const WEALTH      = 1 << 8;
        const POINTS      = 1 << 9;
        const LEVELS      = 1 << 10;
        const PREREQS     = 1 << 11;
    }
}

impl SheetFields {
    /// Compares two resolved states field by field.
    pub fn from_states(before: &ResolvedSheet, after: &ResolvedSheet) -> Self {
        let mut fields = Self::empty();

        if before.attributes != after.attributes {
            fields |= Self::ATTRIBUTES;
        }
        if before.size_modifier != after.size_modifier {
            fields |= Self::SIZE;
        }
        if before.basic_lift != after.basic_lift || before.lift != after.lift {
            fields |= Self::LIFT;
        }
        if before.thrust != after.thrust || before.swing != after.swing {
            fields |= Self::DAMAGE;
        }
        if before.encumbrance != after.encumbrance
            || before.encumbrance_for_skills != after.encumbrance_for_skills
        {
            fields |= Self::ENCUMBRANCE;
        }
        if before.moves != after.moves {
            fields |= Self::MOVE;
        }
        if before.dodges != after.dodges
            || before.parry_bonus != after.parry_bonus
            || before.block_bonus != after.block_bonus
        {
            fields |= Self::DODGE;
        }
        if before.carried_weight != after.carried_weight
            || before.carried_weight_for_skills != after.carried_weight_for_skills
        {
            fields |= Self::WEIGHT;
        }
        if before.wealth_carried != after.wealth_carried
            || before.wealth_not_carried != after.wealth_not_carried
        {
            fields |= Self::WEALTH;
        }
        if before.points != after.points {
            fields |= Self::POINTS;
        }

        fields
    }
}

/// Outcome of [`Character::recalculate`](super::Character::recalculate).
///
/// A run that stopped at the pass limit looks the same as one that reached a
/// fixpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Recalculation {
    /// Convergence passes run.
    pub passes: u32,
    /// What differs from the previously resolved state.
    pub changed: SheetFields,
}

impl Recalculation {
    /// Returns true if nothing observable changed.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fxp::Fixed6;
    use crate::units::Weight;

    #[test]
    fn identical_states_produce_no_fields() {
        let state = ResolvedSheet::default();
        assert!(SheetFields::from_states(&state, &state.clone()).is_empty());
    }

    #[test]
    fn each_changed_group_sets_its_bit() {
        let before = ResolvedSheet::default();
        let mut after = before.clone();
        after.carried_weight = Weight::pounds(12);
        after.wealth_carried = Fixed6::from_int(40);
        after.points.advantages = 15;
        let fields = SheetFields::from_states(&before, &after);
        assert_eq!(fields, SheetFields::WEIGHT | SheetFields::WEALTH | SheetFields::POINTS);
    }
}
