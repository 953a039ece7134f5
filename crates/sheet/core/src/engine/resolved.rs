use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::attribute::{
    AttributeValues, Dice, Encumbrance, LiftMultiples, ThresholdOps, basic_lift,
    count_threshold_ops, dodge, lifting_strength, move_at, swing, thrust,
};
use crate::config::SheetSettings;
use crate::error::CalcResult;
use crate::feature::StrengthLimitation;
use crate::fxp::Fixed6;
use crate::index::FeatureIndex;
use crate::units::{Weight, WeightUnits};

use super::points::PointTotals;

pub const STRENGTH: &str = "st";
pub const BASIC_MOVE: &str = "basic_move";
pub const BASIC_SPEED: &str = "basic_speed";
pub const SIZE_MODIFIER: &str = "sm";
pub const DODGE: &str = "dodge";
pub const PARRY: &str = "parry";
pub const BLOCK: &str = "block";

/// Everything one recalculation derives, replaced wholesale on every run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedSheet {
    pub attributes: BTreeMap<String, AttributeValues>,
    /// Base size modifier plus `attr.sm` bonuses.
    pub size_modifier: i32,
    pub lifting_strength: i32,
    pub striking_strength: i32,
    pub basic_lift: Weight,
    pub lift: LiftMultiples,
    pub thrust: Dice,
    pub swing: Dice,
    pub encumbrance: Encumbrance,
    /// Level from the weight that counts against skills.
    pub encumbrance_for_skills: Encumbrance,
    /// Move at each encumbrance level, lightest first.
    pub moves: [i32; 5],
    pub dodges: [i32; 5],
    pub parry_bonus: i32,
    pub block_bonus: i32,
    pub carried_weight: Weight,
    pub carried_weight_for_skills: Weight,
    pub wealth_carried: Fixed6,
    pub wealth_not_carried: Fixed6,
    pub points: PointTotals,
}

impl Default for ResolvedSheet {
    fn default() -> Self {
        let zero = Weight::zero(WeightUnits::Pound);
        Self {
            attributes: BTreeMap::new(),
            size_modifier: 0,
            lifting_strength: 0,
            striking_strength: 0,
            basic_lift: zero,
            lift: LiftMultiples::from_basic_lift(zero),
            thrust: Dice::default(),
            swing: Dice::default(),
            encumbrance: Encumbrance::None,
            encumbrance_for_skills: Encumbrance::None,
            moves: [0; 5],
            dodges: [0; 5],
            parry_bonus: 0,
            block_bonus: 0,
            carried_weight: zero,
            carried_weight_for_skills: zero,
            wealth_carried: Fixed6::ZERO,
            wealth_not_carried: Fixed6::ZERO,
            points: PointTotals::default(),
        }
    }
}

impl ResolvedSheet {
    pub fn current(&self, id: &str) -> Fixed6 {
        self.attributes.get(id).map_or(Fixed6::ZERO, |values| values.current)
    }

    pub fn maximum(&self, id: &str) -> Fixed6 {
        self.attributes.get(id).map_or(Fixed6::ZERO, |values| values.maximum)
    }

    /// Number of active pool thresholds carrying `op`.
    pub fn threshold_count(&self, op: ThresholdOps) -> usize {
        count_threshold_ops(&self.attributes, op)
    }

    pub fn move_at(&self, level: Encumbrance) -> i32 {
        self.moves[level as usize]
    }

    pub fn dodge_at(&self, level: Encumbrance) -> i32 {
        self.dodges[level as usize]
    }

    /// Fills in lift, damage, encumbrance, move and dodge from the resolved
    /// attributes and carried weight.
    pub(super) fn derive(&mut self, index: &FeatureIndex, settings: &SheetSettings) -> CalcResult<()> {
        let simple = settings.use_simple_metric_conversions;
        let progression = settings.damage_progression;
        let st = self.current(STRENGTH);
        let strength_bonus = |limitation| index.attribute_bonus(STRENGTH, Some(limitation), true, None);

        let halve_st = self.threshold_count(ThresholdOps::HALVE_ST) > 0;
        self.lifting_strength =
            lifting_strength(st + strength_bonus(StrengthLimitation::LiftingOnly), halve_st);
        self.striking_strength = (st + strength_bonus(StrengthLimitation::StrikingOnly)).trunc().to_i32();

        self.basic_lift = basic_lift(self.lifting_strength, progression, settings.default_weight_units, simple)?;
        self.lift = LiftMultiples::from_basic_lift(self.basic_lift);
        self.thrust = thrust(self.striking_strength, progression);
        self.swing = swing(self.striking_strength, progression);

        self.encumbrance = Encumbrance::for_carried(self.carried_weight, self.basic_lift, simple);
        self.encumbrance_for_skills =
            Encumbrance::for_carried(self.carried_weight_for_skills, self.basic_lift, simple);

        let halve_move = self.threshold_count(ThresholdOps::HALVE_MOVE);
        let halve_dodge = self.threshold_count(ThresholdOps::HALVE_DODGE);
        let basic_move = self.current(BASIC_MOVE);
        let basic_speed = self.current(BASIC_SPEED);
        let dodge_bonus = index.attribute_bonus(DODGE, None, true, None);
        for level in Encumbrance::iter() {
            self.moves[level as usize] = move_at(basic_move, halve_move, level);
            self.dodges[level as usize] = dodge(basic_speed, dodge_bonus, halve_dodge, level);
        }
        self.parry_bonus = index.attribute_bonus(PARRY, None, true, None).to_i32();
        self.block_bonus = index.attribute_bonus(BLOCK, None, true, None).to_i32();
        Ok(())
    }
}
