use strum::{AsRefStr, Display, EnumString};

use crate::feature::Feature;
use crate::fxp::Fixed6;
use crate::modifier::{AdvantageCostKind, AdvantageModifier, CostAffects};
use crate::prereq::PrereqList;

use super::Satisfaction;

/// Lowest total percentage an advantage's modifiers may reach.
const MIN_MODIFIER_PERCENT: Fixed6 = Fixed6::from_int(-80);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum AdvantageContainerType {
    Group,
    MetaTrait,
    Race,
    AlternativeAbilities,
}

/// Advantage, disadvantage, quirk, perk, or a container of them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Advantage {
    pub name: String,
    pub notes: String,
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub container_type: Option<AdvantageContainerType>,
    /// Present only for leveled advantages.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub levels: Option<i32>,
    pub base_points: i32,
    pub points_per_level: i32,
    pub round_cost_down: bool,
    pub categories: Vec<String>,
    pub features: Vec<Feature>,
    pub modifiers: Vec<AdvantageModifier>,
    pub prereqs: PrereqList,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub satisfaction: Satisfaction,
}

impl Default for Advantage {
    fn default() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            enabled: true,
            container_type: None,
            levels: None,
            base_points: 0,
            points_per_level: 0,
            round_cost_down: false,
            categories: Vec::new(),
            features: Vec::new(),
            modifiers: Vec::new(),
            prereqs: PrereqList::default(),
            satisfaction: Satisfaction::default(),
        }
    }
}

impl Advantage {
    pub fn new(name: impl Into<String>, base_points: i32) -> Self {
        Self {
            name: name.into(),
            base_points,
            ..Self::default()
        }
    }

    pub fn leveled(name: impl Into<String>, points_per_level: i32, levels: i32) -> Self {
        Self {
            name: name.into(),
            points_per_level,
            levels: Some(levels),
            ..Self::default()
        }
    }

    pub fn container(name: impl Into<String>, container_type: AdvantageContainerType) -> Self {
        Self {
            name: name.into(),
            container_type: Some(container_type),
            ..Self::default()
        }
    }

    pub const fn is_container(&self) -> bool {
        self.container_type.is_some()
    }

    /// Level count used to level this advantage's features.
    pub fn level_count(&self) -> i32 {
        self.levels.unwrap_or(0).max(0)
    }

    pub fn enabled_modifiers(&self) -> impl Iterator<Item = &AdvantageModifier> {
        self.modifiers.iter().filter(|modifier| modifier.enabled)
    }

    /// Point cost of a non-container advantage after its enabled modifiers.
    ///
    /// Percentage modifiers are summed separately for the base and the leveled
    /// part, each sum floored at -80%. Point modifiers adjust the base or
    /// per-level cost; multipliers scale the total. Disabled advantages cost
    /// nothing.
    pub fn adjusted_points(&self) -> i32 {
        if !self.enabled {
            return 0;
        }
        let mut base_points = Fixed6::from(self.base_points);
        let mut per_level = Fixed6::from(self.points_per_level);
        let mut base_percent = Fixed6::ZERO;
        let mut level_percent = Fixed6::ZERO;
        let mut multiplier = Fixed6::ONE;

        for modifier in self.enabled_modifiers() {
            let cost = modifier.cost_modifier();
            match (modifier.cost_kind, modifier.affects) {
                (AdvantageCostKind::Percentage, CostAffects::Total) => {
                    base_percent += cost;
                    level_percent += cost;
                }
                (AdvantageCostKind::Percentage, CostAffects::BaseOnly) => base_percent += cost,
                (AdvantageCostKind::Percentage, CostAffects::LevelsOnly) => level_percent += cost,
                (AdvantageCostKind::Points, CostAffects::LevelsOnly) => per_level += cost,
                (AdvantageCostKind::Points, _) => base_points += cost,
                (AdvantageCostKind::Multiplier, _) => multiplier *= cost,
            }
        }

        let leveled = per_level.mul_int(i64::from(self.level_count()));
        let modified = if base_percent.is_zero() && level_percent.is_zero() {
            base_points + leveled
        } else {
            let base_percent = base_percent.max(MIN_MODIFIER_PERCENT);
            let level_percent = level_percent.max(MIN_MODIFIER_PERCENT);
            if base_percent == level_percent {
                modify_points(base_points + leveled, base_percent)
            } else {
                modify_points(base_points, base_percent) + modify_points(leveled, level_percent)
            }
        };

        let total = modified * multiplier;
        let rounded = if self.round_cost_down {
            total.floor()
        } else {
            total.ceil()
        };
        rounded.to_i32()
    }
}

/// `points` adjusted by `percent` percent.
fn modify_points(points: Fixed6, percent: Fixed6) -> Fixed6 {
    // Hundredths of a point below the sixth digit are irrelevant to the rounded cost.
    points + (points * percent).div_int(100).unwrap_or(Fixed6::ZERO)
}
