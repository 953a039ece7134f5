//! Attachable, independently enable-able sub-components of traits.
//!
//! Advantage modifiers adjust point costs. Equipment modifiers carry a cost and
//! a weight adjustment, each tagged with the [`ModifierStage`] at which the
//! stacking engine in [`stacking`] applies it. Disabled modifiers contribute
//! nothing, neither features nor adjustments.

mod adjustment;
pub mod stacking;

use strum::{AsRefStr, Display, EnumString};

use crate::feature::Feature;
use crate::fxp::Fixed6;

pub use adjustment::{CostAdjustment, Fraction, ParseAdjustmentError, WeightAdjustment};
pub use stacking::{value_adjusted_for_modifiers, weight_adjusted_for_modifiers};

/// Ordered point at which an equipment modifier's adjustment is applied.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ModifierStage {
    #[default]
    Original,
    Base,
    FinalBase,
    Final,
}

impl ModifierStage {
    pub const ORDER: [Self; 4] = [Self::Original, Self::Base, Self::FinalBase, Self::Final];
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct EquipmentModifier {
    pub name: String,
    pub enabled: bool,
    pub cost: CostAdjustment,
    pub cost_stage: ModifierStage,
    pub weight: WeightAdjustment,
    pub weight_stage: ModifierStage,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub features: Vec<Feature>,
}

impl Default for EquipmentModifier {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            cost: CostAdjustment::default(),
            cost_stage: ModifierStage::Original,
            weight: WeightAdjustment::default(),
            weight_stage: ModifierStage::Original,
            features: Vec::new(),
        }
    }
}

impl EquipmentModifier {
    pub fn with_cost(name: impl Into<String>, stage: ModifierStage, cost: CostAdjustment) -> Self {
        Self {
            name: name.into(),
            cost,
            cost_stage: stage,
            ..Self::default()
        }
    }

    pub fn with_weight(
        name: impl Into<String>,
        stage: ModifierStage,
        weight: WeightAdjustment,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            weight_stage: stage,
            ..Self::default()
        }
    }
}

/// How an advantage modifier's cost is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum AdvantageCostKind {
    #[default]
    Percentage,
    Points,
    Multiplier,
}

/// Which part of a leveled advantage's cost a percentage applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CostAffects {
    #[default]
    Total,
    BaseOnly,
    LevelsOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct AdvantageModifier {
    pub name: String,
    pub enabled: bool,
    pub cost: Fixed6,
    pub cost_kind: AdvantageCostKind,
    pub affects: CostAffects,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub levels: Option<i32>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub features: Vec<Feature>,
}

impl Default for AdvantageModifier {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            cost: Fixed6::ZERO,
            cost_kind: AdvantageCostKind::Percentage,
            affects: CostAffects::Total,
            levels: None,
            features: Vec::new(),
        }
    }
}

impl AdvantageModifier {
    pub fn percentage(name: impl Into<String>, percent: i64) -> Self {
        Self {
            name: name.into(),
            cost: Fixed6::from_int(percent),
            ..Self::default()
        }
    }

    /// Level count used when leveling this modifier's features.
    pub fn level_count(&self) -> i32 {
        self.levels.unwrap_or(0).max(0)
    }

    /// Cost scaled by levels, if leveled.
    pub fn cost_modifier(&self) -> Fixed6 {
        match self.levels {
            Some(levels) if levels > 0 => self.cost.mul_int(i64::from(levels)),
            _ => self.cost,
        }
    }
}
