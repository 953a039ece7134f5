use strum::{AsRefStr, Display, EnumString};

use crate::attribute::formula::{BinaryOp, Function};
use crate::attribute::{AttributeDef, AttributeKind, Formula, PoolThreshold, ThresholdOps};
use crate::units::WeightUnits;

/// How strength maps onto damage dice and basic lift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DamageProgression {
    /// Quadratic basic lift and the Basic Set damage table.
    #[default]
    BasicSet,
    /// Exponential basic lift and linear damage.
    KnowingYourOwnStrength,
}

/// Rules options the engine reads during a recalculation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SheetSettings {
    pub default_weight_units: WeightUnits,
    /// Tabletop conversions (1 kg = 2 lb) instead of exact ones.
    pub use_simple_metric_conversions: bool,
    pub damage_progression: DamageProgression,
    /// Attribute definitions in resolution order.
    pub attributes: Vec<AttributeDef>,
    /// Upper bound on convergence passes per recalculation.
    pub max_iterations: u32,
    /// Attribute-based skill defaults use half the attribute plus five.
    pub use_half_stat_defaults: bool,
}

impl SheetSettings {
    pub const DEFAULT_WEIGHT_UNITS: WeightUnits = WeightUnits::Pound;
    pub const DEFAULT_SIMPLE_METRIC: bool = true;
    pub const DEFAULT_DAMAGE_PROGRESSION: DamageProgression = DamageProgression::BasicSet;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 5;
    pub const DEFAULT_HALF_STAT_DEFAULTS: bool = false;

    pub fn new() -> Self {
        Self {
            default_weight_units: Self::DEFAULT_WEIGHT_UNITS,
            use_simple_metric_conversions: Self::DEFAULT_SIMPLE_METRIC,
            damage_progression: Self::DEFAULT_DAMAGE_PROGRESSION,
            attributes: standard_attributes(),
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            use_half_stat_defaults: Self::DEFAULT_HALF_STAT_DEFAULTS,
        }
    }

    #[must_use]
    pub fn with_weight_units(mut self, units: WeightUnits) -> Self {
        self.default_weight_units = units;
        self
    }

    #[must_use]
    pub fn with_simple_metric_conversions(mut self, simple: bool) -> Self {
        self.use_simple_metric_conversions = simple;
        self
    }

    #[must_use]
    pub fn with_damage_progression(mut self, progression: DamageProgression) -> Self {
        self.damage_progression = progression;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<AttributeDef>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_half_stat_defaults(mut self, enabled: bool) -> Self {
        self.use_half_stat_defaults = enabled;
        self
    }

    pub fn attribute(&self, id: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|def| def.id == id)
    }
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// The ten attributes every new sheet starts with.
pub fn standard_attributes() -> Vec<AttributeDef> {
    let var = Formula::variable;
    let basic_speed = Formula::Binary(
        BinaryOp::Div,
        Box::new(Formula::Binary(BinaryOp::Add, Box::new(var("dx")), Box::new(var("ht")))),
        Box::new(Formula::constant(4)),
    );
    let halving = ThresholdOps::HALVE_MOVE | ThresholdOps::HALVE_DODGE;
    vec![
        AttributeDef::new("st", "Strength", AttributeKind::Integer, Formula::constant(10), 10)
            .with_cost_adj_percent_per_sm(10),
        AttributeDef::new("dx", "Dexterity", AttributeKind::Integer, Formula::constant(10), 20),
        AttributeDef::new("iq", "Intelligence", AttributeKind::Integer, Formula::constant(10), 20),
        AttributeDef::new("ht", "Health", AttributeKind::Integer, Formula::constant(10), 10),
        AttributeDef::new("will", "Will", AttributeKind::Integer, var("iq"), 5),
        AttributeDef::new("per", "Perception", AttributeKind::Integer, var("iq"), 5),
        AttributeDef::new("basic_speed", "Basic Speed", AttributeKind::Decimal, basic_speed, 20),
        AttributeDef::new(
            "basic_move",
            "Basic Move",
            AttributeKind::Integer,
            Formula::Call(Function::Floor, vec![var("basic_speed")]),
            5,
        ),
        AttributeDef::new("fp", "Fatigue Points", AttributeKind::Pool, var("ht"), 3).with_thresholds(vec![
            PoolThreshold::new("Unconscious", -1, 1, 0),
            PoolThreshold::new("Collapse", 0, 1, 0).with_ops(halving | ThresholdOps::HALVE_ST),
            PoolThreshold::new("Tired", 1, 3, 0).with_ops(halving | ThresholdOps::HALVE_ST),
            PoolThreshold::new("Tiring", 1, 1, -1),
            PoolThreshold::new("Rested", 1, 1, 0),
        ]),
        AttributeDef::new("hp", "Hit Points", AttributeKind::Pool, var("st"), 2)
            .with_cost_adj_percent_per_sm(10)
            .with_thresholds(vec![
                PoolThreshold::new("Dead", -5, 1, 0),
                PoolThreshold::new("Dying", -1, 1, 0).with_ops(halving),
                PoolThreshold::new("Collapse", 0, 1, 0).with_ops(halving),
                PoolThreshold::new("Reeling", 1, 3, 0).with_ops(halving),
                PoolThreshold::new("Wounded", 1, 1, -1),
                PoolThreshold::new("Healthy", 1, 1, 0),
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = SheetSettings::default();
        assert_eq!(settings.max_iterations, SheetSettings::DEFAULT_MAX_ITERATIONS);
        assert_eq!(settings.default_weight_units, WeightUnits::Pound);
        assert!(settings.use_simple_metric_conversions);
        assert_eq!(settings.attributes.len(), 10);
    }

    #[test]
    fn builders_override_defaults() {
        let settings = SheetSettings::new()
            .with_damage_progression(DamageProgression::KnowingYourOwnStrength)
            .with_max_iterations(8)
            .with_weight_units(WeightUnits::Kilogram);
        assert_eq!(settings.damage_progression, DamageProgression::KnowingYourOwnStrength);
        assert_eq!(settings.max_iterations, 8);
        assert_eq!(settings.default_weight_units, WeightUnits::Kilogram);
    }

    #[test]
    fn standard_bases_render_as_expressions() {
        let settings = SheetSettings::new();
        let base = |id: &str| settings.attribute(id).map(|def| def.base.to_string());
        assert_eq!(base("basic_speed").as_deref(), Some("($dx + $ht) / 4"));
        assert_eq!(base("basic_move").as_deref(), Some("floor($basic_speed)"));
        assert_eq!(base("will").as_deref(), Some("$iq"));
        assert!(settings.attribute("luck").is_none());
    }

    #[test]
    fn progression_parses_case_insensitively() {
        assert_eq!(
            "Knowing_Your_Own_Strength".parse::<DamageProgression>().unwrap(),
            DamageProgression::KnowingYourOwnStrength
        );
    }
}
