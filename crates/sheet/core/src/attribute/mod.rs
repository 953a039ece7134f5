//! Attribute definitions, pools, and their resolution.
//!
//! An [`AttributeDef`] comes from the sheet settings; an [`Attribute`] is the
//! character's allocation against it. Each convergence pass overwrites the
//! `bonus` and `cost_reduction` of every attribute from the feature index and
//! then resolves all of them into [`AttributeValues`] in definition order.
//!
//! Base expressions may reference other attributes. A reference that loops back
//! onto an attribute whose resolution is still in progress is logged and
//! resolves to zero.

mod derived;
pub mod formula;

use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use strum::{AsRefStr, Display, EnumString};

use crate::error::CalcResult;
use crate::fxp::Fixed6;

pub use derived::{
    Dice, Encumbrance, LiftMultiples, basic_lift, dodge, encumbrance_index, halving_divisor,
    lifting_strength, move_at, swing, thrust,
};
pub use formula::{Formula, ParseExprError, VariableResolver, evaluate};

/// Highest total cost reduction an attribute can receive, in percent.
pub const MAX_COST_REDUCTION: i32 = 80;

/// Variable naming the size modifier in base expressions.
pub const SIZE_MODIFIER_VARIABLE: &str = "sm";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum AttributeKind {
    #[default]
    Integer,
    Decimal,
    /// Integer maximum with a current value reduced by damage.
    Pool,
}

bitflags! {
    /// Behavior switched on while a pool threshold is active.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ThresholdOps: u8 {
        const HALVE_MOVE  = 1 << 0;
        const HALVE_DODGE = 1 << 1;
        const HALVE_ST    = 1 << 2;
    }
}

/// One range of a pool. Its upper bound is
/// `maximum * multiplier / divisor + addition`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct PoolThreshold {
    pub state: String,
    pub multiplier: i64,
    pub divisor: i64,
    pub addition: i64,
    pub ops: ThresholdOps,
}

impl Default for PoolThreshold {
    fn default() -> Self {
        Self {
            state: String::new(),
            multiplier: 1,
            divisor: 1,
            addition: 0,
            ops: ThresholdOps::empty(),
        }
    }
}

impl PoolThreshold {
    pub fn new(state: impl Into<String>, multiplier: i64, divisor: i64, addition: i64) -> Self {
        Self {
            state: state.into(),
            multiplier,
            divisor,
            addition,
            ops: ThresholdOps::empty(),
        }
    }

    #[must_use]
    pub fn with_ops(mut self, ops: ThresholdOps) -> Self {
        self.ops = ops;
        self
    }

    pub fn threshold(&self, maximum: Fixed6) -> CalcResult<Fixed6> {
        let scaled = maximum.mul_int(self.multiplier).div_int(self.divisor)?;
        Ok(scaled.checked_add(Fixed6::from_int(self.addition))?.trunc())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct AttributeDef {
    pub id: String,
    pub name: String,
    pub kind: AttributeKind,
    pub base: Formula,
    pub cost_per_point: i32,
    /// Cost reduction per point of positive size modifier, in percent.
    pub cost_adj_percent_per_sm: i32,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub thresholds: Vec<PoolThreshold>,
}

impl Default for AttributeDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: AttributeKind::Integer,
            base: Formula::constant(10),
            cost_per_point: 0,
            cost_adj_percent_per_sm: 0,
            thresholds: Vec::new(),
        }
    }
}

impl AttributeDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AttributeKind,
        base: Formula,
        cost_per_point: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            base,
            cost_per_point,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cost_adj_percent_per_sm(mut self, percent: i32) -> Self {
        self.cost_adj_percent_per_sm = percent;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Vec<PoolThreshold>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Point cost of `adjustment` purchased levels.
    ///
    /// A positive size modifier adds `cost_adj_percent_per_sm` percent of
    /// reduction per point unless `size_exempt`. The total reduction is capped
    /// at [`MAX_COST_REDUCTION`].
    pub fn compute_cost(
        &self,
        adjustment: Fixed6,
        cost_reduction: i32,
        size_modifier: i32,
        size_exempt: bool,
    ) -> CalcResult<i32> {
        let mut cost = adjustment.checked_mul(Fixed6::from(self.cost_per_point))?;
        let mut reduction = cost_reduction;
        if size_modifier > 0 && self.cost_adj_percent_per_sm > 0 && !size_exempt {
            reduction = reduction.saturating_add(size_modifier.saturating_mul(self.cost_adj_percent_per_sm));
        }
        if reduction > 0 {
            let reduction = reduction.min(MAX_COST_REDUCTION);
            cost = cost
                .checked_mul(Fixed6::from(100 - reduction))?
                .div_int(100)?;
        }
        Ok(cost.round().to_i32())
    }
}

/// The character's allocation against one attribute definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Attribute {
    /// Levels bought above or below the base value.
    pub adj: Fixed6,
    /// Amount lost from the maximum; pools only.
    pub damage: Fixed6,
    /// Sum of attribute bonuses, rewritten every pass.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub bonus: Fixed6,
    /// Summed cost reductions, capped, rewritten every pass.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cost_reduction: i32,
}

/// Resolved values of one attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeValues {
    pub maximum: Fixed6,
    pub current: Fixed6,
    /// State name of the active pool threshold.
    pub threshold: Option<String>,
    pub ops: ThresholdOps,
}

/// Number of attributes whose active threshold carries `op`.
pub fn count_threshold_ops(values: &BTreeMap<String, AttributeValues>, op: ThresholdOps) -> usize {
    values.values().filter(|value| value.ops.contains(op)).count()
}

/// Resolves every defined attribute, in definition order.
pub fn resolve_attributes(
    defs: &[AttributeDef],
    attributes: &BTreeMap<String, Attribute>,
    size_modifier: i32,
) -> CalcResult<BTreeMap<String, AttributeValues>> {
    let mut resolver = AttributeResolver {
        defs,
        attributes,
        size_modifier,
        maximums: BTreeMap::new(),
        in_progress: BTreeSet::new(),
    };
    let mut out = BTreeMap::new();
    for def in defs {
        let maximum = resolver.maximum(&def.id)?.unwrap_or(Fixed6::ZERO);
        let current = resolver.current_from(def, maximum);
        let mut values = AttributeValues {
            maximum,
            current,
            threshold: None,
            ops: ThresholdOps::empty(),
        };
        if def.kind == AttributeKind::Pool {
            for threshold in &def.thresholds {
                if current <= threshold.threshold(maximum)? {
                    values.threshold = Some(threshold.state.clone());
                    values.ops = threshold.ops;
                    break;
                }
            }
        }
        out.insert(def.id.clone(), values);
    }
    Ok(out)
}

struct AttributeResolver<'a> {
    defs: &'a [AttributeDef],
    attributes: &'a BTreeMap<String, Attribute>,
    size_modifier: i32,
    maximums: BTreeMap<String, Fixed6>,
    in_progress: BTreeSet<String>,
}

impl AttributeResolver<'_> {
    fn def(&self, id: &str) -> Option<&AttributeDef> {
        self.defs.iter().find(|def| def.id.eq_ignore_ascii_case(id))
    }

    /// Maximum of the attribute named `id`, matched case-insensitively.
    /// Caches and allocations are keyed by the definition's own id.
    fn maximum(&mut self, id: &str) -> CalcResult<Option<Fixed6>> {
        let Some(def) = self.def(id) else {
            return Ok(None);
        };
        let (key, kind, base) = (def.id.clone(), def.kind, def.base.clone());
        let id = key.as_str();
        if let Some(value) = self.maximums.get(id) {
            return Ok(Some(*value));
        }
        if !self.in_progress.insert(id.to_string()) {
            tracing::error!(attribute = id, "attribute base refers back to itself");
            return Ok(Some(Fixed6::ZERO));
        }
        let base = evaluate(&base, self);
        self.in_progress.remove(id);
        let mut value = base?;
        if let Some(attribute) = self.attributes.get(id) {
            value = value.checked_add(attribute.adj)?.checked_add(attribute.bonus)?;
        }
        if kind != AttributeKind::Decimal {
            value = value.floor();
        }
        self.maximums.insert(id.to_string(), value);
        Ok(Some(value))
    }

    fn current_from(&self, def: &AttributeDef, maximum: Fixed6) -> Fixed6 {
        match (def.kind, self.attributes.get(&def.id)) {
            (AttributeKind::Pool, Some(attribute)) => maximum - attribute.damage,
            _ => maximum,
        }
    }
}

impl VariableResolver for AttributeResolver<'_> {
    fn resolve(&mut self, name: &str) -> CalcResult<Fixed6> {
        if name.eq_ignore_ascii_case(SIZE_MODIFIER_VARIABLE) {
            return Ok(Fixed6::from(self.size_modifier));
        }
        let (id, part) = match name.split_once('.') {
            Some((id, part)) => (id, Some(part)),
            None => (name, None),
        };
        let Some(maximum) = self.maximum(id)? else {
            tracing::warn!(variable = name, "unresolvable variable in attribute expression");
            return Ok(Fixed6::ZERO);
        };
        match part.map(str::to_ascii_lowercase).as_deref() {
            Some("maximum") => Ok(maximum),
            None | Some("current") => match self.def(id).cloned() {
                Some(def) => Ok(self.current_from(&def, maximum)),
                None => Ok(maximum),
            },
            Some(other) => {
                tracing::warn!(variable = name, part = other, "unknown attribute field");
                Ok(Fixed6::ZERO)
            }
        }
    }
}
