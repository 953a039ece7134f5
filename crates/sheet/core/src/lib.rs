//! Character-sheet resolution engine.
//!
//! `sheet-core` turns a tree of traits (advantages, skills, spells,
//! equipment) plus attribute allocations into derived numbers: resolved
//! attributes, lift and damage, encumbrance, move and dodge, skill levels,
//! prerequisite results and point totals. All computation flows through
//! [`Character::recalculate`], which runs the convergence loop over the
//! [`FeatureIndex`] until levels settle or the pass limit is reached.
//!
//! The crate performs no I/O. With the `serde` feature every persisted type
//! serializes; `sheet-content` builds its loaders on top of that.

/// Implements serde through `Display` and `FromStr` for types persisted as
/// short strings (`"5 lb"`, `"dx/a"`, `"+10%"`).
macro_rules! serde_via_str {
    ($ty:ty) => {
        #[cfg(feature = "serde")]
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod attribute;
pub mod config;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod feature;
pub mod forest;
pub mod fxp;
pub mod index;
pub mod model;
pub mod modifier;
pub mod prereq;
pub mod units;

pub use attribute::{
    Attribute, AttributeDef, AttributeKind, AttributeValues, Dice, Encumbrance, Formula,
    LiftMultiples, ParseExprError, PoolThreshold, ThresholdOps,
};
pub use config::{DamageProgression, SheetSettings, standard_attributes};
pub use criteria::{NumericCompare, NumericCriteria, StringCompare, StringCriteria, WeightCriteria};
pub use engine::{
    Character, EquipmentList, PointTotals, Recalculation, ResolvedSheet, SheetChange, SheetFields,
};
pub use error::{ArithmeticError, CalcResult, ErrorSeverity, SheetError};
pub use feature::{Feature, LeveledAmount};
pub use forest::{Forest, NodeId, Row};
pub use fxp::{Fixed6, ParseFixedError};
pub use index::{FeatureIndex, IndexedFeature};
pub use model::{
    Advantage, AdvantageContainerType, Difficulty, DifficultyLevel, Equipment, Note, Satisfaction,
    Skill, SkillDefault, SkillLevel, Spell, TraitKind, TraitRef,
};
pub use modifier::{AdvantageModifier, CostAdjustment, EquipmentModifier, WeightAdjustment};
pub use prereq::{Prereq, PrereqList, SheetOracle};
pub use units::{ParseWeightError, Weight, WeightUnits};
