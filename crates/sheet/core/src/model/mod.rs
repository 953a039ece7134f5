//! Character-sheet entries.
//!
//! Each kind of trait lives in its own [`Forest`](crate::forest::Forest) on the
//! [`Character`](crate::engine::Character). A [`TraitRef`] names one node across
//! all forests; the feature index records it as the non-owning back-reference of
//! every indexed bonus.

mod advantage;
mod equipment;
mod note;
mod skill;
mod spell;

use strum::{AsRefStr, Display, EnumString};

use crate::forest::NodeId;

pub use advantage::{Advantage, AdvantageContainerType};
pub use equipment::Equipment;
pub use note::Note;
pub use skill::{
    Difficulty, DifficultyLevel, ParseDifficultyError, Skill, SkillDefault, SkillLevel,
    TechniqueSpec,
};
pub use spell::Spell;

/// Which forest a trait lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TraitKind {
    Advantage,
    Skill,
    Spell,
    Equipment,
    OtherEquipment,
    Note,
}

/// Non-owning reference to a trait in one of the character's forests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitRef {
    pub kind: TraitKind,
    pub id: NodeId,
}

impl TraitRef {
    pub const fn new(kind: TraitKind, id: NodeId) -> Self {
        Self { kind, id }
    }
}

/// Result of the last prerequisite check of a trait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Satisfaction {
    pub satisfied: bool,
    pub unsatisfied_reason: String,
}

impl Default for Satisfaction {
    fn default() -> Self {
        Self {
            satisfied: true,
            unsatisfied_reason: String::new(),
        }
    }
}

impl Satisfaction {
    pub fn unsatisfied(reason: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            unsatisfied_reason: reason.into(),
        }
    }
}
