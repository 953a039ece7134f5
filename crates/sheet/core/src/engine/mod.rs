//! The character sheet and its recalculation pipeline.
//!
//! [`Character`] owns the trait forests and the attribute allocations. Every
//! derived number lives in a [`ResolvedSheet`] cache and in the per-trait
//! level and satisfaction fields, all of which [`Character::recalculate`]
//! rebuilds. Edits go through setters that report a [`SheetChange`] when the
//! stored value actually moved; callers decide when to recalculate.

mod change;
mod delta;
mod levels;
mod points;
mod recalc;
mod resolved;
mod weight;

use std::collections::BTreeMap;

pub use change::{EquipmentList, SheetChange};
pub use delta::{Recalculation, SheetFields};
pub use points::{PointTotals, advantage_points};
pub use resolved::{
    BASIC_MOVE, BASIC_SPEED, BLOCK, DODGE, PARRY, ResolvedSheet, SIZE_MODIFIER, STRENGTH,
};

use crate::attribute::Attribute;
use crate::config::SheetSettings;
use crate::forest::Forest;
use crate::fxp::Fixed6;
use crate::index::FeatureIndex;
use crate::model::{Advantage, Equipment, Note, Skill, Spell};
use crate::prereq::SheetOracle;

/// A character sheet.
///
/// The trait forests are public; anything reachable through them may be
/// edited directly as long as [`Character::recalculate`] runs before derived
/// values are read again.
#[derive(Clone, Debug)]
pub struct Character {
    pub name: String,
    pub advantages: Forest<Advantage>,
    pub skills: Forest<Skill>,
    pub spells: Forest<Spell>,
    /// Carried equipment; counts toward encumbrance and feeds features.
    pub equipment: Forest<Equipment>,
    /// Equipment owned but not carried.
    pub other_equipment: Forest<Equipment>,
    pub notes: Forest<Note>,
    attributes: BTreeMap<String, Attribute>,
    total_points: i32,
    size_modifier: i32,
    settings: SheetSettings,
    resolved: ResolvedSheet,
    index: FeatureIndex,
}

impl Character {
    pub const DEFAULT_TOTAL_POINTS: i32 = 150;

    /// An empty sheet with one unadjusted allocation per attribute definition.
    pub fn new(settings: SheetSettings) -> Self {
        let attributes = settings
            .attributes
            .iter()
            .map(|def| (def.id.clone(), Attribute::default()))
            .collect();
        Self {
            name: String::new(),
            advantages: Forest::new(),
            skills: Forest::new(),
            spells: Forest::new(),
            equipment: Forest::new(),
            other_equipment: Forest::new(),
            notes: Forest::new(),
            attributes,
            total_points: Self::DEFAULT_TOTAL_POINTS,
            size_modifier: 0,
            settings,
            resolved: ResolvedSheet::default(),
            index: FeatureIndex::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_total_points(mut self, total_points: i32) -> Self {
        self.total_points = total_points;
        self
    }

    #[must_use]
    pub fn with_size_modifier(mut self, size_modifier: i32) -> Self {
        self.size_modifier = size_modifier;
        self
    }

    /// Replaces the allocation for `id`. Allocations without a matching
    /// definition are kept but never resolved.
    #[must_use]
    pub fn with_attribute(mut self, id: impl Into<String>, adj: Fixed6, damage: Fixed6) -> Self {
        self.attributes.insert(
            id.into(),
            Attribute {
                adj,
                damage,
                ..Attribute::default()
            },
        );
        self
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    pub fn total_points(&self) -> i32 {
        self.total_points
    }

    /// Size modifier before bonuses; see [`ResolvedSheet::size_modifier`].
    pub fn size_modifier(&self) -> i32 {
        self.size_modifier
    }

    pub fn attribute(&self, id: &str) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(id, attribute)| (id.as_str(), attribute))
    }

    /// Derived values as of the last recalculation.
    pub fn resolved(&self) -> &ResolvedSheet {
        &self.resolved
    }

    /// Feature index built on the last convergence pass.
    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn points(&self) -> &PointTotals {
        &self.resolved.points
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new(SheetSettings::default())
    }
}

impl SheetOracle for Character {
    fn advantages(&self) -> &Forest<Advantage> {
        &self.advantages
    }

    fn skills(&self) -> &Forest<Skill> {
        &self.skills
    }

    fn spells(&self) -> &Forest<Spell> {
        &self.spells
    }

    fn attribute_current(&self, id: &str) -> Option<Fixed6> {
        self.resolved.attributes.get(id).map(|values| values.current)
    }

    fn simple_metric(&self) -> bool {
        self.settings.use_simple_metric_conversions
    }
}
