//! On-disk shape of a character sheet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sheet_core::{
    Advantage, Attribute, Character, Equipment, Forest, Note, Row, SheetSettings, Skill, Spell,
};

use crate::export::CalcExport;

/// Current version written by [`CharacterFile::from_character`].
pub const CURRENT_VERSION: u32 = 1;

/// A character as stored: allocations plus one row list per forest.
///
/// Derived values are never read back; `calc` is only written for
/// consumers that want the numbers without running the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterFile {
    pub version: u32,
    pub name: String,
    pub total_points: i32,
    pub size_modifier: i32,
    pub attributes: BTreeMap<String, Attribute>,
    pub advantages: Vec<Row<Advantage>>,
    pub skills: Vec<Row<Skill>>,
    pub spells: Vec<Row<Spell>>,
    pub equipment: Vec<Row<Equipment>>,
    pub other_equipment: Vec<Row<Equipment>>,
    pub notes: Vec<Row<Note>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calc: Option<CalcExport>,
}

impl Default for CharacterFile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            name: String::new(),
            total_points: Character::DEFAULT_TOTAL_POINTS,
            size_modifier: 0,
            attributes: BTreeMap::new(),
            advantages: Vec::new(),
            skills: Vec::new(),
            spells: Vec::new(),
            equipment: Vec::new(),
            other_equipment: Vec::new(),
            notes: Vec::new(),
            calc: None,
        }
    }
}

impl CharacterFile {
    /// Captures the persisted part of `character`.
    pub fn from_character(character: &Character) -> Self {
        Self {
            version: CURRENT_VERSION,
            name: character.name.clone(),
            total_points: character.total_points(),
            size_modifier: character.size_modifier(),
            attributes: character
                .attributes()
                .map(|(id, attribute)| (id.to_string(), attribute.clone()))
                .collect(),
            advantages: character.advantages.to_rows(),
            skills: character.skills.to_rows(),
            spells: character.spells.to_rows(),
            equipment: character.equipment.to_rows(),
            other_equipment: character.other_equipment.to_rows(),
            notes: character.notes.to_rows(),
            calc: None,
        }
    }

    #[must_use]
    pub fn with_calc(mut self, calc: CalcExport) -> Self {
        self.calc = Some(calc);
        self
    }

    /// Builds a sheet under `settings`. The sheet still needs a
    /// recalculation before its derived values mean anything.
    pub fn into_character(self, settings: SheetSettings) -> Character {
        if self.version > CURRENT_VERSION {
            tracing::warn!(version = self.version, "character file is newer than this reader");
        }
        let mut character = Character::new(settings)
            .with_name(self.name)
            .with_total_points(self.total_points)
            .with_size_modifier(self.size_modifier);
        for (id, attribute) in self.attributes {
            character = character.with_attribute(id, attribute.adj, attribute.damage);
        }
        character.advantages = Forest::from_rows(self.advantages);
        character.skills = Forest::from_rows(self.skills);
        character.spells = Forest::from_rows(self.spells);
        character.equipment = Forest::from_rows(self.equipment);
        character.other_equipment = Forest::from_rows(self.other_equipment);
        character.notes = Forest::from_rows(self.notes);
        character
    }
}
