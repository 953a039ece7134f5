//! Character sheet loader.

use std::path::Path;

use sheet_core::{Character, SheetSettings};

use crate::export::CalcExport;
use crate::file::CharacterFile;
use crate::loaders::{LoadResult, read_file, write_file};

/// Loader for character sheets stored as JSON.
pub struct CharacterLoader;

impl CharacterLoader {
    /// Load a character under the default settings.
    pub fn load(path: &Path) -> LoadResult<Character> {
        Self::load_with_settings(path, SheetSettings::default())
    }

    pub fn load_with_settings(path: &Path, settings: SheetSettings) -> LoadResult<Character> {
        let content = read_file(path)?;
        Self::from_json_with_settings(&content, settings)
    }

    pub fn from_json(content: &str) -> LoadResult<Character> {
        Self::from_json_with_settings(content, SheetSettings::default())
    }

    /// Parses a sheet and runs the first recalculation.
    pub fn from_json_with_settings(content: &str, settings: SheetSettings) -> LoadResult<Character> {
        let file: CharacterFile = serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character JSON: {}", e))?;
        let mut character = file.into_character(settings);
        let report = character
            .recalculate()
            .map_err(|e| anyhow::anyhow!("Failed to recalculate character: {}", e))?;
        tracing::debug!(name = %character.name, passes = report.passes, "character loaded");
        Ok(character)
    }

    /// Write `character` with its computed values.
    pub fn save(path: &Path, character: &Character) -> LoadResult<()> {
        write_file(path, &export_json(character)?)
    }
}

/// Serializes the persisted data of `character` plus a `calc` block with the
/// values of its last recalculation.
pub fn export_json(character: &Character) -> LoadResult<String> {
    let file = CharacterFile::from_character(character).with_calc(CalcExport::from_character(character));
    serde_json::to_string_pretty(&file).map_err(|e| anyhow::anyhow!("Failed to serialize character: {}", e))
}
