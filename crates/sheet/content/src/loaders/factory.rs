//! Content factory for building sheets from a data directory.

use std::path::{Path, PathBuf};

use sheet_core::{Character, SheetSettings};

use crate::loaders::{AttributeLibraryLoader, CharacterLoader, LoadResult, SettingsLoader};

/// Loads sheet content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── settings.toml        (optional)
/// ├── attributes.ron       (optional, replaces the settings' attributes)
/// └── characters/
///     └── <name>.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Settings from `settings.toml` and `attributes.ron`, each falling back
    /// to the defaults when absent.
    pub fn load_settings(&self) -> LoadResult<SheetSettings> {
        let settings_path = self.data_dir.join("settings.toml");
        let mut settings = if settings_path.exists() {
            SettingsLoader::load(&settings_path)?
        } else {
            SheetSettings::default()
        };
        let attributes_path = self.data_dir.join("attributes.ron");
        if attributes_path.exists() {
            settings = settings.with_attributes(AttributeLibraryLoader::load(&attributes_path)?);
        }
        Ok(settings)
    }

    /// Load `characters/<name>.json` under the directory's settings.
    pub fn load_character(&self, name: &str) -> LoadResult<Character> {
        let path = self.data_dir.join("characters").join(format!("{name}.json"));
        CharacterLoader::load_with_settings(&path, self.load_settings()?)
    }
}
