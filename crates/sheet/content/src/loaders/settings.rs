//! Sheet settings loader.

use std::path::Path;

use sheet_core::SheetSettings;

use crate::loaders::{LoadResult, read_file};

/// Loader for sheet settings from TOML files.
///
/// Missing keys fall back to [`SheetSettings::default`], so a file only
/// needs the options it changes.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> LoadResult<SheetSettings> {
        let content = read_file(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> LoadResult<SheetSettings> {
        let settings: SheetSettings = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))?;
        if settings.attributes.is_empty() {
            anyhow::bail!("Settings define no attributes");
        }
        Ok(settings)
    }
}
