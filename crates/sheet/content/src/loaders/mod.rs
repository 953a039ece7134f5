//! Content loaders for reading sheet data from files.
//!
//! Each loader turns one file format into `sheet-core` types: JSON for
//! character sheets, TOML for settings, RON for attribute libraries.

pub mod attributes;
pub mod character;
pub mod factory;
pub mod settings;

pub use attributes::{AttributeLibrary, AttributeLibraryLoader};
pub use character::{CharacterLoader, export_json};
pub use factory::ContentFactory;
pub use settings::SettingsLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Helper function to write file contents.
pub(crate) fn write_file(path: &Path, contents: &str) -> LoadResult<()> {
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write file {}: {}", path.display(), e))
}
