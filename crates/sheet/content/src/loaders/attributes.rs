//! Attribute definition library loader.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sheet_core::AttributeDef;

use crate::loaders::{LoadResult, read_file};

/// Attribute library structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeLibrary {
    pub attributes: Vec<AttributeDef>,
}

/// Loader for attribute definition libraries from RON files.
pub struct AttributeLibraryLoader;

impl AttributeLibraryLoader {
    /// Load attribute definitions from a RON file, in file order.
    pub fn load(path: &Path) -> LoadResult<Vec<AttributeDef>> {
        let content = read_file(path)?;
        Self::from_ron(&content)
    }

    /// The standard ten attributes bundled with the crate.
    pub fn standard() -> LoadResult<Vec<AttributeDef>> {
        Self::from_ron(include_str!("../../data/attributes/standard.ron"))
    }

    pub fn from_ron(content: &str) -> LoadResult<Vec<AttributeDef>> {
        let library: AttributeLibrary = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse attribute library RON: {}", e))?;

        let mut seen = BTreeSet::new();
        for def in &library.attributes {
            if def.id.trim().is_empty() {
                anyhow::bail!("Attribute `{}` has an empty id", def.name);
            }
            if !seen.insert(def.id.to_lowercase()) {
                anyhow::bail!("Duplicate attribute id `{}`", def.id);
            }
        }
        Ok(library.attributes)
    }
}
