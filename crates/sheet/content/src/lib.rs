//! Persistence for character sheets.
//!
//! Loaders read the files `sheet-core` never touches:
//! - character sheets (JSON), stored as nested trait rows
//! - sheet settings (TOML)
//! - attribute definition libraries (RON)
//!
//! [`CalcExport`] captures the computed values of a recalculated
//! [`Character`](sheet_core::Character) so they can be written next to the
//! persisted data.

#[cfg(feature = "serde")]
pub mod export;
#[cfg(feature = "serde")]
pub mod file;

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "serde")]
pub use export::CalcExport;
#[cfg(feature = "serde")]
pub use file::CharacterFile;

#[cfg(feature = "loaders")]
pub use loaders::{
    AttributeLibrary, AttributeLibraryLoader, CharacterLoader, ContentFactory, LoadResult,
    SettingsLoader, export_json,
};
