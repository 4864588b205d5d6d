//! Translation registry: the read-only `key → locale → text` lookup surface.
mod loader;
mod table;

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

pub use loader::{
    discover_translation_files,
    flatten_json,
    load_dictionary_file,
    load_translation_files,
    parse_jsonc,
};
pub use table::{
    RegistryBuilder,
    TranslationRegistry,
};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read translation file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dictionary: {0}")]
    Parse(String),

    #[error("Invalid dictionary: {0}")]
    Shape(String),

    #[error("Invalid translation file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<RegistryError>,
    },
}

impl RegistryError {
    /// Attaches the offending file path.
    fn in_file(self, path: &Path) -> Self {
        Self::InFile { path: path.to_path_buf(), source: Box::new(self) }
    }
}
