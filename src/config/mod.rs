//! Runtime configuration: storage slot, expiry, locale table and directive names.
mod source;
mod types;

pub use source::CONFIG_FILE_NAME;
pub use types::{
    ConfigError,
    DEFAULT_EXPIRY_MS,
    DEFAULT_STORAGE_KEY,
    DirectiveAttributes,
    RuntimeSettings,
    TranslationFilesConfig,
    ValidationError,
};
