use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::locale::{
    LocaleCode,
    SupportedLocales,
};

/// Storage slot used when the host does not configure one.
pub const DEFAULT_STORAGE_KEY: &str = "apll.lang";

/// One hour.
pub const DEFAULT_EXPIRY_MS: u64 = 60 * 60 * 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "supportedLocales[0].code")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Numbered, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Key of the single persisted preference record.
    pub storage_key: String,

    /// Default preference lifetime in milliseconds.
    pub expiry_ms: u64,

    /// Language the markup ships in.
    ///
    /// Used when a selector reports an empty value. It never triggers a rewrite
    /// of the document on its own.
    pub default_locale: LocaleCode,

    pub supported_locales: SupportedLocales,

    pub directives: DirectiveAttributes,

    /// Class marking `select` elements as locale pickers.
    pub selector_class: String,

    /// Separator used when flattening nested locale resource files.
    pub key_separator: String,

    pub translation_files: TranslationFilesConfig,
}

/// Markup attribute names the engine reads directives from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectiveAttributes {
    /// Holds one translation key for the element's text content.
    pub text: String,
    /// Holds a comma-separated `attr:key` list.
    pub attributes: String,
}

impl Default for DirectiveAttributes {
    fn default() -> Self {
        Self { text: "data-i18n".to_string(), attributes: "data-i18n-attr".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub file_pattern: String,
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self { file_pattern: "**/locales/*.json".to_string() }
    }
}

impl RuntimeSettings {
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }

    /// # Errors
    /// - Required field is empty
    /// - Duplicate or unknown locale code
    /// - Invalid glob pattern
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage_key.trim().is_empty() {
            errors.push(ValidationError::new(
                "storageKey",
                "The storage key cannot be empty. Example: \"apll.lang\"",
            ));
        }

        if self.expiry_ms == 0 {
            errors.push(ValidationError::new(
                "expiryMs",
                "The expiry must be greater than zero milliseconds",
            ));
        }

        self.validate_locales(&mut errors);

        if self.directives.text.trim().is_empty() {
            errors.push(ValidationError::new("directives.text", "The attribute name cannot be empty"));
        }
        if self.directives.attributes.trim().is_empty() {
            errors.push(ValidationError::new(
                "directives.attributes",
                "The attribute name cannot be empty",
            ));
        }
        if self.directives.text == self.directives.attributes {
            errors.push(ValidationError::new(
                "directives",
                "Text and attribute directives must use different attribute names",
            ));
        }

        if self.selector_class.is_empty() || self.selector_class.contains(char::is_whitespace) {
            errors.push(ValidationError::new(
                "selectorClass",
                "The selector class must be a single non-empty class name. Example: \"lang-select\"",
            ));
        }

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.translation_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/locales/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.translation_files.file_pattern) {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.translation_files.file_pattern),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Locale table and default locale checks.
    fn validate_locales(&self, errors: &mut Vec<ValidationError>) {
        if self.supported_locales.is_empty() {
            errors.push(ValidationError::new(
                "supportedLocales",
                "At least one locale is required. Example: [{\"code\": \"en\", \"label\": \"English\"}]",
            ));
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.supported_locales.iter().enumerate() {
            if entry.code.as_str().trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("supportedLocales[{index}].code"),
                    "The locale code cannot be empty",
                ));
            } else if !seen.insert(entry.code.as_str()) {
                errors.push(ValidationError::new(
                    format!("supportedLocales[{index}].code"),
                    format!("Duplicate locale code '{}'", entry.code),
                ));
            }
        }

        if !self.supported_locales.is_empty()
            && !self.supported_locales.contains(self.default_locale.as_str())
        {
            errors.push(ValidationError::new(
                "defaultLocale",
                format!("'{}' is not one of the supported locales", self.default_locale),
            ));
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            expiry_ms: DEFAULT_EXPIRY_MS,
            default_locale: LocaleCode::from("it"),
            supported_locales: SupportedLocales::default(),
            directives: DirectiveAttributes::default(),
            selector_class: "lang-select".to_string(),
            key_separator: ".".to_string(),
            translation_files: TranslationFilesConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::locale::SupportedLocale;

    #[rstest]
    fn validate_valid_settings() {
        let settings = RuntimeSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"storageKey": "site.lang", "expiryMs": 5000}"#;

        let settings: RuntimeSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.storage_key, eq("site.lang"));
        assert_that!(settings.default_ttl(), eq(Duration::from_millis(5000)));
        assert_that!(settings.supported_locales.len(), eq(5));
        assert_that!(settings.directives.text, eq("data-i18n"));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: RuntimeSettings = serde_json::from_str("{}").unwrap();

        assert_eq!(settings, RuntimeSettings::default());
    }

    #[rstest]
    fn deserialize_nested_directive_override() {
        let json = r#"{"directives": {"text": "data-t"}}"#;

        let settings: RuntimeSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.directives.text, eq("data-t"));
        assert_that!(settings.directives.attributes, eq("data-i18n-attr"));
    }

    #[rstest]
    #[case::empty_storage_key(RuntimeSettings { storage_key: String::new(), ..Default::default() }, "storageKey")]
    #[case::zero_expiry(RuntimeSettings { expiry_ms: 0, ..Default::default() }, "expiryMs")]
    #[case::unknown_default(RuntimeSettings { default_locale: LocaleCode::from("fr"), ..Default::default() }, "defaultLocale")]
    #[case::spaced_class(RuntimeSettings { selector_class: "lang select".to_string(), ..Default::default() }, "selectorClass")]
    #[case::empty_separator(RuntimeSettings { key_separator: String::new(), ..Default::default() }, "keySeparator")]
    fn validate_rejects_single_field(#[case] settings: RuntimeSettings, #[case] field: &str) {
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq(field))])
        );
    }

    #[rstest]
    fn validate_rejects_clashing_directive_names() {
        let settings = RuntimeSettings {
            directives: DirectiveAttributes {
                text: "data-i18n".to_string(),
                attributes: "data-i18n".to_string(),
            },
            ..Default::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("directives")),
                field!(ValidationError.message, contains_substring("different attribute names"))
            ]])
        );
    }

    #[rstest]
    fn validate_reports_duplicate_locale_codes() {
        let settings = RuntimeSettings {
            default_locale: LocaleCode::from("en"),
            supported_locales: SupportedLocales::new(vec![
                SupportedLocale::new("en", "English"),
                SupportedLocale::new("en", "English (again)"),
            ]),
            ..Default::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("supportedLocales[1].code"))])
        );
    }

    #[rstest]
    fn validate_empty_locale_table_skips_default_check() {
        let settings = RuntimeSettings {
            supported_locales: SupportedLocales::new(Vec::new()),
            ..Default::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("supportedLocales"))])
        );
    }

    #[rstest]
    fn validate_collects_every_error() {
        let settings = RuntimeSettings {
            storage_key: " ".to_string(),
            expiry_ms: 0,
            translation_files: TranslationFilesConfig { file_pattern: "[".to_string() },
            ..Default::default()
        };

        let errors = settings.validate().unwrap_err();

        assert_that!(errors, len(eq(3)));
    }

    #[rstest]
    fn validation_error_message_lists_fields() {
        let error = ConfigError::ValidationErrors(vec![
            ValidationError::new("storageKey", "empty"),
            ValidationError::new("expiryMs", "zero"),
        ]);

        let message = error.to_string();

        assert!(message.contains("1. storageKey - empty"));
        assert!(message.contains("2. expiryMs - zero"));
    }
}
