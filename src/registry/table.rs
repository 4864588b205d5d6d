//! Immutable key → locale → text table.

use std::collections::HashMap;

use serde_json::Value;

use super::loader::{
    flatten_json,
    parse_jsonc,
};
use super::RegistryError;
use crate::locale::{
    LocaleCode,
    SupportedLocales,
};

/// Read-only translation table.
///
/// Built once through [`RegistryBuilder`]; lookups never fall back to another
/// locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationRegistry {
    /// key → locale → text
    entries: HashMap<String, HashMap<String, String>>,
}

impl TranslationRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Parses a key-major dictionary (`{ "nav.home": { "en": "Home" } }`).
    ///
    /// Comments, trailing commas and unquoted property names are accepted.
    pub fn from_jsonc(text: &str) -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        builder.add_key_table(&parse_jsonc(text)?)?;
        Ok(builder.build())
    }

    /// Exact `(key, locale)` lookup.
    #[must_use]
    pub fn lookup(&self, key: &str, locale: &str) -> Option<&str> {
        self.entries.get(key)?.get(locale).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Supported locales that have no text for `key`, in table order.
    #[must_use]
    pub fn missing_locales<'a>(
        &self,
        key: &str,
        supported: &'a SupportedLocales,
    ) -> Vec<&'a LocaleCode> {
        supported.codes().filter(|code| self.lookup(key, code.as_str()).is_none()).collect()
    }
}

impl<K, L, T> FromIterator<(K, L, T)> for TranslationRegistry
where
    K: Into<String>,
    L: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, L, T)>>(iter: I) -> Self {
        let mut builder = RegistryBuilder::new();
        for (key, locale, text) in iter {
            builder.insert(key, locale, text);
        }
        builder.build()
    }
}

/// Accumulates translations before freezing them into a [`TranslationRegistry`].
///
/// Later insertions for the same `(key, locale)` replace earlier ones.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    entries: HashMap<String, HashMap<String, String>>,
    /// Joins nested keys of locale resource files.
    key_separator: String,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: HashMap::new(), key_separator: ".".to_string() }
    }

    /// Separator used by [`add_locale_tree`](Self::add_locale_tree).
    #[must_use]
    pub fn with_key_separator(mut self, separator: impl Into<String>) -> Self {
        self.key_separator = separator.into();
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        locale: impl Into<String>,
        text: impl Into<String>,
    ) -> &mut Self {
        let key = key.into();
        let locale = locale.into();
        let previous =
            self.entries.entry(key.clone()).or_default().insert(locale.clone(), text.into());
        if previous.is_some() {
            tracing::debug!(key = %key, locale = %locale, "Overriding translation");
        }
        self
    }

    /// Merges a key-major table. Entries that are not objects are skipped, as
    /// are non-string texts.
    pub fn add_key_table(&mut self, table: &Value) -> Result<&mut Self, RegistryError> {
        let Value::Object(entries) = table else {
            return Err(RegistryError::Shape(format!(
                "dictionary root must be an object, found {}",
                json_kind(table)
            )));
        };

        for (key, locales) in entries {
            let Value::Object(locales) = locales else {
                tracing::warn!(key = %key, "Skipping dictionary entry that is not an object");
                continue;
            };

            for (locale, text) in locales {
                match text {
                    Value::String(text) => {
                        self.insert(key.as_str(), locale.as_str(), text.as_str());
                    }
                    other => {
                        tracing::debug!(
                            key = %key,
                            locale = %locale,
                            kind = json_kind(other),
                            "Skipping non-string translation"
                        );
                    }
                }
            }
        }

        Ok(self)
    }

    /// Merges a nested single-locale resource (`{ "nav": { "home": "Home" } }`).
    pub fn add_locale_tree(&mut self, locale: &str, tree: &Value) -> &mut Self {
        for (key, text) in flatten_json(tree, &self.key_separator, None) {
            self.insert(key, locale, text);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> TranslationRegistry {
        tracing::debug!(keys = self.entries.len(), "Translation registry built");
        TranslationRegistry { entries: self.entries }
    }
}

/// JSON type name for error messages.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
