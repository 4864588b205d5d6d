//! Locale codes and the supported locale table.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// A locale code such as `en` or `hi-Latn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleCode(String);

impl LocaleCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocaleCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl PartialEq<str> for LocaleCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LocaleCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One entry of the supported locale table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLocale {
    pub code: LocaleCode,
    /// Label shown in selector controls, written in the locale itself.
    pub label: String,
}

impl SupportedLocale {
    #[must_use]
    pub fn new(code: &str, label: &str) -> Self {
        Self { code: LocaleCode::from(code), label: label.to_string() }
    }
}

/// Ordered set of locales the runtime accepts.
///
/// Decides both which codes may be persisted and which options populate every
/// selector control. Order is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportedLocales(Vec<SupportedLocale>);

impl SupportedLocales {
    #[must_use]
    pub const fn new(entries: Vec<SupportedLocale>) -> Self {
        Self(entries)
    }

    /// Returns the canonical code when `code` is supported.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&LocaleCode> {
        self.0.iter().map(|entry| &entry.code).find(|candidate| candidate.as_str() == code)
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    #[must_use]
    pub fn label(&self, code: &str) -> Option<&str> {
        self.0.iter().find(|entry| entry.code.as_str() == code).map(|entry| entry.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportedLocale> {
        self.0.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &LocaleCode> {
        self.0.iter().map(|entry| &entry.code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SupportedLocales {
    fn default() -> Self {
        Self(vec![
            SupportedLocale::new("it", "Italiano"),
            SupportedLocale::new("en", "English"),
            SupportedLocale::new("pa", "ਪੰਜਾਬੀ"),
            SupportedLocale::new("hi", "हिन्दी"),
            SupportedLocale::new("hi-Latn", "Hinglish"),
        ])
    }
}

impl<'a> IntoIterator for &'a SupportedLocales {
    type Item = &'a SupportedLocale;
    type IntoIter = std::slice::Iter<'a, SupportedLocale>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
