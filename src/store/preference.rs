//! The expiring locale preference record.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::{
    Clock,
    Storage,
};
use crate::config::RuntimeSettings;
use crate::locale::{
    LocaleCode,
    SupportedLocales,
};

/// On-disk shape of the record.
#[derive(Debug, Serialize)]
struct StoredPreference<'a> {
    /// Locale code.
    v: &'a str,
    /// Expiry as epoch milliseconds.
    exp: i64,
}

/// Result of [`PreferenceStore::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored { locale: LocaleCode, expires_at: i64 },
    /// The locale is not in the supported table. Nothing was written.
    Rejected,
    /// The storage backend refused the write. The previous record, if any, is kept.
    Failed,
}

impl WriteOutcome {
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    #[must_use]
    pub const fn locale(&self) -> Option<&LocaleCode> {
        match self {
            Self::Stored { locale, .. } => Some(locale),
            Self::Rejected | Self::Failed => None,
        }
    }
}

/// Why a stored record was discarded. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// The raw value does not start with `{`.
    NotAnObject,
    /// Not valid JSON.
    Unparseable,
    /// `v` is not a string or `exp` is not a number.
    Shape,
    /// `v` is not in the supported table.
    UnsupportedLocale,
    /// `exp` lies before the current time.
    Expired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAnObject => "not an object",
            Self::Unparseable => "invalid json",
            Self::Shape => "missing or mistyped field",
            Self::UnsupportedLocale => "unsupported locale",
            Self::Expired => "expired",
        })
    }
}

/// Owns the single persisted locale preference.
///
/// Every access goes through [`read`](Self::read) and [`write`](Self::write).
/// A read never extends the record's lifetime.
#[derive(Debug)]
pub struct PreferenceStore<S, C> {
    /// Backend holding the raw record.
    storage: S,
    /// Source of "now" for expiry.
    clock: C,
    /// Storage key of the record.
    key: String,
    /// Lifetime used when a write passes no TTL.
    default_ttl: Duration,
    /// Locales a record may name.
    supported: SupportedLocales,
}

impl<S: Storage, C: Clock> PreferenceStore<S, C> {
    #[must_use]
    pub fn new(storage: S, clock: C, settings: &RuntimeSettings) -> Self {
        Self {
            storage,
            clock,
            key: settings.storage_key.clone(),
            default_ttl: settings.default_ttl(),
            supported: settings.supported_locales.clone(),
        }
    }

    /// Returns the stored locale if the record is well-formed and fresh.
    ///
    /// Any other record is removed before returning `None`.
    pub fn read(&mut self) -> Option<LocaleCode> {
        let raw = self.storage.get_item(&self.key)?;

        match self.validate(&raw) {
            Ok(locale) => Some(locale),
            Err(reason) => {
                tracing::debug!(key = %self.key, %reason, "Discarding stored locale preference");
                self.purge();
                None
            }
        }
    }

    /// Persists `locale` for `ttl` (or the configured default).
    ///
    /// Unsupported locales are rejected without touching the stored record.
    pub fn write(&mut self, locale: &str, ttl: Option<Duration>) -> WriteOutcome {
        let Some(locale) = self.supported.find(locale).cloned() else {
            tracing::debug!(locale, "Rejecting unsupported locale");
            return WriteOutcome::Rejected;
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = self.clock.now_millis().saturating_add(ttl_millis);

        let payload = match serde_json::to_string(&StoredPreference {
            v: locale.as_str(),
            exp: expires_at,
        }) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "Failed to encode locale preference");
                return WriteOutcome::Failed;
            }
        };

        if let Err(error) = self.storage.set_item(&self.key, &payload) {
            tracing::warn!(key = %self.key, %error, "Failed to persist locale preference");
            return WriteOutcome::Failed;
        }

        tracing::debug!(%locale, expires_at, "Stored locale preference");
        WriteOutcome::Stored { locale, expires_at }
    }

    /// Removes the record.
    pub fn clear(&mut self) {
        self.purge();
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[must_use]
    pub const fn supported_locales(&self) -> &SupportedLocales {
        &self.supported
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Checks a raw record in [`Rejection`] order.
    fn validate(&self, raw: &str) -> Result<LocaleCode, Rejection> {
        if !raw.starts_with('{') {
            return Err(Rejection::NotAnObject);
        }

        let record: Value = serde_json::from_str(raw).map_err(|_| Rejection::Unparseable)?;

        let (Some(locale), Some(expires_at)) = (
            record.get("v").and_then(Value::as_str),
            record.get("exp").and_then(Value::as_f64),
        ) else {
            return Err(Rejection::Shape);
        };

        let locale = self.supported.find(locale).ok_or(Rejection::UnsupportedLocale)?;

        #[allow(clippy::cast_precision_loss)]
        let now = self.clock.now_millis() as f64;
        if now > expires_at {
            return Err(Rejection::Expired);
        }

        Ok(locale.clone())
    }

    /// Removes the record; a failure is only logged.
    fn purge(&mut self) {
        if let Err(error) = self.storage.remove_item(&self.key) {
            tracing::warn!(key = %self.key, %error, "Failed to remove locale preference");
        }
    }
}
