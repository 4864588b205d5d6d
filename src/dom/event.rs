//! Events flowing between the host document and the runtime.

use serde::{
    Deserialize,
    Serialize,
};

use super::ElementId;
use crate::locale::LocaleCode;

/// Name of the document-level notification sent after each translation pass.
pub const LOCALE_CHANGE_EVENT: &str = "language:change";

/// Payload of [`LOCALE_CHANGE_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleChangeEvent {
    pub lang: LocaleCode,
}

/// Stable identity of a listener registered with a host.
///
/// Registering and removing by identity is what keeps repeated initialization
/// from stacking handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

impl HandlerId {
    /// Change handler attached to every locale selector.
    pub const LOCALE_SELECT: Self = Self(1);
    /// Deferred initialization waiting for the document to be ready.
    pub const RUNTIME_INIT: Self = Self(2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    #[default]
    Complete,
}

impl ReadyState {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Work queued by the host for the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    /// The document finished loading.
    Ready { handler: HandlerId },
    /// The user picked a different option in a select control.
    Change { target: ElementId, handler: HandlerId },
}
