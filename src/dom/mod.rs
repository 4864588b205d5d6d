//! Host document capabilities and the in-memory document.
//!
//! The runtime never touches a document directly. It goes through the narrow
//! traits in [`host`], which [`Document`] implements for tests and the CLI. A
//! browser or webview binding implements the same traits.
mod document;
mod event;
mod host;

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

pub use document::{
    Document,
    ElementSnapshot,
    PageSnapshot,
};
pub use event::{
    DomEvent,
    HandlerId,
    LOCALE_CHANGE_EVENT,
    LocaleChangeEvent,
    ReadyState,
};
pub use host::{
    AttributeSink,
    DocumentHost,
    ElementQuery,
    EventSink,
    PageHost,
    SelectorHost,
    TextSink,
};

/// Handle to an element of a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Element {0} does not exist")]
    UnknownElement(ElementId),

    #[error("Element {0} is not a select control")]
    NotASelect(ElementId),

    #[error("Select {element} has no option '{value}'")]
    UnknownOption { element: ElementId, value: String },

    #[error("Invalid attribute name '{0}'")]
    InvalidAttributeName(String),

    #[error("Event '{event}' could not be dispatched: {reason}")]
    DispatchFailed { event: &'static str, reason: String },
}
