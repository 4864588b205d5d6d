//! Capability traits a host document provides.

use super::{
    DomError,
    DomEvent,
    ElementId,
    HandlerId,
    LocaleChangeEvent,
    ReadyState,
};

/// Element lookup under a root, in document order, root included.
pub trait ElementQuery {
    /// Elements carrying `attribute`, paired with its value.
    fn elements_with_attribute(&self, root: ElementId, attribute: &str) -> Vec<(ElementId, String)>;

    fn elements_with_class(&self, root: ElementId, class: &str) -> Vec<ElementId>;
}

pub trait TextSink {
    fn text_content(&self, element: ElementId) -> Option<String>;

    /// Replaces the element's content with a single text run.
    fn set_text_content(&mut self, element: ElementId, text: &str) -> Result<(), DomError>;
}

pub trait AttributeSink {
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str)
    -> Result<(), DomError>;
}

/// Locale picker controls.
pub trait SelectorHost {
    /// Every `select` in the document carrying `class`.
    fn selector_controls(&self, class: &str) -> Vec<ElementId>;

    /// Appends `(value, label)` options in order.
    fn append_options(&mut self, element: ElementId, options: &[(&str, &str)])
    -> Result<(), DomError>;

    fn selected_value(&self, element: ElementId) -> Option<String>;

    /// Programmatic selection. Must not fire change handlers.
    fn set_selected_value(&mut self, element: ElementId, value: &str) -> Result<(), DomError>;

    fn add_change_handler(&mut self, element: ElementId, handler: HandlerId)
    -> Result<(), DomError>;

    /// Returns whether a registration was removed.
    fn remove_change_handler(&mut self, element: ElementId, handler: HandlerId) -> bool;
}

pub trait EventSink {
    fn dispatch_locale_change(&mut self, event: &LocaleChangeEvent) -> Result<(), DomError>;
}

pub trait DocumentHost {
    /// Root of the whole document.
    fn document_element(&self) -> ElementId;

    fn ready_state(&self) -> ReadyState;

    /// Registers `handler` for the ready signal. Returns `false` when it is
    /// already registered.
    fn add_ready_listener(&mut self, handler: HandlerId) -> bool;

    /// Next queued event, if any.
    fn next_event(&mut self) -> Option<DomEvent>;

    /// Forces layout of `element`.
    fn request_reflow(&mut self, element: ElementId);
}

/// Everything the runtime needs from a document.
pub trait PageHost:
    ElementQuery + TextSink + AttributeSink + SelectorHost + EventSink + DocumentHost
{
}

impl<T> PageHost for T where
    T: ElementQuery + TextSink + AttributeSink + SelectorHost + EventSink + DocumentHost
{
}
