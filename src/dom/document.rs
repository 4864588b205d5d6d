//! In-memory document used by tests and the CLI host.

use std::collections::{
    BTreeMap,
    HashMap,
    VecDeque,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::{
    AttributeSink,
    DocumentHost,
    DomError,
    DomEvent,
    ElementId,
    ElementQuery,
    EventSink,
    HandlerId,
    LOCALE_CHANGE_EVENT,
    LocaleChangeEvent,
    ReadyState,
    SelectorHost,
    TextSink,
};
use crate::directive::is_valid_attribute_name;

/// One element slot in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    /// Tag name as given; compared case-insensitively.
    tag: String,
    attributes: BTreeMap<String, String>,
    /// Own text, excluding children.
    text: String,
    /// Explicit selection of a `select`. `None` means the first option.
    value: Option<String>,
    /// `None` for the root and for detached nodes.
    parent: Option<ElementId>,
    /// Child ids in document order.
    children: Vec<ElementId>,
}

impl Node {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: None,
            parent,
            children: Vec::new(),
        }
    }

    /// Whether this is a `select` control.
    fn is_select(&self) -> bool {
        self.tag.eq_ignore_ascii_case("select")
    }

    /// Whitespace-separated class list membership.
    fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|candidate| candidate == class))
    }
}

/// Element arena with a pending event queue.
///
/// Nodes detached by [`set_text_content`](TextSink::set_text_content) stay in
/// the arena but are no longer reachable from the root. Change handlers are kept
/// in attachment order; attaching the same id twice registers it twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PageSnapshot", into = "PageSnapshot")]
pub struct Document {
    /// Arena indexed by `ElementId`; slot 0 is the root.
    nodes: Vec<Node>,
    ready_state: ReadyState,
    /// Handlers fired once when loading finishes.
    ready_listeners: Vec<HandlerId>,
    change_handlers: HashMap<ElementId, Vec<HandlerId>>,
    /// Events waiting for the runtime to pump them.
    pending: VecDeque<DomEvent>,
    /// Every `language:change` delivered so far.
    notifications: Vec<LocaleChangeEvent>,
    /// When set, notification dispatch fails.
    reject_notifications: bool,
    /// Number of forced layout reads.
    reflows: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A ready document with an empty `html` root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(ReadyState::Complete)
    }

    /// A document that has not finished loading yet.
    #[must_use]
    pub fn loading() -> Self {
        Self::with_state(ReadyState::Loading)
    }

    /// A document holding only the root, in `ready_state`.
    fn with_state(ready_state: ReadyState) -> Self {
        Self {
            nodes: vec![Node::new("html", None)],
            ready_state,
            ready_listeners: Vec::new(),
            change_handlers: HashMap::new(),
            pending: VecDeque::new(),
            notifications: Vec::new(),
            reject_notifications: false,
            reflows: 0,
        }
    }

    #[must_use]
    pub const fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn append_element(&mut self, parent: ElementId, tag: &str) -> Result<ElementId, DomError> {
        self.node(parent)?;
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent)));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Appends an element with attributes and text in one step.
    pub fn append(
        &mut self,
        parent: ElementId,
        tag: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<ElementId, DomError> {
        let id = self.append_element(parent, tag)?;
        for (name, value) in attributes {
            self.set_attribute(id, name, value)?;
        }
        text.clone_into(&mut self.node_mut(id)?.text);
        Ok(id)
    }

    #[must_use]
    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(element.0).map(|node| node.tag.as_str())
    }

    /// `(value, label)` of each option of a select, in order.
    #[must_use]
    pub fn options(&self, element: ElementId) -> Vec<(String, String)> {
        let Ok(node) = self.node(element) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|child| self.nodes.get(child.0))
            .filter(|child| child.tag.eq_ignore_ascii_case("option"))
            .map(|option| {
                let value = option.attributes.get("value").cloned().unwrap_or_default();
                (value, option.text.clone())
            })
            .collect()
    }

    /// Simulates a user picking `value` in a select control.
    ///
    /// Queues one [`DomEvent::Change`] per attached handler.
    pub fn select_option(&mut self, element: ElementId, value: &str) -> Result<(), DomError> {
        if !self.node(element)?.is_select() {
            return Err(DomError::NotASelect(element));
        }
        if !self.options(element).iter().any(|(option, _)| option == value) {
            return Err(DomError::UnknownOption { element, value: value.to_string() });
        }

        self.node_mut(element)?.value = Some(value.to_string());
        if let Some(handlers) = self.change_handlers.get(&element) {
            self.pending.extend(
                handlers.iter().map(|&handler| DomEvent::Change { target: element, handler }),
            );
        }
        Ok(())
    }

    /// Moves out of the loading state and queues the ready signal once for
    /// each registered listener. Returns the number of events queued.
    pub fn finish_loading(&mut self) -> usize {
        if !self.ready_state.is_loading() {
            return 0;
        }
        self.ready_state = ReadyState::Interactive;
        let listeners = std::mem::take(&mut self.ready_listeners);
        let count = listeners.len();
        self.pending.extend(listeners.into_iter().map(|handler| DomEvent::Ready { handler }));
        count
    }

    #[must_use]
    pub fn change_handler_count(&self, element: ElementId) -> usize {
        self.change_handlers.get(&element).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Locale change notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> &[LocaleChangeEvent] {
        &self.notifications
    }

    /// Makes every following notification dispatch fail.
    pub const fn reject_notifications(&mut self, reject: bool) {
        self.reject_notifications = reject;
    }

    #[must_use]
    pub const fn reflow_count(&self) -> usize {
        self.reflows
    }

    #[must_use]
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot { ready_state: self.ready_state, root: self.snapshot_element(self.root()) }
    }

    /// Serializable copy of the subtree at `element`.
    fn snapshot_element(&self, element: ElementId) -> ElementSnapshot {
        let Ok(node) = self.node(element) else {
            return ElementSnapshot::default();
        };
        ElementSnapshot {
            tag: node.tag.clone(),
            attributes: node.attributes.clone(),
            text: node.text.clone(),
            value: node.value.clone(),
            children: node.children.iter().map(|&child| self.snapshot_element(child)).collect(),
        }
    }

    /// Appends `snapshot` as a new child of `parent`.
    fn attach_snapshot(&mut self, parent: ElementId, snapshot: ElementSnapshot) {
        let Ok(id) = self.append_element(parent, &snapshot.tag) else {
            return;
        };
        self.fill_from_snapshot(id, snapshot);
    }

    /// Copies `snapshot` into the existing node `id`, then its children.
    fn fill_from_snapshot(&mut self, id: ElementId, snapshot: ElementSnapshot) {
        if let Ok(node) = self.node_mut(id) {
            node.tag = snapshot.tag;
            node.attributes = snapshot.attributes;
            node.text = snapshot.text;
            node.value = snapshot.value;
        }
        for child in snapshot.children {
            self.attach_snapshot(id, child);
        }
    }

    /// Pre-order walk from `root`, root included.
    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut order = Vec::new();
        if self.node(root).is_err() {
            return order;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id.0) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Concatenated text of `element` and its descendants.
    fn collect_text(&self, element: ElementId, out: &mut String) {
        if let Some(node) = self.nodes.get(element.0) {
            out.push_str(&node.text);
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Looks up a node by id.
    fn node(&self, element: ElementId) -> Result<&Node, DomError> {
        self.nodes.get(element.0).ok_or(DomError::UnknownElement(element))
    }

    /// Mutable lookup by id.
    fn node_mut(&mut self, element: ElementId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(element.0).ok_or(DomError::UnknownElement(element))
    }

    /// Looks up a node that must be a `select`.
    fn select_node(&self, element: ElementId) -> Result<&Node, DomError> {
        let node = self.node(element)?;
        if node.is_select() { Ok(node) } else { Err(DomError::NotASelect(element)) }
    }
}

impl ElementQuery for Document {
    fn elements_with_attribute(&self, root: ElementId, attribute: &str) -> Vec<(ElementId, String)> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| {
                let value = self.nodes.get(id.0)?.attributes.get(attribute)?;
                Some((id, value.clone()))
            })
            .collect()
    }

    fn elements_with_class(&self, root: ElementId, class: &str) -> Vec<ElementId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.nodes.get(id.0).is_some_and(|node| node.has_class(class)))
            .collect()
    }
}

impl TextSink for Document {
    fn text_content(&self, element: ElementId) -> Option<String> {
        self.node(element).ok()?;
        let mut text = String::new();
        self.collect_text(element, &mut text);
        Some(text)
    }

    fn set_text_content(&mut self, element: ElementId, text: &str) -> Result<(), DomError> {
        let children = std::mem::take(&mut self.node_mut(element)?.children);
        for child in children {
            if let Ok(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
        text.clone_into(&mut self.node_mut(element)?.text);
        Ok(())
    }
}

impl AttributeSink for Document {
    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.nodes.get(element.0)?.attributes.get(name).cloned()
    }

    fn set_attribute(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidAttributeName(name.to_string()));
        }
        self.node_mut(element)?.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl SelectorHost for Document {
    fn selector_controls(&self, class: &str) -> Vec<ElementId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| {
                self.nodes.get(id.0).is_some_and(|node| node.is_select() && node.has_class(class))
            })
            .collect()
    }

    fn append_options(
        &mut self,
        element: ElementId,
        options: &[(&str, &str)],
    ) -> Result<(), DomError> {
        self.select_node(element)?;
        for (value, label) in options {
            self.append(element, "option", &[("value", value)], label)?;
        }
        Ok(())
    }

    fn selected_value(&self, element: ElementId) -> Option<String> {
        let node = self.select_node(element).ok()?;
        node.value.clone().or_else(|| self.options(element).into_iter().next().map(|(v, _)| v))
    }

    fn set_selected_value(&mut self, element: ElementId, value: &str) -> Result<(), DomError> {
        self.select_node(element)?;
        let known = self.options(element).iter().any(|(option, _)| option == value);
        if !known {
            tracing::trace!(%element, value, "No matching option; clearing selection");
        }
        self.node_mut(element)?.value = Some(if known { value.to_string() } else { String::new() });
        Ok(())
    }

    fn add_change_handler(
        &mut self,
        element: ElementId,
        handler: HandlerId,
    ) -> Result<(), DomError> {
        self.node(element)?;
        self.change_handlers.entry(element).or_default().push(handler);
        Ok(())
    }

    fn remove_change_handler(&mut self, element: ElementId, handler: HandlerId) -> bool {
        let Some(handlers) = self.change_handlers.get_mut(&element) else {
            return false;
        };
        let Some(position) = handlers.iter().position(|&attached| attached == handler) else {
            return false;
        };
        handlers.remove(position);
        true
    }
}

impl EventSink for Document {
    fn dispatch_locale_change(&mut self, event: &LocaleChangeEvent) -> Result<(), DomError> {
        if self.reject_notifications {
            return Err(DomError::DispatchFailed {
                event: LOCALE_CHANGE_EVENT,
                reason: "listener rejected the event".to_string(),
            });
        }
        self.notifications.push(event.clone());
        Ok(())
    }
}

impl DocumentHost for Document {
    fn document_element(&self) -> ElementId {
        self.root()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn add_ready_listener(&mut self, handler: HandlerId) -> bool {
        if self.ready_listeners.contains(&handler) {
            return false;
        }
        self.ready_listeners.push(handler);
        true
    }

    fn next_event(&mut self) -> Option<DomEvent> {
        self.pending.pop_front()
    }

    fn request_reflow(&mut self, element: ElementId) {
        if self.node(element).is_ok() {
            self.reflows += 1;
        }
    }
}

/// Serializable form of a [`Document`]: ready state plus the element tree.
///
/// Handlers, pending events and notifications are not part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub ready_state: ReadyState,
    pub root: ElementSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSnapshot>,
}

impl From<PageSnapshot> for Document {
    fn from(snapshot: PageSnapshot) -> Self {
        let mut document = Self::with_state(snapshot.ready_state);
        let root = document.root();
        document.fill_from_snapshot(root, snapshot.root);
        document
    }
}

impl From<Document> for PageSnapshot {
    fn from(document: Document) -> Self {
        document.snapshot()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[fixture]
    fn page() -> (Document, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.append_element(doc.root(), "body").unwrap();
        let heading = doc.append(body, "h1", &[("data-i18n", "nav.home")], "Home").unwrap();
        let select = doc.append(body, "select", &[("class", "lang-select big")], "").unwrap();
        (doc, heading, select)
    }

    #[rstest]
    fn query_by_attribute_in_document_order(page: (Document, ElementId, ElementId)) {
        let (mut doc, heading, _) = page;
        let body = doc.append_element(doc.root(), "footer").unwrap();
        let para = doc.append(body, "p", &[("data-i18n", "footer.rights")], "").unwrap();

        let found = doc.elements_with_attribute(doc.root(), "data-i18n");

        assert_eq!(
            found,
            vec![(heading, "nav.home".to_string()), (para, "footer.rights".to_string())]
        );
    }

    #[rstest]
    fn query_is_scoped_to_root(page: (Document, ElementId, ElementId)) {
        let (doc, heading, _) = page;

        assert_eq!(doc.elements_with_attribute(heading, "data-i18n").len(), 1);
        assert!(doc.elements_with_attribute(heading, "class").is_empty());
    }

    #[rstest]
    fn class_match_is_token_based(page: (Document, ElementId, ElementId)) {
        let (doc, _, select) = page;

        assert_eq!(doc.elements_with_class(doc.root(), "big"), vec![select]);
        assert!(doc.elements_with_class(doc.root(), "lang").is_empty());
        assert_eq!(doc.selector_controls("lang-select"), vec![select]);
    }

    #[rstest]
    fn set_text_content_replaces_children(page: (Document, ElementId, ElementId)) {
        let (mut doc, heading, _) = page;
        let inner = doc.append(heading, "span", &[("data-i18n", "inner")], "!").unwrap();
        assert_eq!(doc.text_content(heading).as_deref(), Some("Home!"));

        doc.set_text_content(heading, "Casa").unwrap();

        assert_eq!(doc.text_content(heading).as_deref(), Some("Casa"));
        assert!(!doc.elements_with_attribute(doc.root(), "data-i18n").iter().any(|(id, _)| *id == inner));
    }

    #[rstest]
    #[case::empty("")]
    #[case::space("aria label")]
    #[case::equals("a=b")]
    fn invalid_attribute_names_are_refused(
        page: (Document, ElementId, ElementId),
        #[case] name: &str,
    ) {
        let (mut doc, heading, _) = page;

        assert_that!(
            doc.set_attribute(heading, name, "x"),
            err(eq(&DomError::InvalidAttributeName(name.to_string())))
        );
    }

    #[rstest]
    fn select_defaults_to_first_option(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        assert!(doc.selected_value(select).is_none());

        doc.append_options(select, &[("it", "Italiano"), ("en", "English")]).unwrap();

        assert_eq!(doc.selected_value(select).as_deref(), Some("it"));
        assert_eq!(doc.options(select).len(), 2);
    }

    #[rstest]
    fn silent_selection_queues_nothing(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        doc.append_options(select, &[("it", "Italiano"), ("en", "English")]).unwrap();
        doc.add_change_handler(select, HandlerId::LOCALE_SELECT).unwrap();

        doc.set_selected_value(select, "en").unwrap();

        assert_eq!(doc.selected_value(select).as_deref(), Some("en"));
        assert_eq!(doc.pending_events(), 0);
    }

    #[rstest]
    fn silent_selection_of_unknown_value_clears(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        doc.append_options(select, &[("it", "Italiano")]).unwrap();

        doc.set_selected_value(select, "xx").unwrap();

        assert_eq!(doc.selected_value(select).as_deref(), Some(""));
    }

    #[rstest]
    fn user_selection_queues_one_event_per_handler(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        doc.append_options(select, &[("it", "Italiano"), ("en", "English")]).unwrap();
        doc.add_change_handler(select, HandlerId::LOCALE_SELECT).unwrap();
        doc.add_change_handler(select, HandlerId::LOCALE_SELECT).unwrap();

        doc.select_option(select, "en").unwrap();

        assert_eq!(doc.pending_events(), 2);
        assert_eq!(
            doc.next_event(),
            Some(DomEvent::Change { target: select, handler: HandlerId::LOCALE_SELECT })
        );
    }

    #[rstest]
    fn user_selection_requires_existing_option(page: (Document, ElementId, ElementId)) {
        let (mut doc, heading, select) = page;

        assert!(matches!(doc.select_option(select, "en"), Err(DomError::UnknownOption { .. })));
        assert_eq!(doc.select_option(heading, "en"), Err(DomError::NotASelect(heading)));
    }

    #[rstest]
    fn remove_change_handler_removes_one(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        doc.add_change_handler(select, HandlerId::LOCALE_SELECT).unwrap();

        assert!(doc.remove_change_handler(select, HandlerId::LOCALE_SELECT));
        assert!(!doc.remove_change_handler(select, HandlerId::LOCALE_SELECT));
        assert_eq!(doc.change_handler_count(select), 0);
    }

    #[googletest::test]
    fn ready_listeners_fire_once() {
        let mut doc = Document::loading();
        expect_that!(doc.add_ready_listener(HandlerId::RUNTIME_INIT), eq(true));
        expect_that!(doc.add_ready_listener(HandlerId::RUNTIME_INIT), eq(false));

        expect_that!(doc.finish_loading(), eq(1));
        expect_that!(doc.finish_loading(), eq(0));
        expect_that!(doc.ready_state(), eq(ReadyState::Interactive));
        expect_that!(doc.next_event(), some(eq(DomEvent::Ready { handler: HandlerId::RUNTIME_INIT })));
        expect_that!(doc.next_event(), none());
    }

    #[googletest::test]
    fn rejected_notifications_are_not_recorded() {
        let mut doc = Document::new();
        let event = LocaleChangeEvent { lang: "en".into() };

        doc.reject_notifications(true);
        expect_that!(doc.dispatch_locale_change(&event), err(anything()));
        doc.reject_notifications(false);
        expect_that!(doc.dispatch_locale_change(&event), ok(anything()));

        expect_that!(doc.notifications().len(), eq(1));
    }

    #[rstest]
    fn snapshot_json_roundtrip(page: (Document, ElementId, ElementId)) {
        let (mut doc, _, select) = page;
        doc.append_options(select, &[("it", "Italiano"), ("en", "English")]).unwrap();
        doc.set_selected_value(select, "en").unwrap();

        let json = serde_json::to_string(&doc).unwrap();
        let restored: Document = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.snapshot(), doc.snapshot());
        assert_eq!(restored.selector_controls("lang-select").len(), 1);
    }

    #[googletest::test]
    fn snapshot_parses_minimal_page() {
        let json = r#"{
            "readyState": "loading",
            "root": {
                "tag": "html",
                "children": [
                    { "tag": "p", "attributes": { "data-i18n": "nav.home" }, "text": "Home" }
                ]
            }
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();

        expect_that!(doc.ready_state(), eq(ReadyState::Loading));
        expect_that!(doc.elements_with_attribute(doc.root(), "data-i18n").len(), eq(1));
    }
}
