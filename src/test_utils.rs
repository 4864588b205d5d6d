//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパーを提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use crate::dom::{
    AttributeSink,
    Document,
    DomError,
    ElementId,
    ElementQuery,
    TextSink,
};
use crate::registry::TranslationRegistry;

/// テスト用の辞書を作成する
///
/// `footer.rights` には `hi` の訳がない。
pub(crate) fn sample_registry() -> TranslationRegistry {
    TranslationRegistry::from_iter([
        ("nav.home", "it", "Home"),
        ("nav.home", "en", "Home"),
        ("nav.home", "pa", "ਮੁੱਖ ਸਫ਼ਾ"),
        ("nav.home", "hi", "मुख्य पृष्ठ"),
        ("nav.home", "hi-Latn", "Home"),
        ("nav.call", "it", "Chiama"),
        ("nav.call", "en", "Call"),
        ("drawer.close", "it", "Chiudi menu"),
        ("drawer.close", "en", "Close menu"),
        ("drawer.close", "pa", "ਮੀਨੂ ਬੰਦ ਕਰੋ"),
        ("drawer.close", "hi", "मेनू बंद करें"),
        ("drawer.close", "hi-Latn", "Menu band karo"),
        ("footer.rights", "it", "Tutti i diritti riservati."),
        ("footer.rights", "en", "All rights reserved."),
    ])
}

/// `sample_page` が作る要素
#[derive(Debug, Clone, Copy)]
pub(crate) struct SamplePage {
    pub heading: ElementId,
    pub menu_button: ElementId,
    pub selector_a: ElementId,
    pub selector_b: ElementId,
}

/// 見出し、ボタン、言語セレクター 2 つを持つページ
pub(crate) fn sample_page() -> (Document, SamplePage) {
    build_sample_page(Document::new())
}

pub(crate) fn build_sample_page(mut doc: Document) -> (Document, SamplePage) {
    let body = doc.append_element(doc.root(), "body").unwrap();
    let heading = doc.append(body, "h1", &[("data-i18n", "nav.home")], "Home").unwrap();
    let menu_button = doc
        .append(
            body,
            "button",
            &[("data-i18n-attr", "aria-label:drawer.close"), ("aria-label", "Menu")],
            "",
        )
        .unwrap();
    let selector_a = doc.append(body, "select", &[("class", "lang-select")], "").unwrap();
    let selector_b = doc.append(body, "select", &[("class", "lang-select")], "").unwrap();

    (doc, SamplePage { heading, menu_button, selector_a, selector_b })
}

#[derive(Debug, Default)]
struct FakeElement {
    attributes: BTreeMap<String, String>,
    text: String,
}

/// 書き込みを記録するだけのフラットな DOM
///
/// ルートは無視され、すべての要素が対象になる。
#[derive(Debug, Default)]
pub(crate) struct FakeSink {
    elements: Vec<FakeElement>,
    writes: Vec<String>,
}

impl FakeSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn element(&mut self, attributes: &[(&str, &str)], text: &str) -> ElementId {
        self.elements.push(FakeElement {
            attributes: attributes
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            text: text.to_string(),
        });
        ElementId(self.elements.len() - 1)
    }

    pub(crate) fn text(&self, element: ElementId) -> &str {
        self.elements.get(element.0).map_or("", |element| element.text.as_str())
    }

    pub(crate) fn attr(&self, element: ElementId, name: &str) -> Option<String> {
        self.attribute(element, name)
    }

    pub(crate) fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl ElementQuery for FakeSink {
    fn elements_with_attribute(&self, _root: ElementId, attribute: &str) -> Vec<(ElementId, String)> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                element.attributes.get(attribute).map(|value| (ElementId(index), value.clone()))
            })
            .collect()
    }

    fn elements_with_class(&self, _root: ElementId, _class: &str) -> Vec<ElementId> {
        Vec::new()
    }
}

impl TextSink for FakeSink {
    fn text_content(&self, element: ElementId) -> Option<String> {
        self.elements.get(element.0).map(|element| element.text.clone())
    }

    fn set_text_content(&mut self, element: ElementId, text: &str) -> Result<(), DomError> {
        let target =
            self.elements.get_mut(element.0).ok_or(DomError::UnknownElement(element))?;
        target.text = text.to_string();
        self.writes.push(format!("{element} text={text}"));
        Ok(())
    }
}

impl AttributeSink for FakeSink {
    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements.get(element.0)?.attributes.get(name).cloned()
    }

    fn set_attribute(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let target =
            self.elements.get_mut(element.0).ok_or(DomError::UnknownElement(element))?;
        target.attributes.insert(name.to_string(), value.to_string());
        self.writes.push(format!("{element} {name}={value}"));
        Ok(())
    }
}
