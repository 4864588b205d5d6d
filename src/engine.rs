//! Rewrites directive-bound elements for the active locale.

use std::fmt;

use crate::config::DirectiveAttributes;
use crate::directive::{
    DirectiveBinding,
    parse_attribute_directive,
    parse_text_directive,
};
use crate::dom::{
    AttributeSink,
    ElementId,
    ElementQuery,
    LocaleChangeEvent,
    PageHost,
    TextSink,
};
use crate::locale::LocaleCode;
use crate::registry::TranslationRegistry;

/// Runs after every translation pass that had a locale to apply.
pub trait PostApplyHook: fmt::Debug {
    fn after_apply(&mut self, host: &mut dyn PageHost, locale: &LocaleCode);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl PostApplyHook for NoopHook {
    fn after_apply(&mut self, _host: &mut dyn PageHost, _locale: &LocaleCode) {}
}

/// Toggles a compositing transform on card elements and forces a reflow so
/// stale layers are repainted with the new text.
#[derive(Debug, Clone)]
pub struct RepaintCards {
    /// Class of the elements to nudge.
    class: String,
}

impl Default for RepaintCards {
    fn default() -> Self {
        Self::new("hero-card")
    }
}

impl RepaintCards {
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into() }
    }
}

impl PostApplyHook for RepaintCards {
    fn after_apply(&mut self, host: &mut dyn PageHost, _locale: &LocaleCode) {
        let root = host.document_element();
        for card in host.elements_with_class(root, &self.class) {
            let original = host.attribute(card, "style").unwrap_or_default();
            let nudged = if original.is_empty() {
                "transform: translateZ(0)".to_string()
            } else {
                format!("{original}; transform: translateZ(0)")
            };

            if let Err(err) = host.set_attribute(card, "style", &nudged) {
                tracing::debug!(%card, %err, "Repaint nudge skipped");
                continue;
            }
            host.request_reflow(card);
            if let Err(err) = host.set_attribute(card, "style", &original) {
                tracing::debug!(%card, %err, "Failed to restore card style");
            }
        }
    }
}

/// Outcome of one translation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub texts_updated: usize,
    pub attributes_updated: usize,
    /// Bindings whose `(key, locale)` had no text.
    pub missing: usize,
    /// Attribute directive pairs that could not be parsed.
    pub malformed: usize,
    pub notified: bool,
}

impl ApplyReport {
    #[must_use]
    pub const fn updated(&self) -> usize {
        self.texts_updated + self.attributes_updated
    }
}

/// Applies registry texts to the elements a document binds through directives.
#[derive(Debug)]
pub struct ApplyEngine {
    registry: TranslationRegistry,
    /// Attribute names the directives are read from.
    directives: DirectiveAttributes,
    /// Runs after every pass that applied a locale.
    hook: Box<dyn PostApplyHook>,
}

impl ApplyEngine {
    #[must_use]
    pub fn new(registry: TranslationRegistry, directives: DirectiveAttributes) -> Self {
        Self { registry, directives, hook: Box::new(NoopHook) }
    }

    #[must_use]
    pub fn with_hook(mut self, hook: impl PostApplyHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    pub fn set_hook(&mut self, hook: Box<dyn PostApplyHook>) {
        self.hook = hook;
    }

    #[must_use]
    pub const fn registry(&self) -> &TranslationRegistry {
        &self.registry
    }

    /// Translates everything under `root`, then notifies listeners and runs the
    /// post-apply hook.
    ///
    /// Without a locale nothing is touched and no notification is sent.
    pub fn apply<H: PageHost>(
        &mut self,
        host: &mut H,
        root: ElementId,
        locale: Option<&LocaleCode>,
    ) -> ApplyReport {
        let Some(locale) = locale else {
            tracing::trace!(%root, "No active locale; leaving document untouched");
            return ApplyReport::default();
        };

        let mut report = self.translate(host, root, locale);

        let event = LocaleChangeEvent { lang: locale.clone() };
        match host.dispatch_locale_change(&event) {
            Ok(()) => report.notified = true,
            Err(err) => tracing::debug!(%err, "Locale change notification failed"),
        }

        self.hook.after_apply(host, locale);

        tracing::debug!(
            %locale,
            texts = report.texts_updated,
            attributes = report.attributes_updated,
            missing = report.missing,
            malformed = report.malformed,
            "Translations applied"
        );
        report
    }

    /// Rewrites text and attribute bindings without notifying anyone.
    pub fn translate<H>(&self, host: &mut H, root: ElementId, locale: &LocaleCode) -> ApplyReport
    where
        H: ElementQuery + TextSink + AttributeSink + ?Sized,
    {
        let mut report = ApplyReport::default();

        let text_elements = host.elements_with_attribute(root, &self.directives.text);
        let attribute_elements = host.elements_with_attribute(root, &self.directives.attributes);

        let bindings = text_elements
            .iter()
            .filter_map(|(element, value)| {
                parse_text_directive(value).map(|key| (*element, DirectiveBinding::Text(key)))
            })
            .chain(attribute_elements.iter().map(|(element, value)| {
                (*element, DirectiveBinding::Attributes(parse_attribute_directive(value)))
            }));

        for (element, binding) in bindings {
            match binding {
                DirectiveBinding::Text(key) => {
                    self.apply_text(host, element, key, locale, &mut report);
                }
                DirectiveBinding::Attributes(directive) => {
                    report.malformed += directive.malformed;
                    for pair in directive.bindings {
                        self.apply_attribute(
                            host,
                            element,
                            pair.attribute,
                            pair.key,
                            locale,
                            &mut report,
                        );
                    }
                }
            }
        }

        report
    }

    /// Sets one element's text unless it already matches.
    fn apply_text<H>(
        &self,
        host: &mut H,
        element: ElementId,
        key: &str,
        locale: &LocaleCode,
        report: &mut ApplyReport,
    ) where
        H: TextSink + ?Sized,
    {
        let Some(text) = self.registry.lookup(key, locale.as_str()) else {
            tracing::debug!(%element, key, %locale, "Missing translation");
            report.missing += 1;
            return;
        };
        if host.text_content(element).as_deref() == Some(text) {
            return;
        }
        match host.set_text_content(element, text) {
            Ok(()) => report.texts_updated += 1,
            Err(err) => tracing::warn!(%element, key, %err, "Failed to set text"),
        }
    }

    /// Sets one attribute unless it already matches.
    fn apply_attribute<H>(
        &self,
        host: &mut H,
        element: ElementId,
        attribute: &str,
        key: &str,
        locale: &LocaleCode,
        report: &mut ApplyReport,
    ) where
        H: AttributeSink + ?Sized,
    {
        let Some(text) = self.registry.lookup(key, locale.as_str()) else {
            tracing::debug!(%element, attribute, key, %locale, "Missing translation");
            report.missing += 1;
            return;
        };
        if host.attribute(element, attribute).as_deref() == Some(text) {
            return;
        }
        match host.set_attribute(element, attribute, text) {
            Ok(()) => report.attributes_updated += 1,
            Err(err) => tracing::warn!(%element, attribute, %err, "Failed to set attribute"),
        }
    }
}
