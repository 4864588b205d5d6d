//! Keeps every locale picker in the document populated, bound and in sync.

use crate::dom::{
    AttributeSink,
    ElementId,
    HandlerId,
    SelectorHost,
};
use crate::locale::{
    LocaleCode,
    SupportedLocales,
};

/// Marker attribute set on a control once its options are appended.
pub const POPULATED_ATTRIBUTE: &str = "data-populated";

#[derive(Debug, Clone)]
pub struct SelectorSynchronizer {
    class: String,
    locales: SupportedLocales,
}

impl SelectorSynchronizer {
    #[must_use]
    pub fn new(class: impl Into<String>, locales: SupportedLocales) -> Self {
        Self { class: class.into(), locales }
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Current selector controls, in document order.
    #[must_use]
    pub fn controls<H: SelectorHost + ?Sized>(&self, host: &H) -> Vec<ElementId> {
        host.selector_controls(&self.class)
    }

    /// Appends one option per supported locale to each control that has not
    /// been populated yet. Returns the number of controls populated.
    pub fn populate<H>(&self, host: &mut H, controls: &[ElementId]) -> usize
    where
        H: SelectorHost + AttributeSink + ?Sized,
    {
        let options: Vec<(&str, &str)> =
            self.locales.iter().map(|locale| (locale.code.as_str(), locale.label.as_str())).collect();
        let mut populated = 0;

        for &control in controls {
            if host.attribute(control, POPULATED_ATTRIBUTE).as_deref() == Some("true") {
                continue;
            }
            if let Err(err) = host.append_options(control, &options) {
                tracing::warn!(%control, %err, "Failed to populate locale selector");
                continue;
            }
            if let Err(err) = host.set_attribute(control, POPULATED_ATTRIBUTE, "true") {
                tracing::warn!(%control, %err, "Failed to mark locale selector as populated");
            }
            populated += 1;
        }

        populated
    }

    /// Attaches exactly one change handler per control.
    pub fn bind_change_handlers<H>(&self, host: &mut H, controls: &[ElementId])
    where
        H: SelectorHost + ?Sized,
    {
        for &control in controls {
            host.remove_change_handler(control, HandlerId::LOCALE_SELECT);
            if let Err(err) = host.add_change_handler(control, HandlerId::LOCALE_SELECT) {
                tracing::warn!(%control, %err, "Failed to bind locale selector");
            }
        }
    }

    /// Shows `locale` in every control without firing change handlers.
    pub fn sync_all<H>(&self, host: &mut H, locale: &LocaleCode)
    where
        H: SelectorHost + ?Sized,
    {
        for control in self.controls(host) {
            if let Err(err) = host.set_selected_value(control, locale.as_str()) {
                tracing::warn!(%control, %err, "Failed to sync locale selector");
            }
        }
    }

    /// Populates, syncs when a locale is active, then binds.
    pub fn wire<H>(&self, host: &mut H, current: Option<&LocaleCode>)
    where
        H: SelectorHost + AttributeSink + ?Sized,
    {
        let controls = self.controls(host);
        let populated = self.populate(host, &controls);
        if let Some(locale) = current {
            self.sync_all(host, locale);
        }
        self.bind_change_handlers(host, &controls);
        tracing::debug!(controls = controls.len(), populated, "Locale selectors wired");
    }
}
