//! Public facade tying the preference store, the engine and the selectors
//! together.

use std::time::Duration;

use crate::config::RuntimeSettings;
use crate::dom::{
    DomEvent,
    ElementId,
    HandlerId,
    PageHost,
};
use crate::engine::{
    ApplyEngine,
    ApplyReport,
    PostApplyHook,
};
use crate::locale::{
    LocaleCode,
    SupportedLocales,
};
use crate::registry::TranslationRegistry;
use crate::selector::SelectorSynchronizer;
use crate::store::{
    Clock,
    PreferenceStore,
    Storage,
    WriteOutcome,
};

/// Result of [`LocaleRuntime::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// The document is still loading; initialization runs on the ready signal.
    Deferred,
    Initialized(ApplyReport),
}

/// Page-level locale runtime.
///
/// Owns the persisted preference and drives every selector control and
/// directive-bound element of the host document it is handed.
#[derive(Debug)]
pub struct LocaleRuntime<S, C> {
    settings: RuntimeSettings,
    store: PreferenceStore<S, C>,
    engine: ApplyEngine,
    /// Locale pickers matching the configured class.
    selectors: SelectorSynchronizer,
}

impl<S: Storage, C: Clock> LocaleRuntime<S, C> {
    #[must_use]
    pub fn new(settings: RuntimeSettings, registry: TranslationRegistry, storage: S, clock: C) -> Self {
        let store = PreferenceStore::new(storage, clock, &settings);
        let engine = ApplyEngine::new(registry, settings.directives.clone());
        let selectors = SelectorSynchronizer::new(
            settings.selector_class.clone(),
            settings.supported_locales.clone(),
        );
        Self { settings, store, engine, selectors }
    }

    #[must_use]
    pub fn with_post_apply_hook(mut self, hook: impl PostApplyHook + 'static) -> Self {
        self.engine.set_hook(Box::new(hook));
        self
    }

    /// Wires selectors and translates the document, or defers until the
    /// document is ready. Safe to call repeatedly.
    pub fn init<H: PageHost>(&mut self, host: &mut H) -> InitStatus {
        if host.ready_state().is_loading() {
            if host.add_ready_listener(HandlerId::RUNTIME_INIT) {
                tracing::debug!("Document still loading; deferring initialization");
            }
            return InitStatus::Deferred;
        }
        InitStatus::Initialized(self.run_init(host))
    }

    /// Wires the selectors, then applies the stored locale.
    fn run_init<H: PageHost>(&mut self, host: &mut H) -> ApplyReport {
        let current = self.store.read();
        self.selectors.wire(host, current.as_ref());
        let report = self.apply_document(host);
        tracing::info!(
            locale = current.as_ref().map_or("<none>", LocaleCode::as_str),
            updated = report.updated(),
            "Locale runtime initialized"
        );
        report
    }

    /// Persists `locale` and re-translates the whole document.
    ///
    /// The document is re-translated with whatever preference is active even
    /// when the write is rejected.
    pub fn set_locale<H: PageHost>(
        &mut self,
        host: &mut H,
        locale: &str,
        ttl: Option<Duration>,
    ) -> WriteOutcome {
        let outcome = self.write_and_sync(host, locale, ttl);
        self.apply_document(host);
        outcome
    }

    /// Active locale, if a fresh valid preference exists.
    pub fn get_locale(&mut self) -> Option<LocaleCode> {
        self.store.read()
    }

    #[must_use]
    pub const fn supported_locales(&self) -> &SupportedLocales {
        &self.settings.supported_locales
    }

    /// Translates the subtree at `root` for the active locale.
    pub fn apply<H: PageHost>(&mut self, host: &mut H, root: ElementId) -> ApplyReport {
        let current = self.store.read();
        self.engine.apply(host, root, current.as_ref())
    }

    /// Delivers one host event.
    pub fn handle_event<H: PageHost>(&mut self, host: &mut H, event: DomEvent) {
        match event {
            DomEvent::Ready { handler: HandlerId::RUNTIME_INIT } => {
                self.run_init(host);
            }
            DomEvent::Change { target, handler: HandlerId::LOCALE_SELECT } => {
                self.on_selector_change(host, target);
            }
            other => tracing::trace!(?other, "Ignoring event for unknown handler"),
        }
    }

    /// Drains the host's event queue. Returns the number of events handled.
    pub fn pump<H: PageHost>(&mut self, host: &mut H) -> usize {
        let mut handled = 0;
        while let Some(event) = host.next_event() {
            self.handle_event(host, event);
            handled += 1;
        }
        handled
    }

    /// A user picked a locale in `target`; an empty value means the default.
    fn on_selector_change<H: PageHost>(&mut self, host: &mut H, target: ElementId) {
        let value = host.selected_value(target).filter(|value| !value.is_empty());
        let locale = value.unwrap_or_else(|| self.settings.default_locale.as_str().to_string());
        tracing::debug!(%target, locale = %locale, "Locale selector changed");

        self.write_and_sync(host, &locale, None);
        self.apply_document(host);
    }

    /// Persists `locale`; only a stored locale is shown in the selectors.
    fn write_and_sync<H: PageHost>(
        &mut self,
        host: &mut H,
        locale: &str,
        ttl: Option<Duration>,
    ) -> WriteOutcome {
        let outcome = self.store.write(locale, ttl);
        if let Some(stored) = outcome.locale() {
            self.selectors.sync_all(host, stored);
        }
        outcome
    }

    /// Applies the active locale to the whole document.
    fn apply_document<H: PageHost>(&mut self, host: &mut H) -> ApplyReport {
        let root = host.document_element();
        self.apply(host, root)
    }

    #[must_use]
    pub const fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    #[must_use]
    pub const fn registry(&self) -> &TranslationRegistry {
        self.engine.registry()
    }

    #[must_use]
    pub const fn store(&self) -> &PreferenceStore<S, C> {
        &self.store
    }

    /// Gives back the storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.store.into_storage()
    }
}
