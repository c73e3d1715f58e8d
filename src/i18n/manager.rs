//! Language toggle: persists the visitor's language and rewrites the page.

use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Query};
use crate::i18n::{Language, LanguageRegistry};
use crate::storage::PreferenceStore;
use tracing::debug;

const TOGGLE_ID: &str = "lang-toggle";
const OPTION_CLASS: &str = "lang-option";
const OPTION_LANG_ATTRIBUTE: &str = "data-lang";
const ACTIVE_CLASS: &str = "active";

/// Owns the current page language and the toggle controls.
#[derive(Debug, Clone)]
pub struct LanguageManager {
    current: Language,
    storage_key: String,
    options: Vec<ElementId>,
}

impl LanguageManager {
    /// Restore the stored preference, capture the toggle options and render.
    ///
    /// A missing, unreadable or unsupported stored value leaves the default
    /// language in place.
    pub fn init(
        doc: &mut dyn Document,
        store: &dyn PreferenceStore,
        config: &SiteConfig,
    ) -> Self {
        let current = match store.get(&config.storage_key) {
            Ok(Some(saved)) => Language::from_code(&saved).unwrap_or_else(|e| {
                debug!("Ignoring stored language preference: {}", e);
                Language::default_language()
            }),
            Ok(None) => Language::default_language(),
            Err(e) => {
                debug!("Language preference unreadable: {}", e);
                Language::default_language()
            }
        };

        let options = match doc.element_by_id(TOGGLE_ID) {
            Some(toggle) => doc.query_within(toggle, &Query::Class(OPTION_CLASS)),
            None => {
                debug!("No #{} on page, language toggle disabled", TOGGLE_ID);
                Vec::new()
            }
        };

        let manager = Self {
            current,
            storage_key: config.storage_key.clone(),
            options,
        };
        manager.apply_language(doc, current);
        manager
    }

    pub fn current(&self) -> Language {
        self.current
    }

    /// Toggle options captured at init.
    pub fn options(&self) -> &[ElementId] {
        &self.options
    }

    /// Switch to `lang`, persist it and re-render.
    ///
    /// Returns `false` without touching storage or the page when `lang` is
    /// already current.
    pub fn set_language(
        &mut self,
        doc: &mut dyn Document,
        store: &mut dyn PreferenceStore,
        lang: Language,
    ) -> bool {
        if lang == self.current {
            return false;
        }

        self.current = lang;
        debug!("Switching page language to {}", lang.name());
        if let Err(e) = store.set(&self.storage_key, lang.code()) {
            debug!("Language preference not persisted: {}", e);
        }
        self.apply_language(doc, lang);
        true
    }

    /// Render `lang`: root `lang` attribute, translatable text, active option.
    pub fn apply_language(&self, doc: &mut dyn Document, lang: Language) {
        doc.set_document_language(lang.code());

        let attributes = LanguageRegistry::get().translation_attributes();
        for element in doc.query_all(&Query::HasAttributes(&attributes)) {
            match doc.attribute(element, lang.data_attribute()) {
                Some(text) if !text.is_empty() => doc.set_text_content(element, &text),
                _ => {}
            }
        }

        for option in doc.query_all(&Query::Class(OPTION_CLASS)) {
            let is_current =
                doc.attribute(option, OPTION_LANG_ATTRIBUTE).as_deref() == Some(lang.code());
            doc.set_class(option, ACTIVE_CLASS, is_current);
        }
    }

    /// Handle a click; returns whether the language changed.
    ///
    /// Options whose `data-lang` is not a supported language are ignored.
    pub fn on_click(
        &mut self,
        doc: &mut dyn Document,
        store: &mut dyn PreferenceStore,
        target: ElementId,
    ) -> bool {
        let Some(option) = self
            .options
            .iter()
            .copied()
            .find(|option| doc.contains(*option, target))
        else {
            return false;
        };

        let requested = doc.attribute(option, OPTION_LANG_ATTRIBUTE).unwrap_or_default();
        match Language::from_code(&requested) {
            Ok(lang) => self.set_language(doc, store, lang),
            Err(e) => {
                debug!("Ignoring language option: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};
    use crate::storage::{MemoryStore, StorageError};
    use proptest::prelude::*;

    /// Storage that refuses every access, like blocked `localStorage`.
    struct BlockedStore;

    impl PreferenceStore for BlockedStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("blocked".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("blocked".to_string()))
        }
    }

    struct Page {
        doc: MemoryDocument,
        en_option: ElementId,
        pt_option: ElementId,
        title: ElementId,
        english_only: ElementId,
    }

    fn page() -> Page {
        let mut doc = MemoryDocument::new();
        let body = doc.body().unwrap();
        let toggle = doc.append(body, ElementSpec::new("div").id("lang-toggle"));
        let en_option = doc.append(
            toggle,
            ElementSpec::new("button")
                .class("lang-option")
                .attr("data-lang", "en")
                .text("EN"),
        );
        let pt_option = doc.append(
            toggle,
            ElementSpec::new("button")
                .class("lang-option")
                .attr("data-lang", "pt")
                .text("PT"),
        );
        let title = doc.append(
            body,
            ElementSpec::new("h1")
                .attr("data-en", "Become a sponsor")
                .attr("data-pt", "Seja patrocinador")
                .text("Become a sponsor"),
        );
        let english_only = doc.append(
            body,
            ElementSpec::new("p")
                .attr("data-en", "Lisbon")
                .attr("data-pt", "")
                .text("Lisbon"),
        );
        Page {
            doc,
            en_option,
            pt_option,
            title,
            english_only,
        }
    }

    fn config() -> SiteConfig {
        SiteConfig::default()
    }

    // ==================== init Tests ====================

    #[test]
    fn test_init_without_preference_uses_default() {
        let mut page = page();
        let store = MemoryStore::new();

        let manager = LanguageManager::init(&mut page.doc, &store, &config());

        assert_eq!(manager.current(), Language::ENGLISH);
        assert_eq!(page.doc.language(), Some("en"));
        assert!(page.doc.has_class(page.en_option, "active"));
        assert!(!page.doc.has_class(page.pt_option, "active"));
    }

    #[test]
    fn test_init_restores_stored_preference() {
        let mut page = page();
        let store = MemoryStore::new().with_value("appsecdays-lang", "pt");

        let manager = LanguageManager::init(&mut page.doc, &store, &config());

        assert_eq!(manager.current(), Language::PORTUGUESE);
        assert_eq!(page.doc.text_content(page.title), "Seja patrocinador");
        assert_eq!(page.doc.language(), Some("pt"));
    }

    #[test]
    fn test_init_captures_both_options() {
        let mut page = page();
        let manager = LanguageManager::init(&mut page.doc, &MemoryStore::new(), &config());
        assert_eq!(manager.options(), [page.en_option, page.pt_option]);
    }

    #[test]
    fn test_init_without_toggle_still_renders() {
        let mut doc = MemoryDocument::new();
        let body = doc.body().unwrap();
        let p = doc.append(
            body,
            ElementSpec::new("p").attr("data-en", "Hi").attr("data-pt", "Olá"),
        );
        let store = MemoryStore::new().with_value("appsecdays-lang", "pt");

        let manager = LanguageManager::init(&mut doc, &store, &config());

        assert!(manager.options().is_empty());
        assert_eq!(doc.text_content(p), "Olá");
    }

    #[test]
    fn test_init_with_unreadable_store_uses_default() {
        let mut page = page();

        let manager = LanguageManager::init(&mut page.doc, &BlockedStore, &config());

        assert_eq!(manager.current(), Language::ENGLISH);
        assert_eq!(page.doc.language(), Some("en"));
        assert!(page.doc.has_class(page.en_option, "active"));
    }

    proptest! {
        #[test]
        fn prop_malformed_preference_falls_back_to_default(stored in "\\PC*") {
            prop_assume!(stored != "en" && stored != "pt");
            let mut page = page();
            let store = MemoryStore::new().with_value("appsecdays-lang", &stored);

            let manager = LanguageManager::init(&mut page.doc, &store, &config());

            prop_assert_eq!(manager.current(), Language::ENGLISH);
            prop_assert_eq!(page.doc.language(), Some("en"));
        }
    }

    // ==================== set_language Tests ====================

    #[test]
    fn test_set_same_language_is_noop() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        let changed = manager.set_language(&mut page.doc, &mut store, Language::ENGLISH);

        assert!(!changed);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_set_language_persists_and_renders() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        let changed = manager.set_language(&mut page.doc, &mut store, Language::PORTUGUESE);

        assert!(changed);
        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.get("appsecdays-lang").unwrap().as_deref(),
            Some("pt")
        );
        assert_eq!(page.doc.text_content(page.title), "Seja patrocinador");
        assert_eq!(page.doc.language(), Some("pt"));
    }

    #[test]
    fn test_set_language_with_failing_store_still_switches() {
        let mut page = page();
        let mut store = BlockedStore;
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        let changed = manager.set_language(&mut page.doc, &mut store, Language::PORTUGUESE);

        assert!(changed);
        assert_eq!(manager.current(), Language::PORTUGUESE);
        assert_eq!(page.doc.text_content(page.title), "Seja patrocinador");
        assert_eq!(page.doc.language(), Some("pt"));
        assert!(page.doc.has_class(page.pt_option, "active"));
    }

    #[test]
    fn test_set_language_skips_empty_translation() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        manager.set_language(&mut page.doc, &mut store, Language::PORTUGUESE);

        assert_eq!(page.doc.text_content(page.english_only), "Lisbon");
    }

    #[test]
    fn test_exactly_one_option_active_after_switch() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        manager.set_language(&mut page.doc, &mut store, Language::PORTUGUESE);

        let active: Vec<_> = manager
            .options()
            .iter()
            .filter(|option| page.doc.has_class(**option, "active"))
            .copied()
            .collect();
        assert_eq!(active, vec![page.pt_option]);
    }

    // ==================== on_click Tests ====================

    #[test]
    fn test_click_option_switches_language() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        assert!(manager.on_click(&mut page.doc, &mut store, page.pt_option));
        assert_eq!(manager.current(), Language::PORTUGUESE);

        // Second click on the same option changes nothing
        assert!(!manager.on_click(&mut page.doc, &mut store, page.pt_option));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_click_elsewhere_is_ignored() {
        let mut page = page();
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        assert!(!manager.on_click(&mut page.doc, &mut store, page.title));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_click_unsupported_option_is_ignored() {
        let mut page = page();
        let toggle = page.doc.element_by_id("lang-toggle").unwrap();
        let fr = page.doc.append(
            toggle,
            ElementSpec::new("button").class("lang-option").attr("data-lang", "fr"),
        );
        let mut store = MemoryStore::new();
        let mut manager = LanguageManager::init(&mut page.doc, &store, &config());

        assert!(!manager.on_click(&mut page.doc, &mut store, fr));
        assert_eq!(manager.current(), Language::ENGLISH);
        assert_eq!(store.writes(), 0);
    }
}
