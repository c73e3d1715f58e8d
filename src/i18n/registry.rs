//! Language registry: Single source of truth for all supported languages.
//!
//! The registry is a lazily initialized `OnceLock` singleton. It is immutable
//! after first access.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "pt")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Portuguese")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Português")
    pub native_name: &'static str,

    /// Markup attribute holding this language's text on translatable elements
    pub data_attribute: &'static str,

    /// Whether this is the language shown when no preference is stored
    /// (only one should be true)
    pub is_default: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the language is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if no default language is found or if multiple default
    /// languages are defined (this indicates a configuration error).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Attributes a translatable element must carry: one per language.
    pub fn translation_attributes(&self) -> Vec<&'static str> {
        self.languages
            .iter()
            .map(|lang| lang.data_attribute)
            .collect()
    }
}

/// Default language configurations.
///
/// The conference site is published in English (default) and Portuguese.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            data_attribute: "data-en",
            is_default: true,
        },
        LanguageConfig {
            code: "pt",
            name: "Portuguese",
            native_name: "Português",
            data_attribute: "data-pt",
            is_default: false,
        },
    ]
}
