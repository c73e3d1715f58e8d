//! Language type: validated language representation.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("Unknown language code: '{0}'")]
    Unknown(String),
}

/// A validated language.
///
/// Only registered languages can be constructed, so a `Language`
/// held by the site is always one of the two page languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "pt")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const PORTUGUESE: Language = Language { code: "pt" };

    /// Create a Language from a language code string.
    ///
    /// Codes are matched exactly: `"EN"` and `" en"` are rejected, as the
    /// page only ever stores the lowercase code.
    pub fn from_code(code: &str) -> Result<Language, LanguageError> {
        LanguageRegistry::get()
            .get_by_code(code)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| LanguageError::Unknown(code.to_string()))
    }

    /// The language shown when no valid preference is stored.
    pub fn default_language() -> Language {
        let config = LanguageRegistry::get().default_language();
        Language { code: config.code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the language code is not found in the registry. This should
    /// never happen if the Language was constructed properly (via `from_code`
    /// or constants).
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Attribute holding this language's text, e.g. `data-pt`.
    pub fn data_attribute(&self) -> &'static str {
        self.config().data_attribute
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::default_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
