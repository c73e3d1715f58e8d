//! Internationalization (i18n): the page's language toggle.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the supported languages
//! - `language`: Validated `Language` type
//! - `manager`: `LanguageManager`, which persists and renders the preference
//!
//! # Example
//!
//! ```rust,ignore
//! use appsecdays_site::i18n::{Language, LanguageManager};
//!
//! let mut manager = LanguageManager::init(&mut doc, &store, &config);
//! manager.set_language(&mut doc, &mut store, Language::PORTUGUESE);
//! ```

mod language;
mod manager;
mod registry;

pub use language::{Language, LanguageError};
pub use manager::LanguageManager;
pub use registry::{LanguageConfig, LanguageRegistry};
