//! Client-side interactivity for the AppSec Days Portugal conference site.
//!
//! Four independent components are composed by [`Site`]:
//!
//! - [`i18n::LanguageManager`]: bilingual (en/pt) text toggle
//! - [`navigation::Navigation`]: navbar scroll styling, mobile menu, smooth anchors
//! - [`animations::Animations`]: one-shot reveal on viewport intersection
//! - [`analytics::Analytics`]: call-to-action click tracking
//!
//! Components reach the page only through [`dom::Document`],
//! [`storage::PreferenceStore`] and [`analytics::EventSink`]. The `web`
//! feature provides browser implementations of all three.

pub mod analytics;
pub mod animations;
pub mod config;
pub mod dom;
pub mod i18n;
pub mod navigation;
pub mod site;
pub mod storage;

#[cfg(feature = "web")]
pub mod web;

pub use site::{EventOutcome, PageEvent, Site};
