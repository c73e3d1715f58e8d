//! Composition of the four page components.
//!
//! `Site` owns the document, the preference store and the event sink, builds
//! each component once, and routes page events to them.

use crate::analytics::{Analytics, EventSink};
use crate::animations::Animations;
use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Intersection};
use crate::i18n::LanguageManager;
use crate::navigation::Navigation;
use crate::storage::PreferenceStore;
use tracing::info;

/// What the host should do with the native event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Let the browser run its default action
    Proceed,
    /// Call `preventDefault` on the event
    PreventDefault,
}

/// Events the host page forwards to the site.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Scroll,
    Click { target: ElementId },
    Intersections(Vec<Intersection>),
}

pub struct Site<D, S, E> {
    document: D,
    store: S,
    sink: E,
    language: LanguageManager,
    navigation: Option<Navigation>,
    animations: Animations,
    analytics: Analytics,
}

impl<D, S, E> Site<D, S, E>
where
    D: Document,
    S: PreferenceStore,
    E: EventSink,
{
    /// Initialize language, navigation, animations and analytics, in order.
    pub fn init(mut document: D, store: S, sink: E, config: &SiteConfig) -> Self {
        let language = LanguageManager::init(&mut document, &store, config);
        let navigation = Navigation::init(&mut document, config);
        let animations = Animations::init(&mut document, config);
        let analytics = Analytics::init(&document);

        info!(
            language = %language.current(),
            navigation = navigation.is_some(),
            reveal_pending = animations.pending(),
            cta_buttons = analytics.buttons().len(),
            "Site initialized"
        );

        Self {
            document,
            store,
            sink,
            language,
            navigation,
            animations,
            analytics,
        }
    }

    pub fn dispatch(&mut self, event: PageEvent) -> EventOutcome {
        match event {
            PageEvent::Scroll => {
                if let Some(navigation) = &self.navigation {
                    navigation.on_scroll(&mut self.document);
                }
                EventOutcome::Proceed
            }
            PageEvent::Click { target } => self.click(target),
            PageEvent::Intersections(entries) => {
                self.animations.on_intersections(&mut self.document, &entries);
                EventOutcome::Proceed
            }
        }
    }

    /// Element-level handlers in registration order, then document-level.
    fn click(&mut self, target: ElementId) -> EventOutcome {
        self.language
            .on_click(&mut self.document, &mut self.store, target);

        let mut outcome = EventOutcome::Proceed;
        if let Some(navigation) = &self.navigation {
            outcome = navigation.on_click(&mut self.document, target);
        }

        self.analytics
            .on_click(&self.document, &mut self.sink, target);

        if let Some(navigation) = &self.navigation {
            navigation.on_document_click(&mut self.document, target);
        }
        outcome
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn language(&self) -> &LanguageManager {
        &self.language
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    pub fn animations(&self) -> &Animations {
        &self.animations
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }
}
