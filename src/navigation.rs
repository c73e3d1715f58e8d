//! Navbar behavior: scroll styling, mobile menu, smooth in-page anchors.

use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Query};
use crate::EventOutcome;
use tracing::debug;

const NAVBAR_ID: &str = "navbar";
const TOGGLE_ID: &str = "nav-toggle";
const MENU_ID: &str = "nav-menu";
const SCROLLED_CLASS: &str = "scrolled";
const ACTIVE_CLASS: &str = "active";

/// Mobile menu button and panel. Both must exist for the menu to work.
#[derive(Debug, Clone)]
struct MobileMenu {
    toggle: ElementId,
    panel: ElementId,
    links: Vec<ElementId>,
}

#[derive(Debug, Clone)]
pub struct Navigation {
    navbar: ElementId,
    menu: Option<MobileMenu>,
    anchors: Vec<ElementId>,
    scroll_threshold: f64,
}

impl Navigation {
    /// Wire up the navbar. Returns `None` when the page has no `#navbar`.
    pub fn init(doc: &mut dyn Document, config: &SiteConfig) -> Option<Self> {
        let Some(navbar) = doc.element_by_id(NAVBAR_ID) else {
            debug!("No #{} on page, navigation disabled", NAVBAR_ID);
            return None;
        };

        let menu = match (doc.element_by_id(TOGGLE_ID), doc.element_by_id(MENU_ID)) {
            (Some(toggle), Some(panel)) => Some(MobileMenu {
                toggle,
                panel,
                links: doc.query_within(panel, &Query::Tag("a")),
            }),
            _ => {
                debug!("Mobile menu markup incomplete, menu toggle disabled");
                None
            }
        };

        let anchors = doc.query_all(&Query::AttributePrefix {
            tag: "a",
            name: "href",
            prefix: "#",
        });

        let navigation = Self {
            navbar,
            menu,
            anchors,
            scroll_threshold: config.scroll_threshold,
        };
        navigation.on_scroll(doc);
        Some(navigation)
    }

    /// Recompute the `scrolled` class from the current scroll offset.
    pub fn on_scroll(&self, doc: &mut dyn Document) {
        let scrolled = doc.scroll_y() > self.scroll_threshold;
        doc.set_class(self.navbar, SCROLLED_CLASS, scrolled);
    }

    pub fn is_menu_open(&self, doc: &dyn Document) -> bool {
        self.menu
            .as_ref()
            .is_some_and(|menu| doc.has_class(menu.panel, ACTIVE_CLASS))
    }

    /// Element-level click handling: menu toggle, menu links, anchors.
    pub fn on_click(&self, doc: &mut dyn Document, target: ElementId) -> EventOutcome {
        if let Some(menu) = &self.menu {
            if doc.contains(menu.toggle, target) {
                let open = !doc.has_class(menu.panel, ACTIVE_CLASS);
                self.set_menu_open(doc, menu, open);
            } else if menu.links.iter().any(|link| doc.contains(*link, target)) {
                self.set_menu_open(doc, menu, false);
            }
        }

        match self
            .anchors
            .iter()
            .copied()
            .find(|anchor| doc.contains(*anchor, target))
        {
            Some(anchor) => self.scroll_to_anchor(doc, anchor),
            None => EventOutcome::Proceed,
        }
    }

    /// Document-level click handling: close the open menu on outside clicks.
    ///
    /// Runs after every element-level handler for the same click.
    pub fn on_document_click(&self, doc: &mut dyn Document, target: ElementId) {
        let Some(menu) = &self.menu else {
            return;
        };
        if doc.has_class(menu.panel, ACTIVE_CLASS)
            && !doc.contains(menu.panel, target)
            && !doc.contains(menu.toggle, target)
        {
            self.set_menu_open(doc, menu, false);
        }
    }

    fn set_menu_open(&self, doc: &mut dyn Document, menu: &MobileMenu, open: bool) {
        doc.set_class(menu.toggle, ACTIVE_CLASS, open);
        doc.set_class(menu.panel, ACTIVE_CLASS, open);
        if let Some(body) = doc.body() {
            if open {
                doc.set_style_property(body, "overflow", "hidden");
            } else {
                doc.remove_style_property(body, "overflow");
            }
        }
    }

    /// Smooth-scroll to the anchor's target, leaving room for the navbar.
    fn scroll_to_anchor(&self, doc: &mut dyn Document, anchor: ElementId) -> EventOutcome {
        let href = doc.attribute(anchor, "href").unwrap_or_default();
        let Some(fragment) = href.strip_prefix('#').filter(|f| !f.is_empty()) else {
            return EventOutcome::Proceed;
        };
        let Some(target) = doc.element_by_id(fragment) else {
            debug!("Anchor target #{} not found, using default navigation", fragment);
            return EventOutcome::Proceed;
        };

        let nav_height = doc
            .element_by_id(NAVBAR_ID)
            .map(|navbar| doc.offset_height(navbar))
            .unwrap_or(0.0);
        let top = doc.bounding_top(target) + doc.scroll_y() - nav_height;
        doc.smooth_scroll_to(top);
        EventOutcome::PreventDefault
    }
}
