//! Scroll-triggered reveal of sections and cards.
//!
//! The visual transition is pure CSS keyed off two classes; this module only
//! tags elements and flips them once when they first enter the viewport.

use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Intersection, Query, WatchOptions};
use std::collections::BTreeSet;
use tracing::debug;

const READY_CLASS: &str = "animate-ready";
const REVEALED_CLASS: &str = "animate-in";
const ORDER_PROPERTY: &str = "--animation-order";
const SECTION_CLASS: &str = "section";

/// Card classes, each paired with the grid that orders its cards.
const CARD_GROUPS: [(&str, &str); 4] = [
    ("tiers-grid", "tier-card"),
    ("sponsor-benefits", "benefit-card"),
    ("speakers-grid", "speaker-card"),
    ("committee-grid", "committee-member"),
];

/// Global stylesheet for the ready → revealed transition and card stagger.
pub fn reveal_stylesheet(config: &SiteConfig) -> String {
    let staggered = CARD_GROUPS
        .iter()
        .map(|(_, card)| format!(".{}.{}", card, READY_CLASS))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        ".{ready} {{\n    opacity: 0;\n    transform: translateY({offset}px);\n    \
         transition: opacity {duration}s ease, transform {duration}s ease;\n}}\n\n\
         .{revealed} {{\n    opacity: 1;\n    transform: translateY(0);\n}}\n\n\
         {staggered} {{\n    transition-delay: calc(var({order}, 0) * {step}s);\n}}\n",
        ready = READY_CLASS,
        revealed = REVEALED_CLASS,
        offset = config.reveal_offset_px,
        duration = config.reveal_duration_secs,
        staggered = staggered,
        order = ORDER_PROPERTY,
        step = config.stagger_step_secs,
    )
}

#[derive(Debug, Clone, Default)]
pub struct Animations {
    pending: BTreeSet<ElementId>,
    revealed: usize,
}

impl Animations {
    /// Inject the stylesheet, assign stagger orders and start watching every
    /// section and card.
    pub fn init(doc: &mut dyn Document, config: &SiteConfig) -> Self {
        doc.inject_style(&reveal_stylesheet(config));
        assign_stagger_order(doc);

        let watching = doc.start_watching(&WatchOptions {
            threshold: config.reveal_threshold,
            root_margin: config.reveal_root_margin.clone(),
        });
        if !watching {
            // Untagged elements stay visible.
            debug!("No intersection watcher, reveal disabled");
            return Self::default();
        }

        let cards: Vec<Query<'_>> = CARD_GROUPS
            .iter()
            .map(|&(_, card)| Query::Class(card))
            .collect();
        let mut elements = doc.query_all(&Query::Class(SECTION_CLASS));
        elements.extend(doc.query_all(&Query::Any(&cards)));

        let mut animations = Self::default();
        for element in elements {
            if animations.pending.insert(element) {
                doc.set_class(element, READY_CLASS, true);
                doc.observe(element);
            }
        }
        debug!("Watching {} elements for reveal", animations.pending.len());
        animations
    }

    /// Reveal every pending element that is now intersecting.
    ///
    /// Each element is revealed at most once and stops being observed; later
    /// entries for it are ignored. Returns the elements revealed by this batch.
    pub fn on_intersections(
        &mut self,
        doc: &mut dyn Document,
        entries: &[Intersection],
    ) -> Vec<ElementId> {
        let mut revealed = Vec::new();
        for entry in entries.iter().filter(|entry| entry.is_intersecting) {
            if !self.pending.remove(&entry.target) {
                continue;
            }
            doc.set_class(entry.target, REVEALED_CLASS, true);
            doc.unobserve(entry.target);
            revealed.push(entry.target);
        }
        self.revealed += revealed.len();
        revealed
    }

    /// Elements still waiting for their first intersection.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }
}

/// Number each card by its position among the cards of its grid type.
fn assign_stagger_order(doc: &mut dyn Document) {
    for (grid, card) in CARD_GROUPS {
        let query = Query::Descendant {
            ancestor: &Query::Class(grid),
            target: &Query::Class(card),
        };
        for (index, element) in doc.query_all(&query).into_iter().enumerate() {
            doc.set_style_property(element, ORDER_PROPERTY, &index.to_string());
        }
    }
}
