//! Call-to-action click tracking.
//!
//! Clicks on `.btn` elements become [`CtaEvent`]s handed to an [`EventSink`].
//! The default sink drops them; the browser build forwards them to `gtag`
//! when the page loaded it.

use crate::dom::{Document, ElementId, Query};
use serde::Serialize;
use tracing::{debug, info};

const BUTTON_CLASS: &str = "btn";

/// A tracked button click, serialized as the `gtag` event parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CtaEvent {
    #[serde(rename = "event_category")]
    pub category: String,
    #[serde(rename = "event_label")]
    pub label: String,
    pub link_url: Option<String>,
}

impl CtaEvent {
    pub const ACTION: &'static str = "click";
    pub const CATEGORY: &'static str = "CTA";

    pub fn new(label: &str, link_url: Option<String>) -> Self {
        Self {
            category: Self::CATEGORY.to_string(),
            label: label.trim().to_string(),
            link_url,
        }
    }
}

/// Destination for tracked events.
pub trait EventSink {
    fn track(&mut self, event: &CtaEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn track(&mut self, _event: &CtaEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<CtaEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[CtaEvent] {
        &self.events
    }
}

impl EventSink for RecordingSink {
    fn track(&mut self, event: &CtaEvent) {
        self.events.push(event.clone());
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn track(&mut self, event: &CtaEvent) {
        info!(
            category = %event.category,
            label = %event.label,
            link_url = event.link_url.as_deref().unwrap_or(""),
            "CTA click"
        );
    }
}

/// Fan-out: both sinks receive every event.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn track(&mut self, event: &CtaEvent) {
        self.0.track(event);
        self.1.track(event);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analytics {
    buttons: Vec<ElementId>,
}

impl Analytics {
    /// Capture every call-to-action button on the page.
    pub fn init(doc: &dyn Document) -> Self {
        let buttons = doc.query_all(&Query::Class(BUTTON_CLASS));
        debug!("Tracking {} CTA buttons", buttons.len());
        Self { buttons }
    }

    pub fn buttons(&self) -> &[ElementId] {
        &self.buttons
    }

    /// Forward a click on (or inside) a tracked button to the sink.
    pub fn on_click(
        &self,
        doc: &dyn Document,
        sink: &mut dyn EventSink,
        target: ElementId,
    ) -> Option<CtaEvent> {
        let button = self
            .buttons
            .iter()
            .copied()
            .find(|button| doc.contains(*button, target))?;

        let event = CtaEvent::new(&doc.text_content(button), doc.attribute(button, "href"));
        sink.track(&event);
        Some(event)
    }
}
