//! Browser backend: the live page behind the component traits.
//!
//! Built with the `web` feature for `wasm32-unknown-unknown`. The module's
//! `start` function is the wasm entry point; it mounts the site once the DOM
//! is ready and forwards `scroll`, `click` and intersection events to it.

use crate::analytics::{CtaEvent, EventSink};
use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Intersection, Query, WatchOptions};
use crate::storage::{PreferenceStore, StorageError};
use crate::{EventOutcome, PageEvent, Site};
use js_sys::{Array, Function, Reflect, JSON};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Element, Event, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, NodeList, ScrollToOptions, Storage,
    Window,
};

type WebSite = Site<WebDocument, LocalStorageStore, GtagSink>;

// ==================== Document ====================

/// [`Document`] over `web_sys`.
///
/// Element handles index an interning table, so the same DOM node always maps
/// to the same [`ElementId`].
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    elements: RefCell<Vec<Element>>,
    on_intersect: Function,
    observer: Option<IntersectionObserver>,
}

impl WebDocument {
    /// `on_intersect` becomes the intersection watcher's callback.
    pub fn new(window: Window, document: web_sys::Document, on_intersect: Function) -> Self {
        Self {
            window,
            document,
            elements: RefCell::new(Vec::new()),
            on_intersect,
            observer: None,
        }
    }

    /// Handle for a live element, reusing the handle of an already known node.
    pub fn intern(&self, element: &Element) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        if let Some(index) = elements.iter().position(|known| known == element) {
            return ElementId(index);
        }
        elements.push(element.clone());
        ElementId(elements.len() - 1)
    }

    fn element(&self, id: ElementId) -> Element {
        self.elements.borrow()[id.0].clone()
    }

    fn html_element(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id).dyn_into::<HtmlElement>().ok()
    }

    fn collect(&self, list: Result<NodeList, JsValue>) -> Vec<ElementId> {
        let Ok(list) = list else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.intern(&element))
            .collect()
    }
}

impl Document for WebDocument {
    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.document
            .get_element_by_id(id)
            .map(|element| self.intern(&element))
    }

    fn query_all(&self, query: &Query<'_>) -> Vec<ElementId> {
        self.collect(self.document.query_selector_all(&query.to_css()))
    }

    fn query_within(&self, ancestor: ElementId, query: &Query<'_>) -> Vec<ElementId> {
        self.collect(self.element(ancestor).query_selector_all(&query.to_css()))
    }

    fn body(&self) -> Option<ElementId> {
        self.document.body().map(|body| self.intern(&body))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let node = self.element(node);
        let node: &web_sys::Node = &node;
        self.element(ancestor).contains(Some(node))
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element).get_attribute(name)
    }

    fn text_content(&self, element: ElementId) -> String {
        self.element(element).text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, element: ElementId, text: &str) {
        self.element(element).set_text_content(Some(text));
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element).class_list().contains(class)
    }

    fn set_class(&mut self, element: ElementId, class: &str, on: bool) {
        let _ = self.element(element).class_list().toggle_with_force(class, on);
    }

    fn set_style_property(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(html) = self.html_element(element) {
            let _ = html.style().set_property(name, value);
        }
    }

    fn remove_style_property(&mut self, element: ElementId, name: &str) {
        if let Some(html) = self.html_element(element) {
            let _ = html.style().remove_property(name);
        }
    }

    fn set_document_language(&mut self, code: &str) {
        if let Some(root) = self.document.document_element() {
            let _ = root.set_attribute("lang", code);
        }
    }

    fn inject_style(&mut self, css: &str) {
        let Ok(style) = self.document.create_element("style") else {
            return;
        };
        style.set_text_content(Some(css));
        if let Some(head) = self.document.head() {
            let _ = head.append_child(&style);
        }
    }

    fn offset_height(&self, element: ElementId) -> f64 {
        self.html_element(element)
            .map(|html| f64::from(html.offset_height()))
            .unwrap_or(0.0)
    }

    fn bounding_top(&self, element: ElementId) -> f64 {
        self.element(element).get_bounding_client_rect().top()
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn smooth_scroll_to(&mut self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(web_sys::ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn start_watching(&mut self, options: &WatchOptions) -> bool {
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        match IntersectionObserver::new_with_options(&self.on_intersect, &init) {
            Ok(observer) => {
                self.observer = Some(observer);
                true
            }
            Err(e) => {
                debug!("IntersectionObserver unavailable: {:?}", e);
                false
            }
        }
    }

    fn observe(&mut self, element: ElementId) {
        if let Some(observer) = &self.observer {
            observer.observe(&self.element(element));
        }
    }

    fn unobserve(&mut self, element: ElementId) {
        if let Some(observer) = &self.observer {
            observer.unobserve(&self.element(element));
        }
    }
}

// ==================== Storage ====================

/// `window.localStorage`. Missing or blocked storage reads as an error.
pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    pub fn new(window: &Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }

    fn storage(&self) -> Result<&Storage, StorageError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".to_string()))
    }
}

fn js_error(value: JsValue) -> StorageError {
    StorageError::Unavailable(format!("{:?}", value))
}

impl PreferenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(js_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(js_error)
    }
}

// ==================== Analytics ====================

/// Forwards events to the page's global `gtag` function, when one is loaded.
///
/// The lookup happens on every event, so a tag script loaded after the site
/// mounted is still picked up.
pub struct GtagSink {
    window: Window,
}

impl GtagSink {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl EventSink for GtagSink {
    fn track(&mut self, event: &CtaEvent) {
        let Some(gtag) = Reflect::get(&self.window, &JsValue::from_str("gtag"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
        else {
            return;
        };

        let Some(payload) = serde_json::to_string(event)
            .ok()
            .and_then(|json| JSON::parse(&json).ok())
        else {
            return;
        };

        if let Err(e) = gtag.call3(
            &JsValue::NULL,
            &JsValue::from_str("event"),
            &JsValue::from_str(CtaEvent::ACTION),
            &payload,
        ) {
            debug!("gtag call failed: {:?}", e);
        }
    }
}

// ==================== Entry point ====================

/// wasm entry point: mount now, or at `DOMContentLoaded` while still loading.
#[wasm_bindgen(start)]
pub fn start() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    if document.ready_state() == "loading" {
        let on_ready = Closure::once_into_js(move || mount(window));
        let _ = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref());
    } else {
        mount(window);
    }
}

fn mount(window: Window) {
    let Some(document) = window.document() else {
        return;
    };
    let slot: Rc<RefCell<Option<WebSite>>> = Rc::new(RefCell::new(None));

    let on_intersect = {
        let slot = Rc::clone(&slot);
        Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let Ok(mut slot) = slot.try_borrow_mut() else {
                return;
            };
            let Some(site) = slot.as_mut() else {
                return;
            };
            let intersections = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| Intersection {
                    target: site.document().intern(&entry.target()),
                    is_intersecting: entry.is_intersecting(),
                })
                .collect();
            site.dispatch(PageEvent::Intersections(intersections));
        })
    };

    let web_document = WebDocument::new(
        window.clone(),
        document.clone(),
        on_intersect.as_ref().unchecked_ref::<Function>().clone(),
    );
    on_intersect.forget();

    let store = LocalStorageStore::new(&window);
    let sink = GtagSink::new(window.clone());
    *slot.borrow_mut() = Some(Site::init(web_document, store, sink, &SiteConfig::default()));

    let on_scroll = {
        let slot = Rc::clone(&slot);
        Closure::<dyn FnMut()>::new(move || {
            if let Ok(mut slot) = slot.try_borrow_mut() {
                if let Some(site) = slot.as_mut() {
                    site.dispatch(PageEvent::Scroll);
                }
            }
        })
    };
    let passive = AddEventListenerOptions::new();
    passive.set_passive(true);
    let _ = window.add_event_listener_with_callback_and_add_event_listener_options(
        "scroll",
        on_scroll.as_ref().unchecked_ref(),
        &passive,
    );
    on_scroll.forget();

    let on_click = {
        let slot = Rc::clone(&slot);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(target) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
            else {
                return;
            };
            let Ok(mut slot) = slot.try_borrow_mut() else {
                return;
            };
            let Some(site) = slot.as_mut() else {
                return;
            };
            let target = site.document().intern(&target);
            if site.dispatch(PageEvent::Click { target }) == EventOutcome::PreventDefault {
                event.prevent_default();
            }
        })
    };
    let _ = document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
    on_click.forget();
}
