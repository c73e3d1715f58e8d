//! In-memory document: an element arena implementing [`Document`].
//!
//! Used by the test suite and by the preview binary. Layout is explicit:
//! each element may carry a page-relative `top` (inherited from the nearest
//! positioned ancestor when absent) and a `height`.

use super::{Document, ElementId, Query, WatchOptions};
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Element(ElementId),
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    content: Vec<Content>,
    parent: Option<ElementId>,
    top: Option<f64>,
    height: f64,
}

/// Builder for elements appended to a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    text: Option<String>,
    top: Option<f64>,
    height: f64,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Page-relative top edge.
    pub fn top(mut self, top: f64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }
}

/// In-memory element tree with a simulated viewport and intersection watcher.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: ElementId,
    head: ElementId,
    body: ElementId,
    language: Option<String>,
    stylesheets: Vec<String>,
    scroll_y: f64,
    smooth_scrolls: Vec<f64>,
    watch_options: Option<WatchOptions>,
    watcher_supported: bool,
    observed: BTreeSet<ElementId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty page: `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self::detached();
        doc.root = doc.push(Node {
            tag: "html".to_string(),
            ..Default::default()
        });
        doc.head = doc.append(doc.root, ElementSpec::new("head"));
        doc.body = doc.append(doc.root, ElementSpec::new("body"));
        doc
    }

    /// Build a document from HTML markup.
    ///
    /// Text and element children keep their order. Layout starts out empty;
    /// use [`MemoryDocument::set_layout`] to position elements.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let root_element = parsed.root_element();

        let mut doc = Self::detached();
        doc.root = doc.import(root_element, None);
        doc.language = root_element.value().attr("lang").map(String::from);

        let children = doc.child_elements(doc.root);
        let head = children.iter().copied().find(|id| doc.nodes[id.0].tag == "head");
        let body = children.iter().copied().find(|id| doc.nodes[id.0].tag == "body");
        doc.head = match head {
            Some(head) => head,
            None => doc.append(doc.root, ElementSpec::new("head")),
        };
        doc.body = match body {
            Some(body) => body,
            None => doc.append(doc.root, ElementSpec::new("body")),
        };
        doc
    }

    fn detached() -> Self {
        Self {
            nodes: Vec::new(),
            root: ElementId(0),
            head: ElementId(0),
            body: ElementId(0),
            language: None,
            stylesheets: Vec::new(),
            scroll_y: 0.0,
            smooth_scrolls: Vec::new(),
            watch_options: None,
            watcher_supported: true,
            observed: BTreeSet::new(),
        }
    }

    fn push(&mut self, node: Node) -> ElementId {
        self.nodes.push(node);
        ElementId(self.nodes.len() - 1)
    }

    fn import(&mut self, element: ElementRef<'_>, parent: Option<ElementId>) -> ElementId {
        let value = element.value();
        let node = Node {
            tag: value.name().to_ascii_lowercase(),
            attributes: value
                .attrs()
                .filter(|(name, _)| *name != "class")
                .map(|(name, val)| (name.to_string(), val.to_string()))
                .collect(),
            classes: value.classes().map(String::from).collect(),
            parent,
            ..Default::default()
        };
        let id = self.push(node);

        for child in element.children() {
            match child.value() {
                scraper::Node::Text(text) => {
                    self.nodes[id.0].content.push(Content::Text(String::from(&**text)));
                }
                scraper::Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        let child_id = self.import(child_element, Some(id));
                        self.nodes[id.0].content.push(Content::Element(child_id));
                    }
                }
                _ => {}
            }
        }

        id
    }

    // ==================== Building ====================

    /// Append a new element as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, spec: ElementSpec) -> ElementId {
        let mut node = Node {
            tag: spec.tag.to_ascii_lowercase(),
            attributes: spec.attributes.into_iter().collect(),
            classes: spec.classes,
            parent: Some(parent),
            top: spec.top,
            height: spec.height,
            ..Default::default()
        };
        if let Some(text) = spec.text {
            node.content.push(Content::Text(text));
        }
        let id = self.push(node);
        self.nodes[parent.0].content.push(Content::Element(id));
        id
    }

    pub fn set_layout(&mut self, element: ElementId, top: f64, height: f64) {
        let node = &mut self.nodes[element.0];
        node.top = Some(top);
        node.height = height;
    }

    /// Simulate a browser without an intersection watcher.
    pub fn without_watcher(mut self) -> Self {
        self.watcher_supported = false;
        self
    }

    /// Move the viewport as a visitor would (no scroll request is recorded).
    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = y;
    }

    // ==================== Inspection ====================

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn head(&self) -> ElementId {
        self.head
    }

    pub fn tag(&self, element: ElementId) -> &str {
        &self.nodes[element.0].tag
    }

    pub fn classes(&self, element: ElementId) -> &[String] {
        &self.nodes[element.0].classes
    }

    pub fn style_property(&self, element: ElementId, name: &str) -> Option<&str> {
        self.nodes[element.0].style.get(name).map(String::as_str)
    }

    /// The `lang` attribute of the document root.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    /// Targets of every smooth scroll requested so far.
    pub fn smooth_scrolls(&self) -> &[f64] {
        &self.smooth_scrolls
    }

    pub fn watch_options(&self) -> Option<&WatchOptions> {
        self.watch_options.as_ref()
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.observed.contains(&element)
    }

    pub fn observed(&self) -> Vec<ElementId> {
        self.observed.iter().copied().collect()
    }

    /// Observed elements whose box overlaps `[scroll_y, scroll_y + viewport_height)`.
    pub fn observed_in_viewport(&self, viewport_height: f64) -> Vec<ElementId> {
        self.observed
            .iter()
            .copied()
            .filter(|id| {
                let top = self.bounding_top(*id);
                let bottom = top + self.nodes[id.0].height;
                top < viewport_height && bottom >= 0.0
            })
            .collect()
    }

    // ==================== Traversal ====================

    fn child_elements(&self, element: ElementId) -> Vec<ElementId> {
        self.nodes[element.0]
            .content
            .iter()
            .filter_map(|content| match content {
                Content::Element(id) => Some(*id),
                Content::Text(_) => None,
            })
            .collect()
    }

    /// Pre-order traversal below `element`, excluding it.
    fn descendants(&self, element: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.child_elements(element).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.child_elements(id).into_iter().rev());
        }
        out
    }

    /// Every element attached to the tree, in document order.
    fn attached(&self) -> Vec<ElementId> {
        let mut all = vec![self.root];
        all.extend(self.descendants(self.root));
        all
    }

    fn ancestors(&self, element: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.nodes[element.0].parent, move |id| self.nodes[id.0].parent)
    }

    fn matches(&self, element: ElementId, query: &Query<'_>) -> bool {
        match query {
            Query::Class(class) => self.has_class(element, class),
            Query::Tag(tag) => self.nodes[element.0].tag.eq_ignore_ascii_case(tag),
            Query::HasAttributes(names) => names
                .iter()
                .all(|name| self.attribute(element, name).is_some()),
            Query::AttributePrefix { tag, name, prefix } => {
                self.nodes[element.0].tag.eq_ignore_ascii_case(tag)
                    && self
                        .attribute(element, name)
                        .is_some_and(|value| value.starts_with(prefix))
            }
            Query::Descendant { ancestor, target } => {
                self.matches(element, target)
                    && self.ancestors(element).any(|a| self.matches(a, ancestor))
            }
            Query::Any(queries) => queries.iter().any(|q| self.matches(element, q)),
        }
    }

    fn resolved_top(&self, element: ElementId) -> f64 {
        std::iter::once(element)
            .chain(self.ancestors(element))
            .find_map(|id| self.nodes[id.0].top)
            .unwrap_or(0.0)
    }
}

impl Document for MemoryDocument {
    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.attached()
            .into_iter()
            .find(|el| self.nodes[el.0].attributes.get("id").map(String::as_str) == Some(id))
    }

    fn query_all(&self, query: &Query<'_>) -> Vec<ElementId> {
        self.attached()
            .into_iter()
            .filter(|el| self.matches(*el, query))
            .collect()
    }

    fn query_within(&self, ancestor: ElementId, query: &Query<'_>) -> Vec<ElementId> {
        self.descendants(ancestor)
            .into_iter()
            .filter(|el| self.matches(*el, query))
            .collect()
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.body)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        node == ancestor || self.ancestors(node).any(|id| id == ancestor)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let node = &self.nodes[element.0];
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attributes.get(name).cloned()
    }

    fn text_content(&self, element: ElementId) -> String {
        self.nodes[element.0]
            .content
            .iter()
            .map(|content| match content {
                Content::Text(text) => text.clone(),
                Content::Element(id) => self.text_content(*id),
            })
            .collect()
    }

    fn set_text_content(&mut self, element: ElementId, text: &str) {
        for child in self.child_elements(element) {
            self.nodes[child.0].parent = None;
        }
        self.nodes[element.0].content = vec![Content::Text(text.to_string())];
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes[element.0].classes.iter().any(|c| c == class)
    }

    fn set_class(&mut self, element: ElementId, class: &str, on: bool) {
        let has = self.has_class(element, class);
        let classes = &mut self.nodes[element.0].classes;
        if on && !has {
            classes.push(class.to_string());
        } else if !on && has {
            classes.retain(|c| c != class);
        }
    }

    fn set_style_property(&mut self, element: ElementId, name: &str, value: &str) {
        if value.is_empty() {
            self.remove_style_property(element, name);
            return;
        }
        self.nodes[element.0]
            .style
            .insert(name.to_string(), value.to_string());
    }

    fn remove_style_property(&mut self, element: ElementId, name: &str) {
        self.nodes[element.0].style.remove(name);
    }

    fn set_document_language(&mut self, code: &str) {
        self.language = Some(code.to_string());
        self.nodes[self.root.0]
            .attributes
            .insert("lang".to_string(), code.to_string());
    }

    fn inject_style(&mut self, css: &str) {
        self.stylesheets.push(css.to_string());
        let style = self.append(self.head, ElementSpec::new("style"));
        self.nodes[style.0].content.push(Content::Text(css.to_string()));
    }

    fn offset_height(&self, element: ElementId) -> f64 {
        self.nodes[element.0].height
    }

    fn bounding_top(&self, element: ElementId) -> f64 {
        self.resolved_top(element) - self.scroll_y
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn smooth_scroll_to(&mut self, top: f64) {
        self.smooth_scrolls.push(top);
        self.scroll_y = top.max(0.0);
    }

    fn start_watching(&mut self, options: &WatchOptions) -> bool {
        if !self.watcher_supported {
            return false;
        }
        self.watch_options = Some(options.clone());
        true
    }

    fn observe(&mut self, element: ElementId) {
        if self.watch_options.is_some() {
            self.observed.insert(element);
        }
    }

    fn unobserve(&mut self, element: ElementId) {
        self.observed.remove(&element);
    }
}
