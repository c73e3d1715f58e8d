//! Document abstraction: the seam between the page components and a DOM.
//!
//! Components never talk to a browser directly. They receive a [`Document`],
//! which locates elements, mutates them, and exposes the viewport and the
//! intersection watcher. Two backends exist:
//!
//! - [`MemoryDocument`]: an in-memory element tree used by tests and by the
//!   preview binary
//! - `web::WebDocument`: the live page, behind the `web` feature

mod memory;

pub use memory::{ElementSpec, MemoryDocument};

/// Opaque handle to an element owned by a [`Document`].
///
/// Handles are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) usize);

/// A typed element query.
///
/// Queries are matched directly by the in-memory backend and rendered to a
/// CSS selector list by the browser backend (see [`Query::to_css`]).
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// Elements carrying a class, e.g. `.section`
    Class(&'a str),
    /// Elements with a tag name, e.g. `a`
    Tag(&'a str),
    /// Elements carrying every listed attribute, e.g. `[data-en][data-pt]`
    HasAttributes(&'a [&'a str]),
    /// Elements whose attribute starts with a prefix, e.g. `a[href^="#"]`
    AttributePrefix {
        tag: &'a str,
        name: &'a str,
        prefix: &'a str,
    },
    /// `target` elements that have an `ancestor` element above them
    Descendant {
        ancestor: &'a Query<'a>,
        target: &'a Query<'a>,
    },
    /// Union of several queries, results in document order
    Any(&'a [Query<'a>]),
}

impl Query<'_> {
    /// Render the query as a CSS selector list.
    pub fn to_css(&self) -> String {
        self.alternatives().join(", ")
    }

    /// Every alternative as a standalone compound selector.
    fn alternatives(&self) -> Vec<String> {
        match self {
            Query::Class(class) => vec![format!(".{}", class)],
            Query::Tag(tag) => vec![tag.to_string()],
            Query::HasAttributes(names) => {
                vec![names.iter().map(|name| format!("[{}]", name)).collect()]
            }
            Query::AttributePrefix { tag, name, prefix } => {
                vec![format!("{}[{}^=\"{}\"]", tag, name, prefix)]
            }
            Query::Descendant { ancestor, target } => {
                let targets = target.alternatives();
                ancestor
                    .alternatives()
                    .iter()
                    .flat_map(|a| targets.iter().map(move |t| format!("{} {}", a, t)))
                    .collect()
            }
            Query::Any(queries) => queries.iter().flat_map(|q| q.alternatives()).collect(),
        }
    }
}

/// Options of the viewport-intersection watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Fraction of the element that must be visible to count as intersecting
    pub threshold: f64,
    /// CSS margin around the root (viewport)
    pub root_margin: String,
}

/// One entry of an intersection batch delivered by the watcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub target: ElementId,
    pub is_intersecting: bool,
}

/// Element locator and mutation capability handed to every component.
///
/// All lookups are infallible from the caller's point of view: a missing
/// element is `None` or an empty list, never an error.
pub trait Document {
    // ==================== Lookup ====================

    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// All matching elements in document order.
    fn query_all(&self, query: &Query<'_>) -> Vec<ElementId>;

    /// Matching descendants of `ancestor` (excluding itself), in document order.
    fn query_within(&self, ancestor: ElementId, query: &Query<'_>) -> Vec<ElementId>;

    fn body(&self) -> Option<ElementId>;

    /// Inclusive containment, like `Node.contains`.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    // ==================== Content ====================

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn text_content(&self, element: ElementId) -> String;

    /// Replace all children of the element with a single text node.
    fn set_text_content(&mut self, element: ElementId, text: &str);

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Add the class when `on` is true, remove it otherwise.
    fn set_class(&mut self, element: ElementId, class: &str, on: bool);

    fn set_style_property(&mut self, element: ElementId, name: &str, value: &str);

    fn remove_style_property(&mut self, element: ElementId, name: &str);

    /// Set the `lang` attribute of the document root.
    fn set_document_language(&mut self, code: &str);

    /// Append a global stylesheet to the document head.
    fn inject_style(&mut self, css: &str);

    // ==================== Layout & viewport ====================

    /// Rendered height of the element, in CSS pixels.
    fn offset_height(&self, element: ElementId) -> f64;

    /// Top edge of the element relative to the viewport.
    fn bounding_top(&self, element: ElementId) -> f64;

    /// Current vertical scroll offset of the page.
    fn scroll_y(&self) -> f64;

    /// Smoothly scroll the page to `top`.
    fn smooth_scroll_to(&mut self, top: f64);

    // ==================== Intersection watcher ====================

    /// Create the page's intersection watcher. Called once per page.
    ///
    /// Returns `false` when the page cannot provide one; `observe` and
    /// `unobserve` then do nothing.
    fn start_watching(&mut self, options: &WatchOptions) -> bool;

    fn observe(&mut self, element: ElementId);

    fn unobserve(&mut self, element: ElementId);
}
