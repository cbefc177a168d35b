//! Page abstraction the engine operates on
//!
//! The engine never touches a concrete DOM API. Hosts implement [`PageDom`]
//! over whatever document representation they have: `web-sys` elements in
//! the wasm bindings, a parsed HTML tree in the CLI, plain structs in tests.
//! All methods take `&self`; adapters that mutate (styles, markers) use
//! interior mutability or the underlying platform's own mutability.

use crate::types::{DomError, ElementMetrics, StyleSnapshot};

/// Element kinds worth scanning: small inline/text-bearing containers.
/// Scanning every element wastes work and promotes large containers into
/// false positives.
pub const CANDIDATE_TAGS: &[&str] = &[
    "div", "span", "p", "td", "th", "li", "a", "strong", "b", "em", "i",
];

/// The candidate universe as a single CSS selector group.
pub const CANDIDATE_SELECTOR: &str = "div, span, p, td, th, li, a, strong, b, em, i";

/// A document the engine can scan and mutate.
pub trait PageDom {
    /// Handle to one element. Cheap to clone; holding one must not keep a
    /// removed element alive beyond what the host platform already does.
    type Element: Clone;

    /// Enumerate the current candidate elements, in document order.
    fn candidates(&self) -> Vec<Self::Element>;

    /// Stable identity key for an element, assigned on first request.
    /// Keys are never reused within a page lifetime.
    fn element_key(&self, element: &Self::Element) -> u64;

    /// Rendered text of the element's subtree.
    fn text(&self, element: &Self::Element) -> String;

    /// Layout and structure measurements.
    fn metrics(&self, element: &Self::Element) -> ElementMetrics;

    /// Whether the element or any of its ancestors matches `selector`.
    /// Errors are reported, never swallowed here; callers decide the
    /// fail-open policy.
    fn matches_within(&self, element: &Self::Element, selector: &str) -> Result<bool, DomError>;

    /// Current inline values of the six tracked style properties.
    fn read_styles(&self, element: &Self::Element) -> StyleSnapshot;

    /// Apply all six tracked properties. Empty strings clear the inline
    /// property rather than setting an empty value.
    fn apply_styles(&self, element: &Self::Element, styles: &StyleSnapshot);

    /// Set or clear the hidden marker on an element.
    fn set_marker(&self, element: &Self::Element, hidden: bool);

    /// Whether the element currently carries the hidden marker.
    fn has_marker(&self, element: &Self::Element) -> bool;

    /// Every element currently carrying the hidden marker.
    fn marked_elements(&self) -> Vec<Self::Element>;
}
