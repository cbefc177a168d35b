//! Static-document adapter over a parsed HTML file
//!
//! Lets the real engine run against saved product pages without a browser.
//! There is no layout, so sizes report as zero and only the text heuristics
//! apply; style mutations land in side tables instead of the parsed tree.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use pv_core::dom::{PageDom, CANDIDATE_TAGS};
use pv_core::types::{DomError, ElementMetrics, StyleSnapshot};

struct StaticInner {
    html: Html,
    keys: RefCell<HashMap<NodeId, u64>>,
    next_key: RefCell<u64>,
    styles: RefCell<HashMap<NodeId, StyleSnapshot>>,
    marked: RefCell<HashSet<NodeId>>,
}

/// [`PageDom`] over a parsed HTML document. Clones share the document and
/// its mutation state, so callers can inspect what the engine did.
#[derive(Clone)]
pub struct StaticDom {
    inner: Rc<StaticInner>,
}

impl StaticDom {
    pub fn parse(html: &str) -> Self {
        Self {
            inner: Rc::new(StaticInner {
                html: Html::parse_document(html),
                keys: RefCell::new(HashMap::new()),
                next_key: RefCell::new(1),
                styles: RefCell::new(HashMap::new()),
                marked: RefCell::new(HashSet::new()),
            }),
        }
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.inner.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Tag name of an element, for reporting.
    pub fn tag_name(&self, id: NodeId) -> String {
        self.element(id)
            .map(|el| el.value().name().to_string())
            .unwrap_or_default()
    }
}

/// Pull one tracked property out of a raw `style="..."` attribute.
fn inline_property(style_attr: &str, property: &str) -> String {
    for declaration in style_attr.split(';') {
        if let Some((name, value)) = declaration.split_once(':') {
            if name.trim().eq_ignore_ascii_case(property) {
                return value.trim().to_string();
            }
        }
    }
    String::new()
}

impl PageDom for StaticDom {
    type Element = NodeId;

    fn candidates(&self) -> Vec<NodeId> {
        self.inner
            .html
            .root_element()
            .descendants()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|el| CANDIDATE_TAGS.contains(&el.name()))
            })
            .map(|node| node.id())
            .collect()
    }

    fn element_key(&self, element: &NodeId) -> u64 {
        if let Some(key) = self.inner.keys.borrow().get(element) {
            return *key;
        }
        let mut next = self.inner.next_key.borrow_mut();
        let key = *next;
        *next += 1;
        self.inner.keys.borrow_mut().insert(*element, key);
        key
    }

    fn text(&self, element: &NodeId) -> String {
        self.element(*element)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    fn metrics(&self, element: &NodeId) -> ElementMetrics {
        let child_count = self
            .element(*element)
            .map(|el| el.children().filter(|c| c.value().is_element()).count())
            .unwrap_or(0);
        // No layout engine: sizes are unknown and report as zero.
        ElementMetrics {
            width: 0.0,
            height: 0.0,
            child_count,
        }
    }

    fn matches_within(&self, element: &NodeId, selector: &str) -> Result<bool, DomError> {
        let selector =
            Selector::parse(selector).map_err(|e| DomError::Selector(e.to_string()))?;
        let Some(el) = self.element(*element) else {
            return Err(DomError::Detached);
        };
        if selector.matches(&el) {
            return Ok(true);
        }
        for ancestor in el.ancestors() {
            if let Some(ancestor) = ElementRef::wrap(ancestor) {
                if selector.matches(&ancestor) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn read_styles(&self, element: &NodeId) -> StyleSnapshot {
        if let Some(snapshot) = self.inner.styles.borrow().get(element) {
            return snapshot.clone();
        }
        let mut snapshot = StyleSnapshot::default();
        if let Some(el) = self.element(*element) {
            if let Some(style_attr) = el.value().attr("style") {
                for property in StyleSnapshot::PROPERTIES {
                    snapshot.set(property, inline_property(style_attr, property));
                }
            }
        }
        snapshot
    }

    fn apply_styles(&self, element: &NodeId, styles: &StyleSnapshot) {
        self.inner
            .styles
            .borrow_mut()
            .insert(*element, styles.clone());
    }

    fn set_marker(&self, element: &NodeId, hidden: bool) {
        let mut marked = self.inner.marked.borrow_mut();
        if hidden {
            marked.insert(*element);
        } else {
            marked.remove(element);
        }
    }

    fn has_marker(&self, element: &NodeId) -> bool {
        self.inner.marked.borrow().contains(element)
    }

    fn marked_elements(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.inner.marked.borrow().iter().copied().collect();
        ids.sort_by_key(|id| self.element_key(id));
        ids
    }
}
