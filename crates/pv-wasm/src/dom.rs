//! Live-document adapter over `web-sys`
//!
//! Markers are a CSS class, element keys are stamped into a data attribute
//! on first use. Both survive on the element itself, so the engine's record
//! table never has to hold an element reference.

use std::cell::Cell;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use pv_core::dom::{PageDom, CANDIDATE_SELECTOR};
use pv_core::types::{DomError, ElementMetrics, StyleSnapshot};

/// Class marking an element as hidden by the engine.
pub const MARKER_CLASS: &str = "pv-price-hidden";

/// Attribute carrying the engine-assigned element key.
const KEY_ATTR: &str = "data-pv-key";

/// [`PageDom`] over the window's live document.
pub struct WebDom {
    document: Document,
    next_key: Cell<u64>,
}

impl WebDom {
    /// Adapter for the current window's document.
    pub fn for_window() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| DomError::Adapter("no window document".into()))?;
        Ok(Self {
            document,
            next_key: Cell::new(1),
        })
    }

    fn query(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(list.length() as usize);
        for i in 0..list.length() {
            if let Some(node) = list.get(i) {
                if let Ok(element) = node.dyn_into::<Element>() {
                    out.push(element);
                }
            }
        }
        out
    }
}

impl PageDom for WebDom {
    type Element = Element;

    fn candidates(&self) -> Vec<Element> {
        self.query(CANDIDATE_SELECTOR)
    }

    fn element_key(&self, element: &Element) -> u64 {
        if let Some(key) = element
            .get_attribute(KEY_ATTR)
            .and_then(|v| v.parse::<u64>().ok())
        {
            return key;
        }
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        let _ = element.set_attribute(KEY_ATTR, &key.to_string());
        key
    }

    fn text(&self, element: &Element) -> String {
        // innerText gives rendered text; fall back for non-HTML elements.
        match element.dyn_ref::<web_sys::HtmlElement>() {
            Some(html) => html.inner_text(),
            None => element.text_content().unwrap_or_default(),
        }
    }

    fn metrics(&self, element: &Element) -> ElementMetrics {
        let rect = element.get_bounding_client_rect();
        ElementMetrics {
            width: rect.width(),
            height: rect.height(),
            child_count: element.child_element_count() as usize,
        }
    }

    fn matches_within(&self, element: &Element, selector: &str) -> Result<bool, DomError> {
        let own = element
            .matches(selector)
            .map_err(|_| DomError::Selector(selector.to_string()))?;
        if own {
            return Ok(true);
        }
        let ancestor = element
            .closest(selector)
            .map_err(|_| DomError::Selector(selector.to_string()))?;
        Ok(ancestor.is_some())
    }

    fn read_styles(&self, element: &Element) -> StyleSnapshot {
        let mut snapshot = StyleSnapshot::default();
        if let Some(html) = element.dyn_ref::<web_sys::HtmlElement>() {
            let style = html.style();
            for property in StyleSnapshot::PROPERTIES {
                let value = style.get_property_value(property).unwrap_or_default();
                snapshot.set(property, value);
            }
        }
        snapshot
    }

    fn apply_styles(&self, element: &Element, styles: &StyleSnapshot) {
        let Some(html) = element.dyn_ref::<web_sys::HtmlElement>() else {
            return;
        };
        let style = html.style();
        for property in StyleSnapshot::PROPERTIES {
            match styles.get(property) {
                // Empty string means "no inline value": clear it.
                Some("") | None => {
                    let _ = style.remove_property(property);
                }
                Some(value) => {
                    let _ = style.set_property(property, value);
                }
            }
        }
    }

    fn set_marker(&self, element: &Element, hidden: bool) {
        let list = element.class_list();
        let _ = if hidden {
            list.add_1(MARKER_CLASS)
        } else {
            list.remove_1(MARKER_CLASS)
        };
    }

    fn has_marker(&self, element: &Element) -> bool {
        element.class_list().contains(MARKER_CLASS)
    }

    fn marked_elements(&self) -> Vec<Element> {
        self.query(&format!(".{MARKER_CLASS}"))
    }
}
