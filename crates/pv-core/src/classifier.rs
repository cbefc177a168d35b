//! Price-element heuristics and exclusion checks
//!
//! The classifier decides whether an element whose text matched a price
//! rule is a plausible atomic price element (a small, leaf-like label)
//! rather than a large container, and whether it sits in a region that is
//! never scanned (navigation, headers, date/phone fields).

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::PageDom;
use crate::types::{ElementMetrics, RejectReasons};

// =============================================================================
// Limits
// =============================================================================

/// Tunable thresholds separating price labels from containers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierLimits {
    /// Maximum rendered text length, in characters.
    pub max_text_len: usize,
    /// Maximum whitespace-separated word count.
    pub max_words: usize,
    /// Maximum direct child element count.
    pub max_children: usize,
    /// Maximum bounding box width, in CSS pixels.
    pub max_width: f64,
    /// Maximum bounding box height, in CSS pixels.
    pub max_height: f64,
}

impl Default for ClassifierLimits {
    fn default() -> Self {
        Self {
            max_text_len: 200,
            max_words: 10,
            max_children: 5,
            max_width: 500.0,
            max_height: 200.0,
        }
    }
}

/// Dates (`YYYY-MM-DD`, `DD/MM/YYYY`), bare 10-digit runs and phone-shaped
/// numbers. Text containing any of these is not a price label even when a
/// price rule also matched.
static NON_PRICE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{2}/[0-9]{2}/[0-9]{4}|[0-9]{10}|[0-9]{3}-[0-9]{3}-[0-9]{4}")
        .expect("non-price number regex")
});

// =============================================================================
// Classification
// =============================================================================

/// Run every heuristic and report all rejection reasons at once.
pub fn classify(text: &str, metrics: &ElementMetrics, limits: &ClassifierLimits) -> RejectReasons {
    let mut reasons = RejectReasons::empty();

    if text.chars().count() > limits.max_text_len {
        reasons |= RejectReasons::TEXT_TOO_LONG;
    }
    if text.split_whitespace().count() > limits.max_words {
        reasons |= RejectReasons::TOO_MANY_WORDS;
    }
    if metrics.child_count > limits.max_children {
        reasons |= RejectReasons::TOO_MANY_CHILDREN;
    }
    if metrics.width > limits.max_width || metrics.height > limits.max_height {
        reasons |= RejectReasons::BOX_TOO_LARGE;
    }
    if NON_PRICE_NUMBER.is_match(text) {
        reasons |= RejectReasons::NON_PRICE_NUMBER;
    }

    reasons
}

/// True iff no heuristic rejects the element.
pub fn qualifies(text: &str, metrics: &ElementMetrics, limits: &ClassifierLimits) -> bool {
    classify(text, metrics, limits).is_empty()
}

/// Whether the element or an ancestor matches any exclusion selector.
///
/// Selector evaluation failures are fail-open: a selector the host cannot
/// evaluate excludes nothing, and the scan continues.
pub fn is_excluded<D: PageDom>(dom: &D, element: &D::Element, selectors: &[&str]) -> bool {
    selectors.iter().any(|selector| {
        match dom.matches_within(element, selector) {
            Ok(matched) => matched,
            Err(err) => {
                log::debug!("exclusion selector '{selector}' failed: {err}");
                false
            }
        }
    })
}
