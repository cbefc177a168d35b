//! Shared type definitions for PriceVeil
//!
//! These types cross the seams between the engine, the classifier and the
//! host DOM adapters.

use thiserror::Error;

// =============================================================================
// Style Snapshot
// =============================================================================

/// The six inline style properties the engine tracks for exact restoration.
///
/// A snapshot is taken from an element immediately before it is hidden and
/// reapplied verbatim on restore. An empty string means "no inline value":
/// adapters must clear the property rather than set it to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSnapshot {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub height: String,
    pub width: String,
    pub overflow: String,
}

impl StyleSnapshot {
    /// The tracked property names, in snapshot field order.
    pub const PROPERTIES: [&'static str; 6] = [
        "display",
        "visibility",
        "opacity",
        "height",
        "width",
        "overflow",
    ];

    /// The snapshot applied to hide an element: fully invisible and
    /// zero-sized while staying in the document. Over-constrained on
    /// purpose; `display: none` alone is not enough in some embedding
    /// contexts.
    pub fn hidden() -> Self {
        Self {
            display: "none".into(),
            visibility: "hidden".into(),
            opacity: "0".into(),
            height: "0".into(),
            width: "0".into(),
            overflow: "hidden".into(),
        }
    }

    /// Read a tracked property by name.
    pub fn get(&self, property: &str) -> Option<&str> {
        match property {
            "display" => Some(&self.display),
            "visibility" => Some(&self.visibility),
            "opacity" => Some(&self.opacity),
            "height" => Some(&self.height),
            "width" => Some(&self.width),
            "overflow" => Some(&self.overflow),
            _ => None,
        }
    }

    /// Set a tracked property by name. Unknown names are ignored.
    pub fn set(&mut self, property: &str, value: String) {
        match property {
            "display" => self.display = value,
            "visibility" => self.visibility = value,
            "opacity" => self.opacity = value,
            "height" => self.height = value,
            "width" => self.width = value,
            "overflow" => self.overflow = value,
            _ => {}
        }
    }
}

// =============================================================================
// Element Metrics
// =============================================================================

/// Layout and structure measurements for a candidate element.
///
/// Adapters without a layout engine (the static CLI scanner) report zero
/// sizes; the size heuristics then pass and only the text heuristics apply.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementMetrics {
    /// Bounding box width in CSS pixels.
    pub width: f64,
    /// Bounding box height in CSS pixels.
    pub height: f64,
    /// Number of direct child elements.
    pub child_count: usize,
}

// =============================================================================
// Reject Reasons
// =============================================================================

bitflags::bitflags! {
    /// Why the classifier refused to treat an element as a price element.
    ///
    /// An empty set means the element qualifies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RejectReasons: u8 {
        /// Rendered text longer than the text-length limit
        const TEXT_TOO_LONG = 1 << 0;
        /// More whitespace-separated words than the word limit
        const TOO_MANY_WORDS = 1 << 1;
        /// More direct child elements than the child limit
        const TOO_MANY_CHILDREN = 1 << 2;
        /// Bounding box exceeds the width or height limit
        const BOX_TOO_LARGE = 1 << 3;
        /// Text contains a date, 10-digit or phone-shaped number
        const NON_PRICE_NUMBER = 1 << 4;
    }
}

impl RejectReasons {
    /// Human-readable labels for each set flag, for diagnostics output.
    pub fn labels(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(Self::TEXT_TOO_LONG) {
            out.push("text-too-long");
        }
        if self.contains(Self::TOO_MANY_WORDS) {
            out.push("too-many-words");
        }
        if self.contains(Self::TOO_MANY_CHILDREN) {
            out.push("too-many-children");
        }
        if self.contains(Self::BOX_TOO_LARGE) {
            out.push("box-too-large");
        }
        if self.contains(Self::NON_PRICE_NUMBER) {
            out.push("non-price-number");
        }
        out
    }
}

// =============================================================================
// Engine Status
// =============================================================================

/// Snapshot of the engine state reported to the popup UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// Whether the engine is actively scanning and hiding.
    pub active: bool,
    /// Friendly site name, `None` on unsupported sites.
    pub site: Option<String>,
}

// =============================================================================
// DOM Errors
// =============================================================================

/// Failure reported by a DOM adapter.
///
/// All of these are fail-open at the call sites: a selector that cannot be
/// evaluated never excludes an element and never aborts a scan.
#[derive(Debug, Error)]
pub enum DomError {
    /// A selector could not be parsed or evaluated.
    #[error("invalid selector '{0}'")]
    Selector(String),

    /// The element is no longer attached to the document.
    #[error("element is detached from the document")]
    Detached,

    /// Adapter-specific failure.
    #[error("{0}")]
    Adapter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_snapshot_values() {
        let snap = StyleSnapshot::hidden();
        assert_eq!(snap.display, "none");
        assert_eq!(snap.visibility, "hidden");
        assert_eq!(snap.opacity, "0");
        assert_eq!(snap.height, "0");
        assert_eq!(snap.width, "0");
        assert_eq!(snap.overflow, "hidden");
    }

    #[test]
    fn test_snapshot_get_set_round_trip() {
        let mut snap = StyleSnapshot::default();
        for prop in StyleSnapshot::PROPERTIES {
            assert_eq!(snap.get(prop), Some(""));
            snap.set(prop, format!("{prop}-value"));
        }
        for prop in StyleSnapshot::PROPERTIES {
            assert_eq!(snap.get(prop), Some(format!("{prop}-value").as_str()));
        }
        assert_eq!(snap.get("color"), None);
    }

    #[test]
    fn test_reject_reason_labels() {
        assert!(RejectReasons::empty().labels().is_empty());
        let reasons = RejectReasons::TEXT_TOO_LONG | RejectReasons::BOX_TOO_LARGE;
        assert_eq!(reasons.labels(), vec!["text-too-long", "box-too-large"]);
    }
}
