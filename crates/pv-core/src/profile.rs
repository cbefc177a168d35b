//! Per-site configuration derived from the page hostname
//!
//! A profile is computed once per page load and never mutated. Detection is
//! deliberately coarse: a list of known e-commerce domains plus generic
//! hostname hints. A hostname that resolves to no profile disables the
//! engine entirely for that page.

use crate::rules::{price_rules, PriceRule};

// =============================================================================
// Detection Tables
// =============================================================================

/// Known e-commerce domains, matched as hostname substrings.
const ECOMMERCE_DOMAINS: &[&str] = &[
    "amazon",
    "flipkart",
    "myntra",
    "ajio",
    "nykaa",
    "meesho",
    "ebay",
    "walmart",
    "target",
    "bestbuy",
    "costco",
    "homedepot",
    "shopify",
    "woocommerce",
    "magento",
    "bigcommerce",
    "alibaba",
    "aliexpress",
    "etsy",
    "overstock",
    "wayfair",
];

/// Generic hostname hints that suggest a shopping site.
const HOSTNAME_HINTS: &[&str] = &["shop", "store", "buy", "cart", "mall"];

/// Friendly display names for the well-known sites.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("amazon", "Amazon"),
    ("flipkart", "Flipkart"),
    ("myntra", "Myntra"),
    ("ajio", "Ajio"),
    ("nykaa", "Nykaa"),
    ("ebay", "eBay"),
    ("walmart", "Walmart"),
    ("target", "Target"),
    ("meesho", "Meesho"),
];

/// Structural regions and attribute hints that never contain hideable
/// prices. Evaluated against an element and all of its ancestors.
const EXCLUSION_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    ".breadcrumb",
    ".navigation",
    ".menu",
    ".header",
    ".footer",
    "[class*=\"date\"]",
    "[class*=\"time\"]",
    "[class*=\"phone\"]",
    "[class*=\"zip\"]",
    "[class*=\"postal\"]",
];

// =============================================================================
// Site Profile
// =============================================================================

/// Read-only configuration for the current page.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Whether the hostname looked like an e-commerce site.
    pub is_ecommerce: bool,
    /// Normalized (lowercased) hostname the profile was derived from.
    pub domain: String,
    /// Friendly site name shown in the popup.
    pub display_name: String,
    /// Ordered price rules active for this page.
    pub rules: &'static [PriceRule],
    /// Selectors whose subtrees are never scanned for prices.
    pub exclusion_selectors: &'static [&'static str],
}

/// Derive the profile for a hostname. `None` means the page is not treated
/// as e-commerce and the engine stays idle for its whole lifetime.
pub fn detect_profile(hostname: &str) -> Option<SiteProfile> {
    let hostname = hostname.trim().to_lowercase();
    if hostname.is_empty() {
        return None;
    }

    let is_ecommerce = ECOMMERCE_DOMAINS.iter().any(|d| hostname.contains(d))
        || HOSTNAME_HINTS.iter().any(|h| hostname.contains(h));
    if !is_ecommerce {
        return None;
    }

    Some(SiteProfile {
        is_ecommerce: true,
        display_name: display_name(&hostname),
        domain: hostname,
        rules: price_rules(),
        exclusion_selectors: EXCLUSION_SELECTORS,
    })
}

/// Friendly name for a hostname: the known-site table first, otherwise the
/// first DNS label with its first letter upper-cased.
fn display_name(hostname: &str) -> String {
    for (needle, name) in DISPLAY_NAMES {
        if hostname.contains(needle) {
            return (*name).to_string();
        }
    }

    let label = hostname.split('.').next().unwrap_or(hostname);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_domains_resolve() {
        let profile = detect_profile("www.amazon.in").expect("amazon is supported");
        assert!(profile.is_ecommerce);
        assert_eq!(profile.domain, "www.amazon.in");
        assert_eq!(profile.display_name, "Amazon");
        assert!(!profile.rules.is_empty());
        assert!(!profile.exclusion_selectors.is_empty());
    }

    #[test]
    fn test_hostname_hints_resolve() {
        assert!(detect_profile("myshop.example").is_some());
        assert!(detect_profile("MEGA-STORE.example").is_some());
        assert!(detect_profile("books.buynow.example").is_some());
    }

    #[test]
    fn test_unsupported_hosts() {
        assert!(detect_profile("news.example").is_none());
        assert!(detect_profile("en.wikipedia.org").is_none());
        assert!(detect_profile("").is_none());
        assert!(detect_profile("   ").is_none());
    }

    #[test]
    fn test_display_name_fallback_capitalizes() {
        let profile = detect_profile("bookstore.example").expect("hint match");
        assert_eq!(profile.display_name, "Bookstore");
    }

    #[test]
    fn test_display_name_prefers_known_table() {
        let profile = detect_profile("smile.amazon.co.uk").expect("amazon");
        assert_eq!(profile.display_name, "Amazon");
    }
}
