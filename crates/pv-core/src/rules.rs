//! Price pattern rules and text matching
//!
//! The rule table is compiled once at startup. Each rule pairs a regex with
//! the currency/format category it detects; order decides only which rule
//! reports a hit first, never whether a text matches at all.
//!
//! Rust's `Regex` keeps no match-position state between calls, so repeated
//! invocations over the same rule are naturally independent.

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Rule Definitions
// =============================================================================

/// Format category a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Currency symbol prefix (₹, $, €, £, ¥)
    CurrencySymbol,
    /// Three-letter currency code prefix (INR, USD, ...)
    CurrencyCode,
    /// Abbreviated notation ("Rs." / "Rs")
    Abbreviation,
    /// Promotional phrase ("1,234.56 only/off/save/discount")
    Promotional,
    /// Labeled amount ("price: 1,234")
    Labeled,
}

/// A single compiled price detection rule.
#[derive(Debug)]
pub struct PriceRule {
    pub kind: RuleKind,
    /// ISO currency the rule implies, empty for currency-neutral rules.
    pub currency: &'static str,
    pub pattern: Regex,
}

/// Grouped decimal number: digits with comma grouping, up to two decimals.
const NUM: &str = r"[0-9][0-9,]*(?:\.[0-9]{1,2})?";

/// Raw rule table: (kind, currency, pattern). Symbol rules are
/// case-sensitive, code/abbreviation/phrase rules are not.
const RULE_SPECS: &[(RuleKind, &str, &str)] = &[
    // Indian Rupee
    (RuleKind::CurrencySymbol, "INR", r"₹\s*"),
    (RuleKind::Abbreviation, "INR", r"(?i)Rs\.?\s*"),
    (RuleKind::CurrencyCode, "INR", r"(?i)INR\s*"),
    // US Dollar
    (RuleKind::CurrencySymbol, "USD", r"\$\s*"),
    (RuleKind::CurrencyCode, "USD", r"(?i)USD\s*"),
    // Euro
    (RuleKind::CurrencySymbol, "EUR", r"€\s*"),
    (RuleKind::CurrencyCode, "EUR", r"(?i)EUR\s*"),
    // British Pound
    (RuleKind::CurrencySymbol, "GBP", r"£\s*"),
    (RuleKind::CurrencyCode, "GBP", r"(?i)GBP\s*"),
    // Yen / Yuan
    (RuleKind::CurrencySymbol, "JPY", r"¥\s*"),
    (RuleKind::CurrencyCode, "JPY", r"(?i)JPY\s*"),
    (RuleKind::CurrencyCode, "CNY", r"(?i)CNY\s*"),
];

static RULES: LazyLock<Vec<PriceRule>> = LazyLock::new(|| {
    let mut rules: Vec<PriceRule> = RULE_SPECS
        .iter()
        .map(|&(kind, currency, prefix)| PriceRule {
            kind,
            currency,
            pattern: Regex::new(&format!("{prefix}{NUM}")).expect("price rule regex"),
        })
        .collect();

    // Currency-neutral rules: promotional phrases and labeled amounts.
    rules.push(PriceRule {
        kind: RuleKind::Promotional,
        currency: "",
        pattern: Regex::new(r"(?i)[0-9][0-9,]*\.[0-9]{2}\s*(?:only|off|save|discount)")
            .expect("promotional rule regex"),
    });
    rules.push(PriceRule {
        kind: RuleKind::Labeled,
        currency: "",
        pattern: Regex::new(&format!(r"(?i)(?:price|cost|amount):\s*{NUM}"))
            .expect("labeled rule regex"),
    });

    rules
});

/// The full ordered rule table.
pub fn price_rules() -> &'static [PriceRule] {
    RULES.as_slice()
}

// =============================================================================
// Matching
// =============================================================================

/// First rule hit in a text, with the matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceMatch<'a> {
    pub kind: RuleKind,
    pub currency: &'static str,
    /// The matched substring.
    pub text: &'a str,
}

/// True iff any rule in `rules` matches anywhere in `text`.
pub fn matches_any(rules: &[PriceRule], text: &str) -> bool {
    rules.iter().any(|rule| rule.pattern.is_match(text))
}

/// True iff any rule of the universal table matches anywhere in `text`.
pub fn matches_price(text: &str) -> bool {
    matches_any(price_rules(), text)
}

/// First hit of the universal table in `text`, in rule order.
pub fn find_price(text: &str) -> Option<PriceMatch<'_>> {
    price_rules().iter().find_map(|rule| {
        rule.pattern.find(text).map(|m| PriceMatch {
            kind: rule.kind,
            currency: rule.currency,
            text: m.as_str(),
        })
    })
}
