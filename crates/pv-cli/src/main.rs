//! PriceVeil CLI
//!
//! Developer tool for exercising the detection pipeline offline: match
//! texts against the rule table, resolve site profiles, classify element
//! shapes, and run the full engine over a saved HTML page.

use std::fs;

use clap::{Parser, Subcommand};
use serde::Serialize;

use pv_core::classifier::{classify, ClassifierLimits};
use pv_core::engine::{Engine, NullScheduler};
use pv_core::profile::detect_profile;
use pv_core::rules::{find_price, RuleKind};
use pv_core::types::ElementMetrics;
use pv_core::PageDom;

mod static_dom;

use static_dom::StaticDom;

#[derive(Parser)]
#[command(name = "pv-cli")]
#[command(about = "PriceVeil detection and scanning tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a text against the price rule table
    Match {
        /// Text to test
        text: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Resolve the site profile for a hostname
    Profile {
        /// Hostname to resolve
        hostname: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Run the price-element heuristics on a text with synthetic metrics
    Classify {
        /// Text to classify
        text: String,

        /// Bounding box width in pixels
        #[arg(long, default_value_t = 0.0)]
        width: f64,

        /// Bounding box height in pixels
        #[arg(long, default_value_t = 0.0)]
        height: f64,

        /// Direct child element count
        #[arg(long, default_value_t = 0)]
        children: usize,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Scan a saved HTML page with the real engine and report what it hides
    Scan {
        /// HTML file to scan
        input: String,

        /// Hostname the page was saved from
        #[arg(short = 'H', long)]
        host: String,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Match { text, json } => cmd_match(&text, json),
        Commands::Profile { hostname, json } => cmd_profile(&hostname, json),
        Commands::Classify {
            text,
            width,
            height,
            children,
            json,
        } => cmd_classify(&text, width, height, children, json),
        Commands::Scan { input, host, json } => cmd_scan(&input, &host, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Serialize)]
struct MatchReport<'a> {
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Serialize)]
struct ProfileReport<'a> {
    supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_count: Option<usize>,
}

#[derive(Serialize)]
struct ClassifyReport {
    qualifies: bool,
    reject_reasons: Vec<&'static str>,
}

#[derive(Serialize)]
struct HiddenElementReport {
    key: u64,
    tag: String,
    text: String,
    kind: &'static str,
    currency: String,
}

#[derive(Serialize)]
struct ScanReport {
    site: String,
    candidates: usize,
    hidden: Vec<HiddenElementReport>,
}

fn kind_label(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::CurrencySymbol => "currency-symbol",
        RuleKind::CurrencyCode => "currency-code",
        RuleKind::Abbreviation => "abbreviation",
        RuleKind::Promotional => "promotional",
        RuleKind::Labeled => "labeled",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize report: {e}"))?;
    println!("{out}");
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_match(text: &str, json: bool) -> Result<(), String> {
    let hit = find_price(text);
    if json {
        return print_json(&MatchReport {
            matched: hit.is_some(),
            kind: hit.map(|h| kind_label(h.kind)),
            currency: hit.map(|h| h.currency),
            text: hit.map(|h| h.text),
        });
    }

    match hit {
        Some(hit) => {
            println!("Matched: '{}'", hit.text);
            println!("  Kind:      {}", kind_label(hit.kind));
            if !hit.currency.is_empty() {
                println!("  Currency:  {}", hit.currency);
            }
        }
        None => println!("No price pattern found"),
    }
    Ok(())
}

fn cmd_profile(hostname: &str, json: bool) -> Result<(), String> {
    let profile = detect_profile(hostname);
    if json {
        return print_json(&ProfileReport {
            supported: profile.is_some(),
            domain: profile.as_ref().map(|p| p.domain.as_str()),
            display_name: profile.as_ref().map(|p| p.display_name.as_str()),
            rule_count: profile.as_ref().map(|p| p.rules.len()),
        });
    }

    match profile {
        Some(profile) => {
            println!("Site '{hostname}' is supported");
            println!("  Name:       {}", profile.display_name);
            println!("  Domain:     {}", profile.domain);
            println!("  Rules:      {}", profile.rules.len());
            println!("  Exclusions: {}", profile.exclusion_selectors.len());
        }
        None => println!("Site '{hostname}' is not treated as e-commerce"),
    }
    Ok(())
}

fn cmd_classify(
    text: &str,
    width: f64,
    height: f64,
    children: usize,
    json: bool,
) -> Result<(), String> {
    let metrics = ElementMetrics {
        width,
        height,
        child_count: children,
    };
    let reasons = classify(text, &metrics, &ClassifierLimits::default());

    if json {
        return print_json(&ClassifyReport {
            qualifies: reasons.is_empty(),
            reject_reasons: reasons.labels(),
        });
    }

    if reasons.is_empty() {
        println!("Qualifies as a price element");
    } else {
        println!("Rejected:");
        for label in reasons.labels() {
            println!("  - {label}");
        }
    }
    Ok(())
}

fn cmd_scan(input: &str, host: &str, json: bool) -> Result<(), String> {
    let html = fs::read_to_string(input).map_err(|e| format!("Failed to read '{input}': {e}"))?;

    let profile =
        detect_profile(host).ok_or_else(|| format!("'{host}' is not treated as e-commerce"))?;
    let site = profile.display_name.clone();

    let dom = StaticDom::parse(&html);
    let candidates = dom.candidates().len();

    let mut engine = Engine::new(dom.clone(), NullScheduler, Some(profile));
    engine.activate();

    let hidden: Vec<HiddenElementReport> = dom
        .marked_elements()
        .iter()
        .map(|id| {
            let text = dom.text(id).trim().to_string();
            let hit = find_price(&text);
            let kind = hit.map(|h| kind_label(h.kind)).unwrap_or("unknown");
            let currency = hit.map(|h| h.currency.to_string()).unwrap_or_default();
            HiddenElementReport {
                key: dom.element_key(id),
                tag: dom.tag_name(*id),
                text,
                kind,
                currency,
            }
        })
        .collect();

    if json {
        return print_json(&ScanReport {
            site,
            candidates,
            hidden,
        });
    }

    println!("Scanned '{input}' as {site}");
    println!("  Candidates: {candidates}");
    println!("  Hidden:     {}", hidden.len());
    for element in &hidden {
        println!(
            "    <{}> [{}{}] {}",
            element.tag,
            element.kind,
            if element.currency.is_empty() {
                String::new()
            } else {
                format!(" {}", element.currency)
            },
            element.text
        );
    }
    Ok(())
}
