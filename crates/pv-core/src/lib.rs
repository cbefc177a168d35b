//! PriceVeil Core Library
//!
//! This crate provides the detection and hide/restore engine for the
//! PriceVeil content script. It is host-agnostic: everything that touches a
//! real page goes through the [`dom::PageDom`] and [`engine::ScanScheduler`]
//! trait seams, so the same engine runs against a live document (via the
//! wasm bindings), a statically parsed HTML file (via the CLI), or an
//! in-memory mock (in tests).
//!
//! # Architecture
//!
//! The engine is a two-state machine (Inactive/Active). On activation it
//! performs one full scan-and-hide pass and starts the host's mutation
//! subscription and interval re-scan; on deactivation it restores every
//! hidden element from its recorded inline styles and clears all tracking.
//!
//! # Modules
//!
//! - `rules`: price pattern rules and text matching
//! - `profile`: per-site configuration derived from the hostname
//! - `classifier`: price-element heuristics and exclusion checks
//! - `dom`: the page abstraction the engine operates on
//! - `engine`: the hide/restore state machine
//! - `types`: shared type definitions

pub mod classifier;
pub mod dom;
pub mod engine;
pub mod profile;
pub mod rules;
pub mod types;

// Re-export commonly used types
pub use classifier::ClassifierLimits;
pub use dom::PageDom;
pub use engine::{Engine, ScanScheduler, DEBOUNCE_DELAY_MS, RESCAN_INTERVAL_MS};
pub use profile::{detect_profile, SiteProfile};
pub use rules::{find_price, matches_price, PriceMatch, PriceRule, RuleKind};
pub use types::{DomError, ElementMetrics, EngineStatus, RejectReasons, StyleSnapshot};
