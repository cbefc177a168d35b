//! Hide/Restore Engine
//!
//! Two-state machine (Inactive/Active) owning the DOM adapter, the scan
//! scheduler, the activation flag and the hidden-element record table.
//! Every trigger — toggle, interval tick, debounced mutation re-scan —
//! funnels into the same scan pass, and every timer-driven entry point
//! re-checks the activation flag at fire time so a scan that fires after
//! deactivation hides nothing.

use std::collections::HashMap;

use crate::classifier::{self, ClassifierLimits};
use crate::dom::PageDom;
use crate::profile::SiteProfile;
use crate::rules;
use crate::types::{EngineStatus, StyleSnapshot};

/// Fixed interval between full re-scans while active.
pub const RESCAN_INTERVAL_MS: u32 = 2_000;

/// Quiet period before a mutation-triggered re-scan runs.
pub const DEBOUNCE_DELAY_MS: u32 = 100;

// =============================================================================
// Scheduler Seam
// =============================================================================

/// Host-side scheduling the engine starts and stops.
///
/// `start` begins the mutation subscription and the fixed-interval re-scan;
/// `stop` tears both down and cancels any pending debounced scan;
/// `schedule_rescan` arms (or re-arms, coalescing) the debounce timer.
/// Fired timers call back into the engine's `on_scan_due` /
/// `on_interval_tick` entry points.
pub trait ScanScheduler {
    fn start(&mut self);
    fn stop(&mut self);
    fn schedule_rescan(&mut self);
}

/// Scheduler for hosts without timers (the CLI's one-shot static scan).
pub struct NullScheduler;

impl ScanScheduler for NullScheduler {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn schedule_rescan(&mut self) {}
}

// =============================================================================
// Engine
// =============================================================================

/// The hide/restore engine for one page context.
pub struct Engine<D: PageDom, S: ScanScheduler> {
    dom: D,
    scheduler: S,
    profile: Option<SiteProfile>,
    limits: ClassifierLimits,
    active: bool,
    /// Original styles of currently hidden elements, keyed by element key.
    /// Holds no element handles, so removed elements are never kept alive.
    records: HashMap<u64, StyleSnapshot>,
}

impl<D: PageDom, S: ScanScheduler> Engine<D, S> {
    /// Create an engine for a page. A `None` profile permanently disables
    /// scanning; every operation then degrades to a logged no-op.
    pub fn new(dom: D, scheduler: S, profile: Option<SiteProfile>) -> Self {
        match &profile {
            Some(p) => log::info!("detected {} ({})", p.display_name, p.domain),
            None => log::info!("site not supported, engine idle"),
        }
        Self {
            dom,
            scheduler,
            profile,
            limits: ClassifierLimits::default(),
            active: false,
            records: HashMap::new(),
        }
    }

    /// Override the classifier thresholds.
    pub fn with_limits(mut self, limits: ClassifierLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn profile(&self) -> Option<&SiteProfile> {
        self.profile.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of elements currently tracked as hidden.
    pub fn hidden_count(&self) -> usize {
        self.records.len()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            active: self.active,
            site: self.profile.as_ref().map(|p| p.display_name.clone()),
        }
    }

    // -------------------------------------------------------------------------
    // State transitions
    // -------------------------------------------------------------------------

    /// Flip the activation state and report the new status.
    pub fn toggle(&mut self) -> EngineStatus {
        if self.active {
            self.deactivate();
        } else {
            self.activate();
        }
        self.status()
    }

    /// Rehydrate the persisted activation state at startup.
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.activate();
        } else {
            self.deactivate();
        }
    }

    /// Inactive → Active: one immediate full pass, then live updates.
    pub fn activate(&mut self) {
        if self.profile.is_none() {
            log::info!("activation ignored, site not supported");
            return;
        }
        if self.active {
            return;
        }
        self.active = true;
        let hidden = self.scan_and_hide();
        log::info!("activated, hid {hidden} price elements");
        self.scheduler.start();
    }

    /// Active → Inactive: restore everything, clear tracking, stop timers.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.restore_all();
        self.scheduler.stop();
        log::info!("deactivated, prices restored");
    }

    // -------------------------------------------------------------------------
    // Scanning
    // -------------------------------------------------------------------------

    /// One full pass over the candidate universe. Skips marked elements, so
    /// repeated passes over an unchanged document are no-ops. Returns the
    /// number of newly hidden elements.
    pub fn scan_and_hide(&mut self) -> usize {
        let Some(profile) = self.profile.as_ref() else {
            return 0;
        };

        let mut hidden = 0;
        for element in self.dom.candidates() {
            if self.dom.has_marker(&element) {
                continue;
            }
            if classifier::is_excluded(&self.dom, &element, profile.exclusion_selectors) {
                continue;
            }

            let text = self.dom.text(&element);
            if !rules::matches_any(profile.rules, &text) {
                continue;
            }
            let metrics = self.dom.metrics(&element);
            if !classifier::qualifies(&text, &metrics, &self.limits) {
                continue;
            }

            let key = self.dom.element_key(&element);
            // Never overwrite an existing record: it would capture the
            // hidden styles as "original".
            self.records
                .entry(key)
                .or_insert_with(|| self.dom.read_styles(&element));
            self.dom.set_marker(&element, true);
            self.dom.apply_styles(&element, &StyleSnapshot::hidden());
            hidden += 1;
        }

        if hidden > 0 {
            log::debug!("scan pass hid {hidden} new elements");
        }
        hidden
    }

    /// Debounced re-scan fired. The activation flag is checked here, at
    /// fire time: a scan scheduled before `deactivate()` hides nothing.
    pub fn on_scan_due(&mut self) {
        if !self.active {
            return;
        }
        self.scan_and_hide();
    }

    /// Fixed-interval re-scan fired.
    pub fn on_interval_tick(&mut self) {
        if !self.active {
            return;
        }
        self.scan_and_hide();
    }

    /// Cheap pre-filter over a newly added node's text. Schedules a
    /// debounced re-scan when the text might contain a price; returns
    /// whether one was scheduled.
    pub fn notify_added_text(&mut self, text: &str) -> bool {
        if !self.active {
            return false;
        }
        let Some(profile) = self.profile.as_ref() else {
            return false;
        };
        if !rules::matches_any(profile.rules, text) {
            return false;
        }
        self.scheduler.schedule_rescan();
        true
    }

    // -------------------------------------------------------------------------
    // Restoration
    // -------------------------------------------------------------------------

    /// Sweep every element currently carrying the hidden marker and restore
    /// it from its record, then drop all records. A marker without a record
    /// means something outside the engine tampered with the element; it is
    /// unmarked but its styles are left alone. Records whose element lost
    /// its marker externally are dropped with the table.
    fn restore_all(&mut self) {
        for element in self.dom.marked_elements() {
            let key = self.dom.element_key(&element);
            match self.records.remove(&key) {
                Some(snapshot) => {
                    self.dom.apply_styles(&element, &snapshot);
                    self.dom.set_marker(&element, false);
                }
                None => {
                    log::warn!("hidden marker without a style record (key {key})");
                    self.dom.set_marker(&element, false);
                }
            }
        }

        if !self.records.is_empty() {
            log::debug!("dropping {} orphaned style records", self.records.len());
        }
        self.records.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::detect_profile;
    use crate::types::{DomError, ElementMetrics};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockNode {
        tag: String,
        text: String,
        metrics: ElementMetrics,
        /// Exclusion selectors this node itself matches.
        selector_hits: Vec<String>,
        parent: Option<usize>,
        styles: StyleSnapshot,
        marked: bool,
    }

    #[derive(Default)]
    struct MockInner {
        nodes: Vec<MockNode>,
        /// Selectors whose evaluation fails with an error.
        failing_selectors: HashSet<String>,
    }

    /// In-memory document. Handles are node indices; cloning the adapter
    /// shares the same document so tests can inspect it after the engine
    /// takes ownership.
    #[derive(Clone, Default)]
    struct MockDom {
        inner: Rc<RefCell<MockInner>>,
    }

    impl MockDom {
        fn add(&self, tag: &str, text: &str, parent: Option<usize>) -> usize {
            let mut inner = self.inner.borrow_mut();
            inner.nodes.push(MockNode {
                tag: tag.to_string(),
                text: text.to_string(),
                metrics: ElementMetrics {
                    width: 100.0,
                    height: 20.0,
                    child_count: 0,
                },
                parent,
                ..MockNode::default()
            });
            inner.nodes.len() - 1
        }

        fn set_metrics(&self, idx: usize, metrics: ElementMetrics) {
            self.inner.borrow_mut().nodes[idx].metrics = metrics;
        }

        fn set_styles(&self, idx: usize, styles: StyleSnapshot) {
            self.inner.borrow_mut().nodes[idx].styles = styles;
        }

        fn styles(&self, idx: usize) -> StyleSnapshot {
            self.inner.borrow().nodes[idx].styles.clone()
        }

        fn add_selector_hit(&self, idx: usize, selector: &str) {
            self.inner.borrow_mut().nodes[idx]
                .selector_hits
                .push(selector.to_string());
        }

        fn fail_selector(&self, selector: &str) {
            self.inner
                .borrow_mut()
                .failing_selectors
                .insert(selector.to_string());
        }

        fn is_marked(&self, idx: usize) -> bool {
            self.inner.borrow().nodes[idx].marked
        }

        fn force_unmark(&self, idx: usize) {
            self.inner.borrow_mut().nodes[idx].marked = false;
        }
    }

    impl PageDom for MockDom {
        type Element = usize;

        fn candidates(&self) -> Vec<usize> {
            let inner = self.inner.borrow();
            (0..inner.nodes.len())
                .filter(|&i| {
                    crate::dom::CANDIDATE_TAGS.contains(&inner.nodes[i].tag.as_str())
                })
                .collect()
        }

        fn element_key(&self, element: &usize) -> u64 {
            *element as u64
        }

        fn text(&self, element: &usize) -> String {
            self.inner.borrow().nodes[*element].text.clone()
        }

        fn metrics(&self, element: &usize) -> ElementMetrics {
            self.inner.borrow().nodes[*element].metrics
        }

        fn matches_within(&self, element: &usize, selector: &str) -> Result<bool, DomError> {
            let inner = self.inner.borrow();
            if inner.failing_selectors.contains(selector) {
                return Err(DomError::Selector(selector.to_string()));
            }
            let mut current = Some(*element);
            while let Some(idx) = current {
                let node = &inner.nodes[idx];
                if node.tag == selector || node.selector_hits.iter().any(|s| s == selector) {
                    return Ok(true);
                }
                current = node.parent;
            }
            Ok(false)
        }

        fn read_styles(&self, element: &usize) -> StyleSnapshot {
            self.inner.borrow().nodes[*element].styles.clone()
        }

        fn apply_styles(&self, element: &usize, styles: &StyleSnapshot) {
            self.inner.borrow_mut().nodes[*element].styles = styles.clone();
        }

        fn set_marker(&self, element: &usize, hidden: bool) {
            self.inner.borrow_mut().nodes[*element].marked = hidden;
        }

        fn has_marker(&self, element: &usize) -> bool {
            self.inner.borrow().nodes[*element].marked
        }

        fn marked_elements(&self) -> Vec<usize> {
            let inner = self.inner.borrow();
            (0..inner.nodes.len())
                .filter(|&i| inner.nodes[i].marked)
                .collect()
        }
    }

    /// Scheduler that records every call for assertion.
    #[derive(Clone, Default)]
    struct RecordingScheduler {
        events: Rc<RefCell<Vec<&'static str>>>,
    }

    impl RecordingScheduler {
        fn events(&self) -> Vec<&'static str> {
            self.events.borrow().clone()
        }
    }

    impl ScanScheduler for RecordingScheduler {
        fn start(&mut self) {
            self.events.borrow_mut().push("start");
        }
        fn stop(&mut self) {
            self.events.borrow_mut().push("stop");
        }
        fn schedule_rescan(&mut self) {
            self.events.borrow_mut().push("rescan");
        }
    }

    fn engine_on(dom: &MockDom) -> (Engine<MockDom, RecordingScheduler>, RecordingScheduler) {
        let scheduler = RecordingScheduler::default();
        let engine = Engine::new(
            dom.clone(),
            scheduler.clone(),
            detect_profile("www.amazon.in"),
        );
        (engine, scheduler)
    }

    #[test]
    fn test_hide_then_restore_round_trip() {
        let dom = MockDom::default();
        let span = dom.add("span", "Price: ₹1,234.56 only", None);
        let original = StyleSnapshot {
            display: "inline-block".into(),
            opacity: "0.9".into(),
            ..StyleSnapshot::default()
        };
        dom.set_styles(span, original.clone());

        let (mut engine, _) = engine_on(&dom);
        engine.activate();

        assert!(dom.is_marked(span));
        assert_eq!(dom.styles(span), StyleSnapshot::hidden());
        assert_eq!(engine.hidden_count(), 1);

        engine.deactivate();

        assert!(!dom.is_marked(span));
        assert_eq!(dom.styles(span), original);
        assert_eq!(engine.hidden_count(), 0);
    }

    #[test]
    fn test_restore_preserves_empty_inline_styles() {
        let dom = MockDom::default();
        let span = dom.add("span", "$49.99", None);

        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        engine.deactivate();

        // No inline styles before hiding, none after restoring.
        assert_eq!(dom.styles(span), StyleSnapshot::default());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dom = MockDom::default();
        dom.add("span", "₹999", None);
        dom.add("div", "$1,299.00", None);

        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        assert_eq!(engine.hidden_count(), 2);

        // Nothing changed: the second pass hides nothing new.
        assert_eq!(engine.scan_and_hide(), 0);
        assert_eq!(engine.hidden_count(), 2);
    }

    #[test]
    fn test_record_never_overwritten() {
        let dom = MockDom::default();
        let span = dom.add("span", "₹999", None);
        let original = StyleSnapshot {
            display: "flex".into(),
            ..StyleSnapshot::default()
        };
        dom.set_styles(span, original.clone());

        let (mut engine, _) = engine_on(&dom);
        engine.activate();

        // External code strips the marker; the next pass re-hides but must
        // keep the first-captured original, not the hidden styles.
        dom.force_unmark(span);
        engine.scan_and_hide();

        engine.deactivate();
        assert_eq!(dom.styles(span), original);
    }

    #[test]
    fn test_container_and_wordy_elements_not_hidden() {
        let dom = MockDom::default();
        let long_text = "lorem ipsum ".repeat(30) + "₹999";
        let wall = dom.add("div", &long_text, None);
        let crowded = dom.add("div", "₹999", None);
        dom.set_metrics(
            crowded,
            ElementMetrics {
                width: 100.0,
                height: 20.0,
                child_count: 6,
            },
        );
        let huge = dom.add("div", "₹999", None);
        dom.set_metrics(
            huge,
            ElementMetrics {
                width: 900.0,
                height: 400.0,
                child_count: 0,
            },
        );

        let (mut engine, _) = engine_on(&dom);
        engine.activate();

        assert!(!dom.is_marked(wall));
        assert!(!dom.is_marked(crowded));
        assert!(!dom.is_marked(huge));
        assert_eq!(engine.hidden_count(), 0);
    }

    #[test]
    fn test_excluded_subtrees_never_hidden() {
        let dom = MockDom::default();
        let nav = dom.add("div", "", None);
        dom.add_selector_hit(nav, ".navigation");
        let inside = dom.add("span", "₹999", Some(nav));
        let outside = dom.add("span", "₹999", None);

        let (mut engine, _) = engine_on(&dom);
        engine.activate();

        assert!(!dom.is_marked(inside));
        assert!(dom.is_marked(outside));
    }

    #[test]
    fn test_selector_failure_is_fail_open() {
        let dom = MockDom::default();
        let span = dom.add("span", "₹999", None);
        // Every exclusion selector errors; the scan must still hide.
        for selector in detect_profile("www.amazon.in")
            .expect("profile")
            .exclusion_selectors
        {
            dom.fail_selector(selector);
        }

        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        assert!(dom.is_marked(span));
    }

    #[test]
    fn test_order_numbers_and_dates_not_hidden() {
        let dom = MockDom::default();
        let order = dom.add("span", "Order #1234567890 placed on 2024-01-15", None);

        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        assert!(!dom.is_marked(order));
    }

    #[test]
    fn test_unsupported_site_is_inert() {
        let dom = MockDom::default();
        let span = dom.add("span", "₹999", None);
        let scheduler = RecordingScheduler::default();
        let mut engine = Engine::new(dom.clone(), scheduler.clone(), None);

        engine.activate();
        assert!(!engine.is_active());
        assert!(!dom.is_marked(span));
        assert!(scheduler.events().is_empty());

        assert_eq!(
            engine.status(),
            EngineStatus {
                active: false,
                site: None
            }
        );
    }

    #[test]
    fn test_toggle_reports_status_and_drives_scheduler() {
        let dom = MockDom::default();
        dom.add("span", "₹999", None);
        let (mut engine, scheduler) = engine_on(&dom);

        let status = engine.toggle();
        assert!(status.active);
        assert_eq!(status.site.as_deref(), Some("Amazon"));

        let status = engine.toggle();
        assert!(!status.active);
        assert_eq!(scheduler.events(), vec!["start", "stop"]);
    }

    #[test]
    fn test_mutation_prefilter_schedules_rescan() {
        let dom = MockDom::default();
        let (mut engine, scheduler) = engine_on(&dom);
        engine.activate();

        assert!(!engine.notify_added_text("no prices in this widget"));
        assert!(engine.notify_added_text("now ₹499 only"));
        assert_eq!(scheduler.events(), vec!["start", "rescan"]);
    }

    #[test]
    fn test_pending_scan_after_deactivate_hides_nothing() {
        let dom = MockDom::default();
        let (mut engine, scheduler) = engine_on(&dom);
        engine.activate();

        // New content arrives and a debounced re-scan is armed...
        let span = dom.add("span", "₹499", None);
        assert!(engine.notify_added_text("₹499"));

        // ...but the user toggles off before the timer fires.
        engine.deactivate();
        engine.on_scan_due();

        assert!(!dom.is_marked(span));
        assert_eq!(engine.hidden_count(), 0);
        assert_eq!(scheduler.events(), vec!["start", "rescan", "stop"]);
    }

    #[test]
    fn test_interval_tick_picks_up_new_content() {
        let dom = MockDom::default();
        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        assert_eq!(engine.hidden_count(), 0);

        let late = dom.add("span", "€85.00", None);
        engine.on_interval_tick();
        assert!(dom.is_marked(late));
    }

    #[test]
    fn test_marker_without_record_is_unmarked_not_restyled() {
        let dom = MockDom::default();
        let span = dom.add("span", "plain text", None);
        let styles = StyleSnapshot {
            display: "grid".into(),
            ..StyleSnapshot::default()
        };
        dom.set_styles(span, styles.clone());

        let (mut engine, _) = engine_on(&dom);
        engine.activate();
        // Marker appears without the engine having hidden the element.
        dom.inner.borrow_mut().nodes[span].marked = true;

        engine.deactivate();
        assert!(!dom.is_marked(span));
        assert_eq!(dom.styles(span), styles);
    }

    #[test]
    fn test_set_active_rehydrates_persisted_state() {
        let dom = MockDom::default();
        let span = dom.add("span", "₹999", None);
        let (mut engine, _) = engine_on(&dom);

        engine.set_active(true);
        assert!(engine.is_active());
        assert!(dom.is_marked(span));

        // Rehydrating "off" while already off stays a no-op.
        let (mut idle, scheduler) = engine_on(&dom);
        idle.set_active(false);
        assert!(!idle.is_active());
        assert!(scheduler.events().is_empty());
    }
}
