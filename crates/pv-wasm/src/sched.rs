//! Timer and mutation-observer wiring for the engine
//!
//! Implements the core `ScanScheduler` seam with `setInterval`,
//! `setTimeout` and a `MutationObserver` over `document.body`. Fired
//! callbacks re-enter the engine through the crate's entry points; the
//! engine re-checks its activation flag there, so a timer that outlives a
//! deactivation is harmless.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord, Node, Window};

use pv_core::engine::{ScanScheduler, DEBOUNCE_DELAY_MS, RESCAN_INTERVAL_MS};

/// Scheduler backed by the window's task queue.
pub struct WasmScheduler {
    interval_id: Option<i32>,
    debounce_id: Option<i32>,
    observer: Option<MutationObserver>,
    interval_cb: Closure<dyn FnMut()>,
    debounce_cb: Closure<dyn FnMut()>,
    mutation_cb: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl WasmScheduler {
    pub fn new() -> Self {
        let interval_cb = Closure::wrap(Box::new(crate::interval_tick) as Box<dyn FnMut()>);
        let debounce_cb = Closure::wrap(Box::new(crate::scan_due) as Box<dyn FnMut()>);
        let mutation_cb = Closure::wrap(Box::new(on_mutations)
            as Box<dyn FnMut(js_sys::Array, MutationObserver)>);
        Self {
            interval_id: None,
            debounce_id: None,
            observer: None,
            interval_cb,
            debounce_cb,
            mutation_cb,
        }
    }

    fn window(&self) -> Option<Window> {
        web_sys::window()
    }
}

impl Default for WasmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanScheduler for WasmScheduler {
    fn start(&mut self) {
        let Some(window) = self.window() else {
            return;
        };

        if self.interval_id.is_none() {
            match window.set_interval_with_callback_and_timeout_and_arguments_0(
                self.interval_cb.as_ref().unchecked_ref(),
                RESCAN_INTERVAL_MS as i32,
            ) {
                Ok(id) => self.interval_id = Some(id),
                Err(err) => log::warn!("failed to start interval re-scan: {err:?}"),
            }
        }

        if self.observer.is_none() {
            match MutationObserver::new(self.mutation_cb.as_ref().unchecked_ref()) {
                Ok(observer) => {
                    let init = MutationObserverInit::new();
                    init.set_child_list(true);
                    init.set_subtree(true);
                    if let Some(body) = window.document().and_then(|d| d.body()) {
                        if let Err(err) = observer.observe_with_options(&body, &init) {
                            log::warn!("failed to observe document body: {err:?}");
                        } else {
                            self.observer = Some(observer);
                        }
                    }
                }
                Err(err) => log::warn!("failed to create mutation observer: {err:?}"),
            }
        }
    }

    fn stop(&mut self) {
        let Some(window) = self.window() else {
            return;
        };
        if let Some(id) = self.interval_id.take() {
            window.clear_interval_with_handle(id);
        }
        if let Some(id) = self.debounce_id.take() {
            window.clear_timeout_with_handle(id);
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn schedule_rescan(&mut self) {
        let Some(window) = self.window() else {
            return;
        };
        // Coalesce: a burst of mutations ends up as one scan.
        if let Some(id) = self.debounce_id.take() {
            window.clear_timeout_with_handle(id);
        }
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.debounce_cb.as_ref().unchecked_ref(),
            DEBOUNCE_DELAY_MS as i32,
        ) {
            Ok(id) => self.debounce_id = Some(id),
            Err(err) => log::warn!("failed to schedule re-scan: {err:?}"),
        }
    }
}

/// Mutation batch handler: collect the text of added element nodes and feed
/// it to the engine's pre-filter. The heavy per-batch work stays out of the
/// observer callback; a matching text only arms the debounce timer.
fn on_mutations(records: js_sys::Array, _observer: MutationObserver) {
    for record in records.iter() {
        let record: MutationRecord = record.unchecked_into();
        let added = record.added_nodes();
        for i in 0..added.length() {
            let Some(node) = added.get(i) else {
                continue;
            };
            if node.node_type() != Node::ELEMENT_NODE {
                continue;
            }
            if let Some(text) = node.text_content() {
                crate::added_text(&text);
            }
        }
    }
}
