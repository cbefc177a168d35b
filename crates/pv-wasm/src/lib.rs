//! WebAssembly bindings for PriceVeil
//!
//! The extension's content script calls [`init`] once with the page
//! hostname and the persisted activation flag, then routes the popup's
//! `toggleHide` / `getStatus` messages to [`toggle_hide`] / [`get_status`].
//! Storage writes and message transport stay on the JS side.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use pv_core::engine::Engine;
use pv_core::profile::detect_profile;
use pv_core::types::EngineStatus;

mod dom;
mod logger;
mod sched;

pub use dom::{WebDom, MARKER_CLASS};
pub use sched::WasmScheduler;

type PageEngine = Engine<WebDom, WasmScheduler>;

thread_local! {
    static ENGINE: RefCell<Option<PageEngine>> = const { RefCell::new(None) };
}

fn with_engine<R>(f: impl FnOnce(&mut PageEngine) -> R) -> Option<R> {
    ENGINE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Initialize the engine for this page. `active` is the persisted
/// `priceHideActive` value read from storage by the JS glue. Returns
/// whether the site is supported; on unsupported sites the engine stays
/// idle for the page's lifetime.
#[wasm_bindgen]
pub fn init(hostname: &str, active: bool) -> Result<bool, JsValue> {
    logger::init();

    if with_engine(|_| ()).is_some() {
        return Err(JsValue::from_str(
            "Already initialized. Reload the page to reinitialize.",
        ));
    }

    let web_dom = WebDom::for_window().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let profile = detect_profile(hostname);
    let supported = profile.is_some();

    let mut engine = Engine::new(web_dom, WasmScheduler::new(), profile);
    if active {
        engine.set_active(true);
    }

    ENGINE.with(|cell| cell.replace(Some(engine)));
    Ok(supported)
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    with_engine(|_| ()).is_some()
}

/// Handle the popup's `toggleHide` message: flip the activation state and
/// report `{active, site}`. The JS glue persists the returned flag.
#[wasm_bindgen]
pub fn toggle_hide() -> JsValue {
    status_to_js(with_engine(|engine| engine.toggle()))
}

/// Handle the popup's `getStatus` message without mutating anything.
#[wasm_bindgen]
pub fn get_status() -> JsValue {
    status_to_js(with_engine(|engine| engine.status()))
}

/// Expose the matcher for quick checks from the JS side.
#[wasm_bindgen]
pub fn matches_price_js(text: &str) -> bool {
    pv_core::rules::matches_price(text)
}

// =============================================================================
// Scheduler entry points
// =============================================================================

pub(crate) fn interval_tick() {
    with_engine(|engine| engine.on_interval_tick());
}

pub(crate) fn scan_due() {
    with_engine(|engine| engine.on_scan_due());
}

pub(crate) fn added_text(text: &str) {
    with_engine(|engine| {
        engine.notify_added_text(text);
    });
}

// =============================================================================
// JS result objects
// =============================================================================

fn status_to_js(status: Option<EngineStatus>) -> JsValue {
    let result = js_sys::Object::new();
    match status {
        Some(status) => {
            let _ = js_sys::Reflect::set(&result, &"active".into(), &JsValue::from(status.active));
            if let Some(site) = status.site {
                let _ = js_sys::Reflect::set(&result, &"site".into(), &JsValue::from_str(&site));
            }
        }
        None => {
            let _ = js_sys::Reflect::set(&result, &"active".into(), &JsValue::from(false));
        }
    }
    result.into()
}
