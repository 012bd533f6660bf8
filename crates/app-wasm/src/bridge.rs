//! JavaScript bridge for the configurator UI
//!
//! Messages are passed via CustomEvents on the window object, with the JSON
//! encoding from `configurator-ipc` in the event detail.

use configurator_ipc::{CoreToUi, UiToCore, decode_ui_message, encode_core_message};
use wasm_bindgen::prelude::*;

/// Event the UI dispatches to reach the core
pub const UI_TO_CORE_EVENT: &str = "configurator:ui-to-core";

/// Event the core dispatches to reach the UI
pub const CORE_TO_UI_EVENT: &str = "configurator:core-to-ui";

/// Register `on_message` for every message the UI sends.
pub fn listen(mut on_message: impl FnMut(UiToCore) + 'static) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;

    let closure = Closure::wrap(Box::new(move |event: web_sys::CustomEvent| {
        let Some(detail) = event.detail().as_string() else {
            web_sys::console::error_1(&"UI message without a string detail".into());
            return;
        };
        match decode_ui_message(&detail) {
            Ok(msg) => on_message(msg),
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to parse UI message: {}", e).into());
            }
        }
    }) as Box<dyn FnMut(_)>);

    window.add_event_listener_with_callback(UI_TO_CORE_EVENT, closure.as_ref().unchecked_ref())?;

    // Keep the closure alive
    closure.forget();

    web_sys::console::log_1(&"Configurator bridge initialized".into());
    Ok(())
}

/// Send a message to the UI
pub fn send_to_ui(msg: &CoreToUi) {
    let json = match encode_core_message(msg) {
        Ok(json) => json,
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to serialize core message: {}", e).into());
            return;
        }
    };

    if let Err(e) = dispatch(&json) {
        web_sys::console::error_2(&"Failed to dispatch core message".into(), &e);
    }
}

fn dispatch(json: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;

    let init = web_sys::CustomEventInit::new();
    init.set_detail(&JsValue::from_str(json));
    let event = web_sys::CustomEvent::new_with_event_init_dict(CORE_TO_UI_EVENT, &init)?;

    window.dispatch_event(&event)?;
    Ok(())
}
