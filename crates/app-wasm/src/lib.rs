//! Configurator WASM build
//!
//! Runs the configurator core in the browser next to a `<model-viewer>`
//! element. Dropped files are minted as `blob:` URLs, the UI talks to the core
//! through CustomEvents and the [`Configurator`] handle.

use std::rc::Rc;

use configurator_assets::{InMemoryFile, TextureUpload};
use configurator_config::ConfiguratorConfig;
use configurator_ipc::{AssetInfo, TargetSpec};
use configurator_viewer::{
    ConfiguratorSession, CustomizeError, customization_reply, load_reply,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};

mod bridge;
mod minter;
mod viewer;

pub use minter::BlobUrlMinter;
pub use viewer::ModelViewerElement;

type Session = ConfiguratorSession<ModelViewerElement, BlobUrlMinter>;

/// Main entry point for the WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages in browser console
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Configurator bound to one `<model-viewer>` element.
#[wasm_bindgen]
pub struct Configurator {
    session: Rc<Session>,
}

#[wasm_bindgen]
impl Configurator {
    /// Bind to the element matching `selector`. `config` is optional JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, config: Option<String>) -> Result<Configurator, JsValue> {
        let config = match config {
            Some(json) => ConfiguratorConfig::from_json_str(&json).map_err(to_js_error)?,
            None => ConfiguratorConfig::default(),
        };
        let viewer = ModelViewerElement::find(selector)?;
        let session = Rc::new(ConfiguratorSession::new(viewer, BlobUrlMinter, config));

        let listener = Rc::clone(&session);
        bridge::listen(move |msg| {
            let reply = listener.handle_message(msg);
            bridge::send_to_ui(&reply);
        })?;

        Ok(Configurator { session })
    }

    /// Ingest an array of `File`s and load the result.
    ///
    /// Resolves with the asset info JSON, or `null` when a newer ingestion
    /// superseded this one.
    pub fn ingest(&self, files: js_sys::Array) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            let mut dropped = Vec::with_capacity(files.length() as usize);
            for file in files.iter() {
                dropped.push(read_file(file.dyn_into()?).await?);
            }

            let result = session.load_files(dropped).await;
            if let Some(reply) = load_reply(&result) {
                bridge::send_to_ui(&reply);
            }
            match result {
                Ok(Some(ready)) => to_json(&AssetInfo::from(&ready)),
                Ok(None) => Ok(JsValue::NULL),
                Err(e) => Err(to_js_error(e)),
            }
        })
    }

    /// Apply an image `File` as the texture of a target given as
    /// `TargetSpec` JSON.
    #[wasm_bindgen(js_name = applyTexture)]
    pub fn apply_texture(&self, target: String, file: web_sys::File) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            let target = parse_target(&target)?;
            let result = match TextureUpload::from_file(read_file(file).await?) {
                Ok(upload) => session.apply_texture(&target, &upload).await,
                Err(e) => Err(CustomizeError::Texture(e)),
            };
            let reply = customization_reply(target, result);
            bridge::send_to_ui(&reply);
            to_json(&reply)
        })
    }

    /// Apply a `#rrggbb` color to a target given as `TargetSpec` JSON.
    #[wasm_bindgen(js_name = applyColor)]
    pub fn apply_color(&self, target: String, color: String) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            let target = parse_target(&target)?;
            let result = session.apply_color(&target, &color);
            let reply = customization_reply(target, result);
            bridge::send_to_ui(&reply);
            to_json(&reply)
        })
    }

    /// Current material list as JSON.
    pub fn materials(&self) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move { to_json(&session.materials()) })
    }

    /// Revoke every object URL held by the configurator.
    pub fn dispose(&self) {
        self.session.release_all();
    }
}

async fn read_file(file: web_sys::File) -> Result<InMemoryFile, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(InMemoryFile::new(file.name(), bytes))
}

fn parse_target(json: &str) -> Result<TargetSpec, JsValue> {
    serde_json::from_str(json).map_err(to_js_error)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_json::to_string(value)
        .map(|json| JsValue::from_str(&json))
        .map_err(to_js_error)
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Best-effort text of a thrown JavaScript value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
