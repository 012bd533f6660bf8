//! `blob:` object URLs for in-memory files.

use configurator_assets::{InMemoryFile, LoadableReference, MintError, ReferenceMinter};
use wasm_bindgen::JsValue;

use crate::js_error_message;

/// Mints `blob:` URLs with `URL.createObjectURL`. Every URL pins its bytes in
/// browser memory until revoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobUrlMinter;

impl ReferenceMinter for BlobUrlMinter {
    fn mint(&self, file: &InMemoryFile) -> Result<LoadableReference, MintError> {
        let fail = |e: JsValue| MintError {
            name: file.name().to_string(),
            reason: js_error_message(&e),
        };

        let bytes = js_sys::Uint8Array::from(file.bytes().as_ref());
        let parts = js_sys::Array::of1(&bytes);
        let props = web_sys::BlobPropertyBag::new();
        props.set_type(file.mime_type());

        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &props)
            .map_err(fail)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(fail)?;
        Ok(LoadableReference::new(url))
    }

    fn revoke(&self, reference: &LoadableReference) {
        if let Err(e) = web_sys::Url::revoke_object_url(reference.as_str()) {
            web_sys::console::warn_2(&"Failed to revoke object URL".into(), &e);
        }
    }
}
