//! [`ModelViewer`] over a `<model-viewer>` element.

use configurator_assets::LoadableReference;
use configurator_ipc::{MaterialDescriptor, OPAQUE_WHITE};
use configurator_viewer::{ModelViewer, ViewerError};
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::js_error_message;

/// A `<model-viewer>` element driven through its scene-graph API.
pub struct ModelViewerElement {
    element: web_sys::Element,
}

impl ModelViewerElement {
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }

    /// Find the element with a CSS selector.
    pub fn find(selector: &str) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let element = document
            .query_selector(selector)?
            .ok_or_else(|| JsValue::from_str(&format!("no element matches '{}'", selector)))?;
        Ok(Self::new(element))
    }

    fn material(&self, index: usize) -> Result<JsValue, ViewerError> {
        let model = get(&self.element, "model")?;
        if model.is_null() || model.is_undefined() {
            return Err(ViewerError::NoSuchMaterial { index });
        }
        let material = Array::from(&get(&model, "materials")?).get(index as u32);
        if material.is_undefined() {
            return Err(ViewerError::NoSuchMaterial { index });
        }
        Ok(material)
    }

    fn read_materials(&self) -> Result<Vec<MaterialDescriptor>, ViewerError> {
        let model = get(&self.element, "model")?;
        if model.is_null() || model.is_undefined() {
            return Ok(Vec::new());
        }

        let mut materials = Vec::new();
        for (index, material) in Array::from(&get(&model, "materials")?).iter().enumerate() {
            let pbr = get(&material, "pbrMetallicRoughness")?;
            materials.push(MaterialDescriptor {
                index,
                name: get(&material, "name")?.as_string().unwrap_or_default(),
                base_color_texture: texture_uri(&pbr)?,
                base_color_factor: color_factor(&get(&pbr, "baseColorFactor")?),
            });
        }
        Ok(materials)
    }
}

impl ModelViewer for ModelViewerElement {
    type Texture = JsValue;

    async fn load(&self, reference: &LoadableReference) -> Result<(), ViewerError> {
        let load_error = |e: JsValue| ViewerError::Load {
            reference: reference.to_string(),
            reason: js_error_message(&e),
        };

        let mut settle = None;
        let ready = Promise::new(&mut |resolve: Function, reject: Function| {
            settle = Some((resolve, reject));
        });
        let (resolve, reject) =
            settle.ok_or_else(|| ViewerError::Call("Promise executor did not run".into()))?;

        // Both listeners are removed when this call returns, whichever fired.
        let _on_load = Listener::add(&self.element, "load", move |_| {
            let _ = resolve.call0(&JsValue::NULL);
        })
        .map_err(load_error)?;
        let _on_error = Listener::add(&self.element, "error", move |event| {
            let _ = reject.call1(&JsValue::NULL, &event);
        })
        .map_err(load_error)?;

        self.element
            .set_attribute("src", reference.as_str())
            .map_err(load_error)?;
        JsFuture::from(ready).await.map_err(load_error)?;
        Ok(())
    }

    fn materials(&self) -> Vec<MaterialDescriptor> {
        self.read_materials().unwrap_or_else(|e| {
            tracing::warn!("Failed to read materials: {}", e);
            Vec::new()
        })
    }

    async fn create_texture(&self, reference: &LoadableReference) -> Result<JsValue, ViewerError> {
        let texture_error = |e: JsValue| ViewerError::Texture {
            reference: reference.to_string(),
            reason: js_error_message(&e),
        };
        let pending = call(
            &self.element,
            "createTexture",
            &JsValue::from_str(reference.as_str()),
        )?;
        let pending: Promise = pending.dyn_into().map_err(texture_error)?;
        JsFuture::from(pending).await.map_err(texture_error)
    }

    fn base_color_texture(&self, material: usize) -> Result<Option<JsValue>, ViewerError> {
        let pbr = get(&self.material(material)?, "pbrMetallicRoughness")?;
        let texture = get(&get(&pbr, "baseColorTexture")?, "texture")?;
        if texture.is_null() || texture.is_undefined() {
            Ok(None)
        } else {
            Ok(Some(texture))
        }
    }

    fn set_base_color_texture(
        &self,
        material: usize,
        texture: Option<&JsValue>,
    ) -> Result<(), ViewerError> {
        let pbr = get(&self.material(material)?, "pbrMetallicRoughness")?;
        let info = get(&pbr, "baseColorTexture")?;
        call(&info, "setTexture", texture.unwrap_or(&JsValue::NULL))?;
        Ok(())
    }

    fn set_base_color_factor(&self, material: usize, factor: [f64; 4]) -> Result<(), ViewerError> {
        let pbr = get(&self.material(material)?, "pbrMetallicRoughness")?;
        let rgba: Array = factor.iter().map(|&c| JsValue::from_f64(c)).collect();
        call(&pbr, "setBaseColorFactor", &rgba)?;
        Ok(())
    }
}

/// An event listener that is removed from its element on drop.
struct Listener {
    element: web_sys::Element,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn add(
        element: &web_sys::Element,
        event: &'static str,
        on_event: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(on_event);
        element.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            element: element.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = self
            .element
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            web_sys::console::warn_2(&"Failed to remove model-viewer listener".into(), &e);
        }
    }
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, ViewerError> {
    Reflect::get(target, &JsValue::from_str(key))
        .map_err(|e| ViewerError::Call(format!("{}: {}", key, js_error_message(&e))))
}

fn call(target: &JsValue, method: &str, arg: &JsValue) -> Result<JsValue, ViewerError> {
    let function: Function = get(target, method)?
        .dyn_into()
        .map_err(|_| ViewerError::Call(format!("{} is not a function", method)))?;
    function
        .call1(target, arg)
        .map_err(|e| ViewerError::Call(format!("{}: {}", method, js_error_message(&e))))
}

/// URI of the image behind `pbr.baseColorTexture.texture.source`, if set.
fn texture_uri(pbr: &JsValue) -> Result<Option<String>, ViewerError> {
    let mut current = pbr.clone();
    for key in ["baseColorTexture", "texture", "source"] {
        current = get(&current, key)?;
        if current.is_null() || current.is_undefined() {
            return Ok(None);
        }
    }
    Ok(get(&current, "uri")?
        .as_string()
        .or_else(|| source_name(&current)))
}

fn source_name(source: &JsValue) -> Option<String> {
    Reflect::get(source, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
}

fn color_factor(value: &JsValue) -> [f64; 4] {
    let values = Array::from(value);
    let mut factor = OPAQUE_WHITE;
    for (slot, channel) in factor.iter_mut().zip(values.iter()) {
        if let Some(c) = channel.as_f64() {
            *slot = c;
        }
    }
    factor
}
