//! The external viewer's capability surface.

use configurator_assets::LoadableReference;
use configurator_ipc::MaterialDescriptor;

use crate::error::ViewerError;

/// A 3D viewer the configurator drives.
///
/// Rendering, camera and AR belong to the viewer. The configurator only loads
/// assets by reference and edits base colors of the loaded materials.
#[allow(async_fn_in_trait)]
pub trait ModelViewer {
    /// Viewer-side texture handle
    type Texture;

    /// Load an asset and resolve once the viewer reports it ready.
    async fn load(&self, reference: &LoadableReference) -> Result<(), ViewerError>;

    /// Materials of the loaded asset, read fresh on every call.
    fn materials(&self) -> Vec<MaterialDescriptor>;

    /// Create a texture from an image reference.
    async fn create_texture(
        &self,
        reference: &LoadableReference,
    ) -> Result<Self::Texture, ViewerError>;

    /// Current base-color texture of a material, `None` when it has none.
    fn base_color_texture(&self, material: usize) -> Result<Option<Self::Texture>, ViewerError>;

    /// Set or, with `None`, clear the base-color texture of a material.
    fn set_base_color_texture(
        &self,
        material: usize,
        texture: Option<&Self::Texture>,
    ) -> Result<(), ViewerError>;

    /// RGBA, 0.0-1.0
    fn set_base_color_factor(&self, material: usize, factor: [f64; 4]) -> Result<(), ViewerError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use configurator_ipc::OPAQUE_WHITE;

    use super::*;

    /// In-memory viewer. Loading replaces the material list with
    /// `next_materials`.
    #[derive(Default)]
    pub(crate) struct FakeViewer {
        pub materials: RefCell<Vec<MaterialDescriptor>>,
        pub next_materials: RefCell<Vec<String>>,
        pub loaded: RefCell<Vec<String>>,
        pub fail_load: Cell<bool>,
        pub fail_texture: Cell<bool>,
        /// Material names swapped in while a texture is being created
        pub swap_during_texture: RefCell<Option<Vec<String>>>,
        /// 1-based setter call that fails
        pub fail_set_call: Cell<Option<usize>>,
        pub set_calls: Cell<usize>,
    }

    pub(crate) fn descriptors(names: &[&str]) -> Vec<MaterialDescriptor> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| MaterialDescriptor {
                index,
                name: name.to_string(),
                base_color_texture: None,
                base_color_factor: OPAQUE_WHITE,
            })
            .collect()
    }

    impl FakeViewer {
        pub(crate) fn with_materials(names: &[&str]) -> Self {
            let viewer = Self::default();
            *viewer.materials.borrow_mut() = descriptors(names);
            viewer
        }

        pub(crate) fn loading(names: &[&str]) -> Self {
            let viewer = Self::default();
            viewer.set_next_materials(names);
            viewer
        }

        pub(crate) fn set_next_materials(&self, names: &[&str]) {
            *self.next_materials.borrow_mut() = names.iter().map(|n| n.to_string()).collect();
        }

        fn edit(
            &self,
            index: usize,
            f: impl FnOnce(&mut MaterialDescriptor),
        ) -> Result<(), ViewerError> {
            let call = self.set_calls.get() + 1;
            self.set_calls.set(call);
            if self.fail_set_call.get() == Some(call) {
                return Err(ViewerError::Call(format!("setter call {} failed", call)));
            }
            let mut materials = self.materials.borrow_mut();
            let material = materials
                .iter_mut()
                .find(|m| m.index == index)
                .ok_or(ViewerError::NoSuchMaterial { index })?;
            f(material);
            Ok(())
        }
    }

    impl ModelViewer for FakeViewer {
        type Texture = String;

        async fn load(&self, reference: &LoadableReference) -> Result<(), ViewerError> {
            tokio::task::yield_now().await;
            if self.fail_load.get() {
                return Err(ViewerError::Load {
                    reference: reference.to_string(),
                    reason: "unsupported asset".into(),
                });
            }
            self.loaded.borrow_mut().push(reference.to_string());
            let names = self.next_materials.borrow().clone();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            *self.materials.borrow_mut() = descriptors(&names);
            Ok(())
        }

        fn materials(&self) -> Vec<MaterialDescriptor> {
            self.materials.borrow().clone()
        }

        async fn create_texture(&self, reference: &LoadableReference) -> Result<String, ViewerError> {
            tokio::task::yield_now().await;
            if let Some(names) = self.swap_during_texture.borrow_mut().take() {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                *self.materials.borrow_mut() = descriptors(&names);
            }
            if self.fail_texture.get() {
                return Err(ViewerError::Texture {
                    reference: reference.to_string(),
                    reason: "decode failed".into(),
                });
            }
            Ok(reference.to_string())
        }

        fn base_color_texture(&self, material: usize) -> Result<Option<String>, ViewerError> {
            self.materials
                .borrow()
                .iter()
                .find(|m| m.index == material)
                .map(|m| m.base_color_texture.clone())
                .ok_or(ViewerError::NoSuchMaterial { index: material })
        }

        fn set_base_color_texture(
            &self,
            material: usize,
            texture: Option<&String>,
        ) -> Result<(), ViewerError> {
            self.edit(material, |m| m.base_color_texture = texture.cloned())
        }

        fn set_base_color_factor(&self, material: usize, factor: [f64; 4]) -> Result<(), ViewerError> {
            self.edit(material, |m| m.base_color_factor = factor)
        }
    }
}
