//! Applying textures and colors to the loaded asset.
//!
//! Targets are resolved and the viewer texture is created before any material
//! is touched. The base-color state of every target is saved first and put
//! back if a viewer call fails halfway, so a failed customization leaves the
//! asset as it was.

use configurator_assets::LoadableReference;
use configurator_config::SlotMapping;
use configurator_ipc::{MaterialDescriptor, OPAQUE_WHITE, TargetSpec};

use crate::error::{CustomizeError, ViewerError};
use crate::resolver::resolve_targets;
use crate::viewer::ModelViewer;

/// Materials changed by a customization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub indices: Vec<usize>,
    pub materials: Vec<String>,
}

impl Applied {
    fn new(materials: &[MaterialDescriptor], indices: Vec<usize>) -> Self {
        let names = materials
            .iter()
            .filter(|m| indices.contains(&m.index))
            .map(|m| m.name.clone())
            .collect();
        Self {
            indices,
            materials: names,
        }
    }
}

/// Base-color state of one material before a customization
struct Saved<T> {
    index: usize,
    texture: Option<T>,
    factor: [f64; 4],
}

/// Edits base colors of the materials a target resolves to.
pub struct Customizer<'a, V: ModelViewer> {
    viewer: &'a V,
    slots: Option<&'a SlotMapping>,
}

impl<'a, V: ModelViewer> Customizer<'a, V> {
    pub fn new(viewer: &'a V, slots: Option<&'a SlotMapping>) -> Self {
        Self { viewer, slots }
    }

    /// Replace the base-color texture of the target materials and reset their
    /// base-color factor to opaque white so the image is not tinted.
    ///
    /// `still_current` is asked once the texture exists; when it returns
    /// false the asset the request was made for is gone and nothing is
    /// applied.
    pub async fn apply_texture(
        &self,
        target: &TargetSpec,
        image: &LoadableReference,
        still_current: impl Fn() -> bool,
    ) -> Result<Applied, CustomizeError> {
        let materials = self.viewer.materials();
        let indices = resolve_targets(&materials, target, self.slots)?;

        let texture = self.viewer.create_texture(image).await?;

        // A new asset may have finished loading while the texture was created.
        if !still_current() || !same_materials(&materials, &self.viewer.materials()) {
            tracing::info!("Dropping texture for {}: asset changed", target.describe());
            return Err(CustomizeError::Superseded);
        }

        self.edit_all(&materials, &indices, |index| {
            self.viewer.set_base_color_texture(index, Some(&texture))?;
            self.viewer.set_base_color_factor(index, OPAQUE_WHITE)
        })?;

        let applied = Applied::new(&materials, indices);
        tracing::info!(
            "Applied texture to {}: {}",
            target.describe(),
            applied.materials.join(", ")
        );
        Ok(applied)
    }

    /// Set the base-color factor of the target materials. Textures are kept.
    pub fn apply_color(
        &self,
        target: &TargetSpec,
        factor: [f64; 4],
    ) -> Result<Applied, CustomizeError> {
        let materials = self.viewer.materials();
        let indices = resolve_targets(&materials, target, self.slots)?;

        self.edit_all(&materials, &indices, |index| {
            self.viewer.set_base_color_factor(index, factor)
        })?;

        let applied = Applied::new(&materials, indices);
        tracing::info!(
            "Applied color {:?} to {}: {}",
            factor,
            target.describe(),
            applied.materials.join(", ")
        );
        Ok(applied)
    }

    /// Run `edit` on every target. On the first failure the materials edited
    /// so far, the failing one included, get their saved state back.
    fn edit_all(
        &self,
        materials: &[MaterialDescriptor],
        indices: &[usize],
        edit: impl Fn(usize) -> Result<(), ViewerError>,
    ) -> Result<(), CustomizeError> {
        let saved = indices
            .iter()
            .map(|&index| -> Result<Saved<V::Texture>, ViewerError> {
                Ok(Saved {
                    index,
                    texture: self.viewer.base_color_texture(index)?,
                    factor: materials
                        .iter()
                        .find(|m| m.index == index)
                        .map_or(OPAQUE_WHITE, |m| m.base_color_factor),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (done, &index) in indices.iter().enumerate() {
            if let Err(e) = edit(index) {
                tracing::warn!("Material {} rejected the change, rolling back: {}", index, e);
                self.restore(&saved[..=done]);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn restore(&self, saved: &[Saved<V::Texture>]) {
        for material in saved.iter().rev() {
            let restored = self
                .viewer
                .set_base_color_texture(material.index, material.texture.as_ref())
                .and_then(|()| self.viewer.set_base_color_factor(material.index, material.factor));
            if let Err(e) = restored {
                tracing::warn!("Failed to restore material {}: {}", material.index, e);
            }
        }
    }
}

fn same_materials(before: &[MaterialDescriptor], after: &[MaterialDescriptor]) -> bool {
    before.len() == after.len()
        && before
            .iter()
            .zip(after)
            .all(|(a, b)| a.index == b.index && a.name == b.name)
}
