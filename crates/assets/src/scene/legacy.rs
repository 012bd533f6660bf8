//! Migration of legacy diffuse/specular materials to metal/rough.

use configurator_config::LegacyDefaults;

use super::document::{SPEC_GLOSS_EXTENSION, SceneDocument};

/// Rewrite every material that carries the legacy diffuse/specular block into
/// the base-color/metallic-roughness encoding.
///
/// The diffuse texture and factor become the base-color texture and factor,
/// roughness and metallic fall back to `defaults` when unset, and the legacy
/// block is removed. The extension name is dropped from the document-level
/// used/required lists. Running it again is a no-op.
///
/// Returns the number of migrated materials.
pub fn normalize_legacy_materials(doc: &mut SceneDocument, defaults: &LegacyDefaults) -> usize {
    let mut migrated = 0;

    for material in &mut doc.materials {
        let Some(legacy) = material.extensions.specular_glossiness.take() else {
            continue;
        };

        let pbr = material
            .pbr_metallic_roughness
            .get_or_insert_with(Default::default);
        if let Some(texture) = legacy.diffuse_texture {
            pbr.base_color_texture = Some(texture);
        }
        if let Some(factor) = legacy.diffuse_factor {
            pbr.base_color_factor = Some(factor);
        }
        if pbr.roughness_factor.is_none() {
            pbr.roughness_factor = Some(defaults.roughness);
        }
        if pbr.metallic_factor.is_none() {
            pbr.metallic_factor = Some(defaults.metallic);
        }

        tracing::debug!(
            "Migrated legacy material '{}'",
            material.name.as_deref().unwrap_or("<unnamed>")
        );
        migrated += 1;
    }

    doc.extensions_used.retain(|name| name != SPEC_GLOSS_EXTENSION);
    doc.extensions_required.retain(|name| name != SPEC_GLOSS_EXTENSION);

    if migrated > 0 {
        tracing::info!("Migrated {} legacy materials", migrated);
    }
    migrated
}
