//! Mapping of a customization target onto the loaded asset's materials.
//!
//! Material names of uploaded assets are unpredictable, so a UI slot is
//! resolved through the configured naming convention first, then a free-text
//! fragment, then the whole-surface fallback.

use configurator_config::SlotMapping;
use configurator_ipc::{MaterialDescriptor, TargetSpec};

use crate::error::ResolveError;

/// Resolve `target` to the viewer indices of the materials it selects.
///
/// Matching is a case-insensitive substring test against material names.
/// Slot candidates are tried in order, each against every material in
/// reported order; the first hit wins. A free-text fragment selects the first
/// material containing it. Whole-surface selects every material when nothing
/// more specific matched.
pub fn resolve_targets(
    materials: &[MaterialDescriptor],
    target: &TargetSpec,
    slots: Option<&SlotMapping>,
) -> Result<Vec<usize>, ResolveError> {
    let candidates = target
        .slot
        .as_deref()
        .zip(slots)
        .and_then(|(slot, mapping)| mapping.candidates(slot));

    if let Some(candidates) = candidates {
        for candidate in candidates.iter().filter(|c| !c.trim().is_empty()) {
            if let Some(material) = first_containing(materials, candidate) {
                tracing::debug!(
                    "Slot '{}' resolved to '{}' via '{}'",
                    target.slot.as_deref().unwrap_or_default(),
                    material.name,
                    candidate
                );
                return Ok(vec![material.index]);
            }
        }
    }

    if let Some(fragment) = target.fragment.as_deref().filter(|f| !f.trim().is_empty()) {
        if let Some(material) = first_containing(materials, fragment) {
            return Ok(vec![material.index]);
        }
    }

    if target.whole_surface && !materials.is_empty() {
        return Ok(materials.iter().map(|m| m.index).collect());
    }

    Err(ResolveError::NoMatchingMaterial {
        target: target.describe(),
    })
}

fn first_containing<'m>(
    materials: &'m [MaterialDescriptor],
    fragment: &str,
) -> Option<&'m MaterialDescriptor> {
    let fragment = fragment.to_lowercase();
    materials
        .iter()
        .find(|m| m.name.to_lowercase().contains(&fragment))
}
