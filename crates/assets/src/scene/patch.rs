//! Rewriting of external references into loadable references.

use std::collections::HashMap;

use crate::classify::ResourcePool;
use crate::reference::{LoadableReference, MintError, ReferenceMinter, ResourceSet};

use super::document::SceneDocument;
use super::matcher::{is_relative_reference, match_resource};

/// What patching produced besides the rewritten document.
#[derive(Debug, Default)]
pub struct PatchOutcome {
    /// References that matched nothing, in document order
    pub missing: Vec<String>,
    /// References minted for matched pool files
    pub resources: ResourceSet,
}

/// Rewrite every relative buffer and image URI to the loadable reference of
/// the pool file it resolves to.
///
/// Unresolved URIs are left as they are and reported in
/// [`PatchOutcome::missing`]. Each pool file is minted at most once even when
/// several entries reference it. If minting fails, everything minted so far
/// is released before the error is returned.
pub fn patch_document(
    doc: &mut SceneDocument,
    pool: &ResourcePool,
    minter: &dyn ReferenceMinter,
) -> Result<PatchOutcome, MintError> {
    let mut outcome = PatchOutcome::default();
    let mut minted: HashMap<&str, LoadableReference> = HashMap::new();

    let uri_slots = doc
        .buffers
        .iter_mut()
        .map(|buffer| &mut buffer.uri)
        .chain(doc.images.iter_mut().map(|image| &mut image.uri));

    for slot in uri_slots {
        let Some(uri) = slot.as_deref() else {
            continue;
        };
        if !is_relative_reference(uri) {
            continue;
        }

        let Some(found) = match_resource(uri, pool) else {
            tracing::debug!("No dropped file matches reference '{}'", uri);
            outcome.missing.push(uri.to_string());
            continue;
        };

        let reference = match minted.get(found.key) {
            Some(reference) => reference.clone(),
            None => match minter.mint(&pool[found.key]) {
                Ok(reference) => {
                    outcome.resources.push(reference.clone());
                    minted.insert(found.key, reference.clone());
                    reference
                }
                Err(e) => {
                    outcome.resources.release(minter);
                    return Err(e);
                }
            },
        };

        tracing::debug!(
            "Resolved '{}' to '{}' ({:?})",
            uri,
            found.key,
            found.strategy
        );
        *slot = Some(reference.into_string());
    }

    if !outcome.missing.is_empty() {
        tracing::warn!(
            "{} referenced files are missing: {}",
            outcome.missing.len(),
            outcome.missing.join(", ")
        );
    }
    Ok(outcome)
}
