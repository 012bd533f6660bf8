//! glTF scene documents: typed model, reference patching and legacy material
//! migration.

mod document;
mod legacy;
mod matcher;
mod patch;

pub use document::{
    Buffer, Image, Material, MaterialExtensions, PbrMetallicRoughness, SPEC_GLOSS_EXTENSION,
    SceneDocument, SpecularGlossiness, TextureInfo,
};
pub use legacy::normalize_legacy_materials;
pub use matcher::{MATCH_ORDER, MatchStrategy, ResourceMatch, is_relative_reference, match_resource};
pub use patch::{PatchOutcome, patch_document};
