//! Typed view of a glTF JSON document.
//!
//! Only the parts the pipeline touches are typed: buffers, images, materials
//! and the document-level extension lists. Everything else is carried through
//! `other` maps untouched, so parsing then serializing preserves the document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name of the legacy diffuse/specular material extension.
pub const SPEC_GLOSS_EXTENSION: &str = "KHR_materials_pbrSpecularGlossiness";

/// A parsed glTF document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl SceneDocument {
    pub fn from_slice(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A raw binary payload, usually geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A raster texture source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A surface appearance descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,

    #[serde(default, skip_serializing_if = "MaterialExtensions::is_empty")]
    pub extensions: MaterialExtensions,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The base-color/metallic-roughness block the viewer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,

    #[serde(default, deserialize_with = "lenient_color", skip_serializing_if = "Option::is_none")]
    pub base_color_factor: Option<[f64; 4]>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub roughness_factor: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub metallic_factor: Option<f64>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Per-material extension objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialExtensions {
    #[serde(
        rename = "KHR_materials_pbrSpecularGlossiness",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub specular_glossiness: Option<SpecularGlossiness>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl MaterialExtensions {
    pub fn is_empty(&self) -> bool {
        self.specular_glossiness.is_none() && self.other.is_empty()
    }
}

/// Legacy diffuse/specular encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecularGlossiness {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub diffuse_texture: Option<TextureInfo>,

    #[serde(default, deserialize_with = "lenient_color", skip_serializing_if = "Option::is_none")]
    pub diffuse_factor: Option<[f64; 4]>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Reference to a texture plus its sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: u64,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Optional field that drops a value of the wrong shape instead of failing
/// the whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!("Ignoring malformed material value {}: {}", value, e);
            Ok(None)
        }
    }
}

/// RGBA factor. An RGB triple gets an opaque alpha.
fn lenient_color<'de, D>(deserializer: D) -> Result<Option<[f64; 4]>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(channels) = lenient::<D, Vec<f64>>(deserializer)? else {
        return Ok(None);
    };
    match channels.as_slice() {
        &[r, g, b] => Ok(Some([r, g, b, 1.0])),
        &[r, g, b, a] => Ok(Some([r, g, b, a])),
        _ => {
            tracing::warn!("Ignoring color factor with {} channels", channels.len());
            Ok(None)
        }
    }
}
