//! Shared configuration for the configurator
//!
//! This crate provides the single source of truth for the settings shared by
//! the ingestion pipeline, the material resolver and the browser bridge:
//! which file extensions are recognized, the slot naming convention assets
//! may follow, the defaults used when migrating legacy materials, and the
//! color palette offered to the user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default roughness assigned to migrated legacy materials
pub const DEFAULT_LEGACY_ROUGHNESS: f64 = 0.5;

/// Default metallic factor assigned to migrated legacy materials
pub const DEFAULT_LEGACY_METALLIC: f64 = 0.0;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid slot mapping for '{slot}': candidate list is empty")]
    EmptySlot { slot: String },

    #[error("Invalid slot mapping for '{slot}': blank candidate would match any material")]
    BlankCandidate { slot: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfiguratorConfig {
    /// Static slot to material-name mapping
    pub slots: SlotMapping,
    /// Whether loaded assets follow the slot naming convention
    pub naming_convention: bool,
    /// Defaults for legacy material migration
    pub legacy: LegacyDefaults,
    /// Recognized file extensions
    pub formats: FormatConfig,
    /// Color swatches offered by the UI
    pub palette: Vec<PaletteSwatch>,
}

impl ConfiguratorConfig {
    /// Parse a configuration from JSON text, falling back to defaults for
    /// every field that is absent.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from raw JSON bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The slot mapping to use for the currently loaded asset, if any.
    ///
    /// Returns `None` when assets are not expected to follow the naming
    /// convention, in which case only free-text matching applies.
    pub fn active_slots(&self) -> Option<&SlotMapping> {
        if self.naming_convention && !self.slots.is_empty() {
            Some(&self.slots)
        } else {
            None
        }
    }

    /// Look up a palette swatch by name (case-insensitive).
    pub fn swatch(&self, name: &str) -> Option<&PaletteSwatch> {
        self.palette
            .iter()
            .find(|swatch| swatch.name.eq_ignore_ascii_case(name))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (slot, candidates) in self.slots.iter() {
            if candidates.is_empty() {
                return Err(ConfigError::EmptySlot { slot: slot.clone() });
            }
            if candidates.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::BlankCandidate { slot: slot.clone() });
            }
        }
        Ok(())
    }
}

/// Mapping from logical slot identifiers to an ordered list of expected
/// material-name fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotMapping(BTreeMap<String, Vec<String>>);

impl SlotMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot with its candidate fragments, in priority order.
    pub fn with_slot<I, S>(mut self, slot: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(slot, candidates);
        self
    }

    pub fn insert<I, S>(&mut self, slot: impl Into<String>, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .insert(slot.into(), candidates.into_iter().map(Into::into).collect());
    }

    /// Candidate fragments for a slot, in priority order.
    pub fn candidates(&self, slot: &str) -> Option<&[String]> {
        self.0.get(slot).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Factors applied to migrated legacy materials that carry none.
///
/// These are a heuristic approximation (legacy content is usually
/// non-metallic with moderate roughness), not a physical conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyDefaults {
    pub roughness: f64,
    pub metallic: f64,
}

impl Default for LegacyDefaults {
    fn default() -> Self {
        Self {
            roughness: DEFAULT_LEGACY_ROUGHNESS,
            metallic: DEFAULT_LEGACY_METALLIC,
        }
    }
}

/// Extension lists used to classify dropped files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Single-file binary models; preferred over text models
    pub binary_model: Vec<String>,
    /// Text scene descriptions with side resources
    pub text_model: Vec<String>,
    /// Compressed archives expanded before classification
    pub archive: Vec<String>,
    /// Raster images accepted as texture uploads
    pub texture: Vec<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            binary_model: vec!["glb".into()],
            text_model: vec!["gltf".into()],
            archive: vec!["zip".into()],
            texture: vec!["png".into(), "jpg".into(), "jpeg".into(), "webp".into()],
        }
    }
}

impl FormatConfig {
    pub fn is_binary_model(&self, file_name: &str) -> bool {
        has_extension(file_name, &self.binary_model)
    }

    pub fn is_text_model(&self, file_name: &str) -> bool {
        has_extension(file_name, &self.text_model)
    }

    pub fn is_archive(&self, file_name: &str) -> bool {
        has_extension(file_name, &self.archive)
    }

    pub fn is_texture(&self, file_name: &str) -> bool {
        has_extension(file_name, &self.texture)
    }
}

/// A named color offered by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSwatch {
    pub name: String,
    /// `#rrggbb` or `#rrggbbaa`
    pub hex: String,
}

/// Lowercased extension of a file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn has_extension(file_name: &str, extensions: &[String]) -> bool {
    match file_extension(file_name) {
        Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}
