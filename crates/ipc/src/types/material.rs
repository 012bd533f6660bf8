//! Material-related types for IPC messages.

use serde::{Deserialize, Serialize};

/// Opaque white, the neutral base-color factor.
pub const OPAQUE_WHITE: [f64; 4] = [1.0, 1.0, 1.0, 1.0];

/// A material as reported by the viewer for the loaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    /// Position in the viewer's material list
    pub index: usize,
    pub name: String,
    /// URI of the current base-color texture, if any
    pub base_color_texture: Option<String>,
    /// RGBA, 0.0-1.0
    pub base_color_factor: [f64; 4],
}

/// Which part of the asset a customization is aimed at.
///
/// A slot is a UI-facing logical region resolved through the configured
/// naming convention; a fragment is matched directly against material names.
/// `whole_surface` asks for every material when nothing more specific matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpec {
    pub slot: Option<String>,
    pub fragment: Option<String>,
    pub whole_surface: bool,
}

impl TargetSpec {
    pub fn slot(slot: impl Into<String>) -> Self {
        Self {
            slot: Some(slot.into()),
            ..Default::default()
        }
    }

    pub fn fragment(fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
            ..Default::default()
        }
    }

    pub fn whole_surface() -> Self {
        Self {
            whole_surface: true,
            ..Default::default()
        }
    }

    /// Fall back to a free-text fragment when the slot does not resolve.
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Fall back to every material when nothing more specific resolves.
    pub fn or_whole_surface(mut self) -> Self {
        self.whole_surface = true;
        self
    }

    /// Short human-readable description for warnings.
    pub fn describe(&self) -> String {
        match (&self.slot, &self.fragment) {
            (Some(slot), _) => format!("slot '{}'", slot),
            (None, Some(fragment)) => format!("material '{}'", fragment),
            (None, None) if self.whole_surface => "whole surface".to_string(),
            (None, None) => "no target".to_string(),
        }
    }
}
