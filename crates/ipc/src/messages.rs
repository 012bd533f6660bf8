//! Main IPC message enums for communication between the core and the UI.

use serde::{Deserialize, Serialize};

use crate::types::{AssetInfo, IngestFailureKind, MaterialDescriptor, TargetSpec};

/// Messages from the configurator core to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoreToUi {
    /// A new asset finished ingesting and is loaded in the viewer
    AssetReady(AssetInfo),

    /// Ingestion aborted; the previous asset is still shown
    IngestFailed {
        kind: IngestFailureKind,
        message: String,
    },

    /// Fresh material list of the loaded asset
    MaterialsUpdated { materials: Vec<MaterialDescriptor> },

    /// A texture or color was applied
    CustomizationApplied {
        target: TargetSpec,
        /// Names of the materials that changed
        materials: Vec<String>,
    },

    /// A texture or color could not be applied (non-fatal)
    CustomizationSkipped { target: TargetSpec, reason: String },

    /// Error notification
    Error { code: String, message: String },
}

/// Messages from the UI to the configurator core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiToCore {
    /// Recolor a region with a flat color (`#rrggbb` or `#rrggbbaa`)
    ApplyColor { target: TargetSpec, color: String },

    /// Recolor a region with a named palette swatch
    ApplySwatch { target: TargetSpec, swatch: String },

    /// Ask for the current material list
    RequestMaterials,
}
