//! Error types for the viewer layer.

use configurator_assets::{IngestError, MintError, TextureError};
use configurator_ipc::IngestFailureKind;
use thiserror::Error;

/// Failures reported by the external viewer.
#[derive(Debug, Clone, Error)]
pub enum ViewerError {
    #[error("Viewer failed to load '{reference}': {reason}")]
    Load { reference: String, reason: String },

    #[error("Viewer failed to create a texture from '{reference}': {reason}")]
    Texture { reference: String, reason: String },

    #[error("Material {index} does not exist")]
    NoSuchMaterial { index: usize },

    #[error("Viewer call failed: {0}")]
    Call(String),
}

/// Target resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No material matches {target}")]
    NoMatchingMaterial { target: String },
}

/// Invalid color strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}': expected #rrggbb or #rrggbbaa")]
pub struct ColorError(pub String);

/// Why a customization was not applied. The loaded asset is unchanged
/// whenever one of these is returned.
#[derive(Debug, Error)]
pub enum CustomizeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("Unknown palette swatch '{0}'")]
    UnknownSwatch(String),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Mint(#[from] MintError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error("The material list changed while the customization was prepared")]
    Superseded,

    #[error("No model is loaded")]
    NoModel,
}

impl CustomizeError {
    /// Stable code reported to the UI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Resolve(ResolveError::NoMatchingMaterial { .. }) => "no_matching_material",
            Self::Color(_) => "invalid_color",
            Self::UnknownSwatch(_) => "unknown_swatch",
            Self::Texture(_) => "invalid_texture",
            Self::Mint(_) => "mint_failed",
            Self::Viewer(_) => "viewer_failed",
            Self::Superseded => "superseded",
            Self::NoModel => "no_model",
        }
    }

    /// Whether this is a non-fatal skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Resolve(_) | Self::Superseded)
    }
}

/// Why loading dropped files failed. The previous asset stays loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Generation {generation} was rejected by the viewer: {source}")]
    Viewer {
        generation: u64,
        #[source]
        source: ViewerError,
    },
}

impl LoadError {
    /// Classification reported to the UI.
    pub fn kind(&self) -> IngestFailureKind {
        match self {
            Self::Ingest(e) => e.kind(),
            Self::Viewer { .. } => IngestFailureKind::ViewerLoadFailed,
        }
    }
}
