//! Error types for asset ingestion.

use configurator_ipc::IngestFailureKind;
use thiserror::Error;

use crate::reference::MintError;

/// Failures that abort a whole ingestion. The previously loaded asset is left
/// untouched when any of these is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Archive '{name}' is corrupt: {reason}")]
    ArchiveCorrupt { name: String, reason: String },

    #[error("No model file found among {file_count} dropped files")]
    NoModelFound { file_count: usize },

    #[error("Failed to process '{name}': {reason}")]
    ProcessingFailed { name: String, reason: String },

    #[error(transparent)]
    Mint(#[from] MintError),
}

impl IngestError {
    pub(crate) fn processing(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ProcessingFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classification reported to the UI.
    pub fn kind(&self) -> IngestFailureKind {
        match self {
            Self::ArchiveCorrupt { .. } => IngestFailureKind::ArchiveCorrupt,
            Self::NoModelFound { .. } => IngestFailureKind::NoModelFound,
            Self::ProcessingFailed { .. } | Self::Mint(_) => IngestFailureKind::ProcessingFailed,
        }
    }
}

/// Rejected texture uploads.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("'{name}' is not a supported texture image (expected PNG, JPEG or WebP)")]
    UnsupportedFormat { name: String },

    #[error("'{name}' is empty")]
    Empty { name: String },

    #[error("'{name}' could not be read as an image: {reason}")]
    Corrupt { name: String, reason: String },
}
