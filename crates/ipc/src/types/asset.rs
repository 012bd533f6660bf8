//! Asset ingestion types for IPC messages.

use serde::{Deserialize, Serialize};

/// A successfully ingested asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Ingestion generation that produced this asset
    pub generation: u64,
    /// Loadable reference handed to the viewer
    pub reference: String,
    /// References that could not be resolved, in document order
    pub missing_resources: Vec<String>,
}

/// Classified ingestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestFailureKind {
    ArchiveCorrupt,
    NoModelFound,
    ProcessingFailed,
    /// The viewer rejected the asset
    ViewerLoadFailed,
}
