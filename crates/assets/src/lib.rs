//! Asset ingestion for the product configurator.
//!
//! Dropped files go through archive expansion, classification, reference
//! patching and legacy material migration before the viewer sees them:
//!
//! ```text
//! files ──► expand_archive ──► classify ──┬─ .glb  ──────────────────────────► mint
//!                                         └─ .gltf ─► patch ─► normalize ──► mint
//! ```
//!
//! [`Ingestor`] drives the pipeline and owns the minted references.

pub mod archive;
pub mod classify;
pub mod error;
pub mod file;
pub mod ingest;
pub mod reference;
pub mod scene;
pub mod texture;

pub use archive::expand_archive;
pub use classify::{ClassifiedUpload, PrimaryModel, ResourcePool, classify};
pub use error::{IngestError, TextureError};
pub use file::{InMemoryFile, basename, mime_for_name};
pub use ingest::{AssetReady, IngestTicket, Ingestor, PreparedAsset};
pub use reference::{
    DataUriMinter, LoadableReference, MemoryStore, MintError, ReferenceMinter, ResourceSet,
};
pub use scene::{SceneDocument, normalize_legacy_materials, patch_document};
pub use texture::{TextureFormat, TextureUpload};
