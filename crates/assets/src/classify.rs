//! File classification.
//!
//! Picks the one primary model file out of a flat batch and pools everything
//! else by exact filename for reference resolution.

use std::collections::BTreeMap;

use configurator_config::FormatConfig;

use crate::error::IngestError;
use crate::file::InMemoryFile;

/// Side resources of a text scene, keyed by exact filename.
///
/// Ordered so that fuzzy lookups break ties deterministically.
pub type ResourcePool = BTreeMap<String, InMemoryFile>;

/// The file the viewer will load.
#[derive(Debug, Clone)]
pub enum PrimaryModel {
    /// Self-contained binary model, loaded as-is
    Binary(InMemoryFile),
    /// Text scene description whose references need patching
    Text(InMemoryFile),
}

impl PrimaryModel {
    pub fn file(&self) -> &InMemoryFile {
        match self {
            Self::Binary(file) | Self::Text(file) => file,
        }
    }
}

/// Result of classifying one batch of dropped files.
#[derive(Debug)]
pub struct ClassifiedUpload {
    pub primary: PrimaryModel,
    pub pool: ResourcePool,
}

/// Classify a flat, already-expanded batch of files.
///
/// A binary model wins over a text model when both are present; among files
/// of the same kind the first in input order is chosen.
pub fn classify(
    files: Vec<InMemoryFile>,
    formats: &FormatConfig,
) -> Result<ClassifiedUpload, IngestError> {
    let file_count = files.len();
    let primary_index = files
        .iter()
        .position(|f| formats.is_binary_model(f.name()))
        .or_else(|| files.iter().position(|f| formats.is_text_model(f.name())))
        .ok_or(IngestError::NoModelFound { file_count })?;

    let mut primary = None;
    let mut pool = ResourcePool::new();
    for (index, file) in files.into_iter().enumerate() {
        if index == primary_index {
            primary = Some(file);
        } else {
            if pool.contains_key(file.name()) {
                tracing::warn!("Duplicate dropped file '{}'; keeping the last one", file.name());
            }
            pool.insert(file.name().to_string(), file);
        }
    }

    let primary = primary.ok_or(IngestError::NoModelFound { file_count })?;
    let primary = if formats.is_binary_model(primary.name()) {
        PrimaryModel::Binary(primary)
    } else {
        PrimaryModel::Text(primary)
    };

    tracing::info!(
        "Classified upload: primary '{}' with {} side resources",
        primary.file().name(),
        pool.len()
    );
    Ok(ClassifiedUpload { primary, pool })
}
