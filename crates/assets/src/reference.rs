//! Loadable references and their lifetime.
//!
//! A loadable reference is a URI the viewer can fetch without a network round
//! trip. Minting one may pin browser memory (object URLs), so every minted
//! reference is tracked in a [`ResourceSet`] that must be released explicitly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::file::InMemoryFile;

/// A URI the viewer can load directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadableReference(String);

impl LoadableReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for LoadableReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while minting a reference
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to create a loadable reference for '{name}': {reason}")]
pub struct MintError {
    pub name: String,
    pub reason: String,
}

/// Turns in-memory files into loadable references.
pub trait ReferenceMinter {
    /// Create a reference that stays valid until [`ReferenceMinter::revoke`].
    fn mint(&self, file: &InMemoryFile) -> Result<LoadableReference, MintError>;

    /// Release a reference previously returned by `mint`.
    fn revoke(&self, reference: &LoadableReference);
}

impl<M: ReferenceMinter + ?Sized> ReferenceMinter for Rc<M> {
    fn mint(&self, file: &InMemoryFile) -> Result<LoadableReference, MintError> {
        (**self).mint(file)
    }

    fn revoke(&self, reference: &LoadableReference) {
        (**self).revoke(reference)
    }
}

/// Embeds the bytes as `data:` URIs. Nothing to release.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriMinter;

impl ReferenceMinter for DataUriMinter {
    fn mint(&self, file: &InMemoryFile) -> Result<LoadableReference, MintError> {
        let encoded = STANDARD.encode(file.bytes());
        Ok(LoadableReference(format!(
            "data:{};base64,{}",
            file.mime_type(),
            encoded
        )))
    }

    fn revoke(&self, _reference: &LoadableReference) {}
}

/// In-process registry serving `mem://` references.
///
/// Cloning shares the registry. Native hosts resolve references through
/// [`MemoryStore::fetch`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    next_id: u64,
    files: HashMap<String, InMemoryFile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file behind a live reference.
    pub fn fetch(&self, uri: &str) -> Option<InMemoryFile> {
        self.inner.borrow().files.get(uri).cloned()
    }

    pub fn is_live(&self, reference: &LoadableReference) -> bool {
        self.inner.borrow().files.contains_key(reference.as_str())
    }

    /// Number of references minted and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.inner.borrow().files.len()
    }
}

impl ReferenceMinter for MemoryStore {
    fn mint(&self, file: &InMemoryFile) -> Result<LoadableReference, MintError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let uri = format!(
            "mem://{}/{}",
            inner.next_id,
            urlencoding::encode(file.name())
        );
        inner.files.insert(uri.clone(), file.clone());
        Ok(LoadableReference(uri))
    }

    fn revoke(&self, reference: &LoadableReference) {
        if self.inner.borrow_mut().files.remove(reference.as_str()).is_none() {
            tracing::debug!("Revoking unknown reference {}", reference);
        }
    }
}

/// References owned by one ingestion or one set of customizations.
#[derive(Debug, Default)]
#[must_use = "minted references leak until released"]
pub struct ResourceSet {
    references: Vec<LoadableReference>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: LoadableReference) {
        self.references.push(reference);
    }

    /// Take ownership of every reference in `other`.
    pub fn absorb(&mut self, mut other: ResourceSet) {
        self.references.append(&mut other.references);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadableReference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Revoke every reference in the set.
    pub fn release(self, minter: &dyn ReferenceMinter) {
        if !self.references.is_empty() {
            tracing::debug!("Releasing {} loadable references", self.references.len());
        }
        for reference in &self.references {
            minter.revoke(reference);
        }
    }
}
