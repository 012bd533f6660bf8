//! Ingestion orchestration.
//!
//! Every ingestion is tagged with a generation from a monotonically increasing
//! counter. A prepared asset is only committed if its generation is still the
//! latest one issued, so a slow upload can never clobber a newer one. The
//! references of the asset on screen are kept alive until its replacement is
//! confirmed loaded by the viewer.

use std::cell::{Cell, RefCell};

use configurator_config::{ConfiguratorConfig, FormatConfig, LegacyDefaults};
use configurator_ipc::AssetInfo;

use crate::archive::expand_archive;
use crate::classify::{PrimaryModel, classify};
use crate::error::IngestError;
use crate::file::InMemoryFile;
use crate::reference::{LoadableReference, ReferenceMinter, ResourceSet};
use crate::scene::{SceneDocument, normalize_legacy_materials, patch_document};

/// Marker for one ingestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngestTicket {
    generation: u64,
}

impl IngestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A fully processed asset that has not been committed yet.
#[derive(Debug)]
pub struct PreparedAsset {
    ticket: IngestTicket,
    reference: LoadableReference,
    missing: Vec<String>,
    resources: ResourceSet,
}

impl PreparedAsset {
    pub fn ticket(&self) -> IngestTicket {
        self.ticket
    }

    pub fn reference(&self) -> &LoadableReference {
        &self.reference
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

/// A committed asset, ready to be handed to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReady {
    pub generation: u64,
    pub reference: LoadableReference,
    pub missing_resources: Vec<String>,
}

impl From<&AssetReady> for AssetInfo {
    fn from(ready: &AssetReady) -> Self {
        AssetInfo {
            generation: ready.generation,
            reference: ready.reference.to_string(),
            missing_resources: ready.missing_resources.clone(),
        }
    }
}

#[derive(Debug)]
struct LiveAsset {
    generation: u64,
    resources: ResourceSet,
}

/// Turns dropped files into a loadable asset.
pub struct Ingestor<M: ReferenceMinter> {
    minter: M,
    formats: FormatConfig,
    legacy: LegacyDefaults,
    latest: Cell<u64>,
    /// Asset confirmed loaded by the viewer
    current: RefCell<Option<LiveAsset>>,
    /// Committed asset waiting for the viewer
    pending: RefCell<Option<LiveAsset>>,
}

impl<M: ReferenceMinter> Ingestor<M> {
    pub fn new(minter: M, config: &ConfiguratorConfig) -> Self {
        Self {
            minter,
            formats: config.formats.clone(),
            legacy: config.legacy,
            latest: Cell::new(0),
            current: RefCell::new(None),
            pending: RefCell::new(None),
        }
    }

    pub fn minter(&self) -> &M {
        &self.minter
    }

    /// Start a new ingestion, superseding every earlier one.
    pub fn begin(&self) -> IngestTicket {
        let generation = self.latest.get() + 1;
        self.latest.set(generation);
        tracing::debug!("Starting ingestion generation {}", generation);
        IngestTicket { generation }
    }

    /// Whether no newer ingestion has been started since `ticket`.
    pub fn is_current(&self, ticket: IngestTicket) -> bool {
        ticket.generation == self.latest.get()
    }

    /// Generation of the asset confirmed loaded, if any.
    pub fn loaded_generation(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(|asset| asset.generation)
    }

    /// Expand, classify and process `files` into a loadable asset.
    ///
    /// On failure every reference minted for this ingestion is released and
    /// the asset on screen is left untouched.
    pub async fn prepare(
        &self,
        ticket: IngestTicket,
        files: Vec<InMemoryFile>,
    ) -> Result<PreparedAsset, IngestError> {
        let mut expanded = Vec::with_capacity(files.len());
        for file in files {
            if self.formats.is_archive(file.name()) {
                expanded.extend(expand_archive(&file).await?);
            } else {
                expanded.push(file);
            }
        }

        let upload = classify(expanded, &self.formats)?;

        let (reference, missing, resources) = match upload.primary {
            PrimaryModel::Binary(model) => {
                let reference = self.minter.mint(&model)?;
                let mut resources = ResourceSet::new();
                resources.push(reference.clone());
                (reference, Vec::new(), resources)
            }
            PrimaryModel::Text(model) => {
                let mut doc = SceneDocument::from_slice(model.bytes())
                    .map_err(|e| IngestError::processing(model.name(), e))?;

                let outcome = patch_document(&mut doc, &upload.pool, &self.minter)?;
                normalize_legacy_materials(&mut doc, &self.legacy);

                let mut resources = outcome.resources;
                let patched = match doc.to_vec() {
                    Ok(json) => InMemoryFile::new(model.name(), json),
                    Err(e) => {
                        resources.release(&self.minter);
                        return Err(IngestError::processing(model.name(), e));
                    }
                };
                let reference = match self.minter.mint(&patched) {
                    Ok(reference) => reference,
                    Err(e) => {
                        resources.release(&self.minter);
                        return Err(e.into());
                    }
                };
                resources.push(reference.clone());
                (reference, outcome.missing, resources)
            }
        };

        tracing::info!(
            "Prepared asset for generation {} ({} references, {} missing)",
            ticket.generation,
            resources.len(),
            missing.len()
        );
        Ok(PreparedAsset {
            ticket,
            reference,
            missing,
            resources,
        })
    }

    /// Make a prepared asset the one awaiting the viewer.
    ///
    /// Returns `None` and releases the asset's references when a newer
    /// ingestion has been started in the meantime.
    pub fn commit(&self, prepared: PreparedAsset) -> Option<AssetReady> {
        if !self.is_current(prepared.ticket) {
            tracing::info!(
                "Discarding stale ingestion {} (latest is {})",
                prepared.ticket.generation,
                self.latest.get()
            );
            prepared.resources.release(&self.minter);
            return None;
        }

        let generation = prepared.ticket.generation;
        let replaced = self.pending.replace(Some(LiveAsset {
            generation,
            resources: prepared.resources,
        }));
        if let Some(replaced) = replaced {
            replaced.resources.release(&self.minter);
        }

        Some(AssetReady {
            generation,
            reference: prepared.reference,
            missing_resources: prepared.missing,
        })
    }

    /// The viewer finished loading `generation`; release the asset it replaced.
    pub fn confirm_loaded(&self, generation: u64) -> bool {
        let Some(asset) = self.take_pending(generation) else {
            tracing::debug!("Ignoring load confirmation for generation {}", generation);
            return false;
        };
        let previous = self.current.replace(Some(asset));
        if let Some(previous) = previous {
            tracing::debug!(
                "Generation {} replaced generation {}",
                generation,
                previous.generation
            );
            previous.resources.release(&self.minter);
        }
        true
    }

    /// The viewer failed to load `generation`; drop it and keep the current asset.
    pub fn reject(&self, generation: u64) -> bool {
        let Some(asset) = self.take_pending(generation) else {
            return false;
        };
        tracing::warn!("Viewer rejected generation {}", generation);
        asset.resources.release(&self.minter);
        true
    }

    /// Begin, prepare and commit in one step.
    ///
    /// `Ok(None)` means the result was superseded by a newer ingestion.
    pub async fn ingest(&self, files: Vec<InMemoryFile>) -> Result<Option<AssetReady>, IngestError> {
        let ticket = self.begin();
        let prepared = self.prepare(ticket, files).await?;
        Ok(self.commit(prepared))
    }

    /// Release every reference held for the current and pending assets.
    pub fn release_all(&self) {
        for slot in [&self.pending, &self.current] {
            if let Some(asset) = slot.take() {
                asset.resources.release(&self.minter);
            }
        }
    }

    fn take_pending(&self, generation: u64) -> Option<LiveAsset> {
        let mut pending = self.pending.borrow_mut();
        match pending.as_ref() {
            Some(asset) if asset.generation == generation => pending.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::archive::tests::build_zip;
    use crate::reference::MemoryStore;

    fn ingestor() -> Ingestor<MemoryStore> {
        Ingestor::new(MemoryStore::new(), &ConfiguratorConfig::default())
    }

    fn glb(name: &str) -> InMemoryFile {
        InMemoryFile::new(name, b"glTF\x02\x00\x00\x00".to_vec())
    }

    fn gltf(name: &str, doc: Value) -> InMemoryFile {
        InMemoryFile::new(name, serde_json::to_vec(&doc).unwrap())
    }

    fn loaded_document(store: &MemoryStore, ready: &AssetReady) -> SceneDocument {
        let file = store.fetch(ready.reference.as_str()).unwrap();
        SceneDocument::from_slice(file.bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_binary_model() {
        let ingestor = ingestor();

        let ready = ingestor
            .ingest(vec![glb("shoe.glb"), InMemoryFile::new("notes.txt", b"hi".to_vec())])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ready.generation, 1);
        assert!(ready.missing_resources.is_empty());
        assert_eq!(ingestor.minter().live_count(), 1);
        let file = ingestor.minter().fetch(ready.reference.as_str()).unwrap();
        assert_eq!(file.name(), "shoe.glb");
        assert_eq!(file.mime_type(), "model/gltf-binary");
    }

    #[tokio::test]
    async fn test_text_model_with_exact_names() {
        let ingestor = ingestor();
        let files = vec![
            gltf(
                "shoe.gltf",
                json!({
                    "asset": { "version": "2.0" },
                    "buffers": [{ "uri": "shoe.bin", "byteLength": 4 }],
                    "images": [{ "uri": "upper.png" }, { "uri": "sole.jpg" }]
                }),
            ),
            InMemoryFile::new("shoe.bin", b"BIN!".to_vec()),
            InMemoryFile::new("upper.png", b"PNG".to_vec()),
            InMemoryFile::new("sole.jpg", b"JPG".to_vec()),
        ];

        let ready = ingestor.ingest(files).await.unwrap().unwrap();

        assert!(ready.missing_resources.is_empty());
        let store = ingestor.minter();
        let doc = loaded_document(store, &ready);
        assert_eq!(doc.other["asset"], json!({ "version": "2.0" }));
        for uri in doc
            .buffers
            .iter()
            .map(|b| &b.uri)
            .chain(doc.images.iter().map(|i| &i.uri))
        {
            assert!(store.fetch(uri.as_deref().unwrap()).is_some());
        }
        // Three side resources plus the patched document.
        assert_eq!(store.live_count(), 4);
    }

    #[tokio::test]
    async fn test_archive_round_trip() {
        let doc = json!({
            "buffers": [{ "uri": "model.bin", "byteLength": 3 }],
            "images": [{ "uri": "textures/diffuse.png" }],
            "materials": [{
                "name": "Upper",
                "extensions": {
                    "KHR_materials_pbrSpecularGlossiness": {
                        "diffuseTexture": { "index": 0 },
                        "diffuseFactor": [0.8, 0.1, 0.1, 1.0]
                    }
                }
            }],
            "extensionsUsed": ["KHR_materials_pbrSpecularGlossiness"]
        })
        .to_string();
        let archive = build_zip(
            "shoe.zip",
            &[
                ("shoe/", ""),
                ("shoe/model.gltf", doc.as_str()),
                ("shoe/model.bin", "BIN"),
                ("shoe/textures/diffuse.png", "PNG"),
            ],
        );
        let ingestor = ingestor();

        let ready = ingestor.ingest(vec![archive]).await.unwrap().unwrap();

        assert!(ready.missing_resources.is_empty());
        let store = ingestor.minter();
        let doc = loaded_document(store, &ready);
        let bin = store.fetch(doc.buffers[0].uri.as_deref().unwrap()).unwrap();
        assert_eq!(bin.bytes().as_ref(), b"BIN");
        let png = store.fetch(doc.images[0].uri.as_deref().unwrap()).unwrap();
        assert_eq!(png.name(), "diffuse.png");

        let material = &doc.materials[0];
        assert!(material.extensions.is_empty());
        let pbr = material.pbr_metallic_roughness.as_ref().unwrap();
        assert_eq!(pbr.base_color_factor, Some([0.8, 0.1, 0.1, 1.0]));
        assert!(doc.extensions_used.is_empty());
    }

    #[tokio::test]
    async fn test_missing_resources_are_reported() {
        let ingestor = ingestor();
        let files = vec![gltf(
            "shoe.gltf",
            json!({
                "buffers": [{ "uri": "shoe.bin" }],
                "images": [{ "uri": "upper.png" }, { "uri": "data:image/png;base64,AAAA" }]
            }),
        )];

        let ready = ingestor.ingest(files).await.unwrap().unwrap();

        assert_eq!(
            ready.missing_resources,
            vec!["shoe.bin".to_string(), "upper.png".to_string()]
        );
        let info = AssetInfo::from(&ready);
        assert_eq!(info.missing_resources.len(), 2);
    }

    #[tokio::test]
    async fn test_no_model_found() {
        let ingestor = ingestor();
        let err = ingestor
            .ingest(vec![InMemoryFile::new("logo.png", b"PNG".to_vec())])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoModelFound { file_count: 1 }));
    }

    #[tokio::test]
    async fn test_unparseable_scene_releases_everything() {
        let ingestor = ingestor();
        let err = ingestor
            .ingest(vec![
                InMemoryFile::new("shoe.gltf", b"{ not json".to_vec()),
                InMemoryFile::new("shoe.bin", b"BIN".to_vec()),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::ProcessingFailed { ref name, .. } if name == "shoe.gltf"));
        assert_eq!(err.kind(), configurator_ipc::IngestFailureKind::ProcessingFailed);
        assert_eq!(ingestor.minter().live_count(), 0);
    }

    #[tokio::test]
    async fn test_rgb_legacy_factor_still_migrates() {
        let ingestor = ingestor();
        let files = vec![gltf(
            "shoe.gltf",
            json!({
                "materials": [{
                    "name": "Upper",
                    "extensions": {
                        "KHR_materials_pbrSpecularGlossiness": {
                            "diffuseFactor": [0.8, 0.1, 0.1],
                            "diffuseTexture": {}
                        }
                    }
                }]
            }),
        )];

        let ready = ingestor.ingest(files).await.unwrap().unwrap();

        let doc = loaded_document(ingestor.minter(), &ready);
        let material = &doc.materials[0];
        assert!(material.extensions.is_empty());
        let pbr = material.pbr_metallic_roughness.as_ref().unwrap();
        assert_eq!(pbr.base_color_factor, Some([0.8, 0.1, 0.1, 1.0]));
        assert!(pbr.base_color_texture.is_none());
        assert_eq!(pbr.roughness_factor, Some(0.5));
    }

    #[tokio::test]
    async fn test_corrupt_archive_aborts() {
        let ingestor = ingestor();
        let err = ingestor
            .ingest(vec![InMemoryFile::new("shoe.zip", b"garbage".to_vec())])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ArchiveCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_newer_ingestion_supersedes_older() {
        let ingestor = ingestor();

        let slow = ingestor.begin();
        let fast = ingestor.begin();
        let fast_asset = ingestor.prepare(fast, vec![glb("fast.glb")]).await.unwrap();
        let slow_asset = ingestor.prepare(slow, vec![glb("slow.glb")]).await.unwrap();

        let ready = ingestor.commit(fast_asset).unwrap();
        assert_eq!(ready.generation, fast.generation());
        assert!(ingestor.commit(slow_asset).is_none());

        // The stale asset's reference is gone, the newer one survives.
        assert_eq!(ingestor.minter().live_count(), 1);
        assert!(ingestor.minter().is_live(&ready.reference));
        assert!(!ingestor.is_current(slow));
    }

    #[tokio::test]
    async fn test_previous_asset_released_after_confirmation() {
        let ingestor = ingestor();

        let first = ingestor.ingest(vec![glb("a.glb")]).await.unwrap().unwrap();
        assert!(ingestor.confirm_loaded(first.generation));

        let second = ingestor.ingest(vec![glb("b.glb")]).await.unwrap().unwrap();
        // Both stay alive until the viewer reports the new one loaded.
        assert!(ingestor.minter().is_live(&first.reference));
        assert!(ingestor.minter().is_live(&second.reference));

        assert!(ingestor.confirm_loaded(second.generation));
        assert!(!ingestor.minter().is_live(&first.reference));
        assert!(ingestor.minter().is_live(&second.reference));
        assert_eq!(ingestor.loaded_generation(), Some(second.generation));
    }

    #[tokio::test]
    async fn test_rejected_asset_keeps_current() {
        let ingestor = ingestor();

        let first = ingestor.ingest(vec![glb("a.glb")]).await.unwrap().unwrap();
        ingestor.confirm_loaded(first.generation);
        let second = ingestor.ingest(vec![glb("b.glb")]).await.unwrap().unwrap();

        assert!(ingestor.reject(second.generation));
        assert!(!ingestor.confirm_loaded(second.generation));
        assert!(ingestor.minter().is_live(&first.reference));
        assert!(!ingestor.minter().is_live(&second.reference));
        assert_eq!(ingestor.loaded_generation(), Some(first.generation));

        ingestor.release_all();
        assert_eq!(ingestor.minter().live_count(), 0);
    }
}
