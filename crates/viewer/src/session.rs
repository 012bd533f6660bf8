//! A configurator session: one viewer, one ingestion pipeline and the
//! textures applied to the loaded asset.

use std::cell::{Cell, RefCell};

use configurator_assets::{
    AssetReady, InMemoryFile, Ingestor, ReferenceMinter, ResourceSet, TextureUpload,
};
use configurator_config::ConfiguratorConfig;
use configurator_ipc::{AssetInfo, CoreToUi, MaterialDescriptor, TargetSpec, UiToCore};

use crate::color::parse_hex_color;
use crate::customize::{Applied, Customizer};
use crate::error::{CustomizeError, LoadError};
use crate::viewer::ModelViewer;

pub struct ConfiguratorSession<V: ModelViewer, M: ReferenceMinter> {
    viewer: V,
    ingestor: Ingestor<M>,
    config: ConfiguratorConfig,
    /// Texture references used by the loaded asset
    textures: RefCell<ResourceSet>,
    /// Bumped when a viewer load starts and when it ends
    viewer_epoch: Cell<u64>,
}

impl<V: ModelViewer, M: ReferenceMinter> ConfiguratorSession<V, M> {
    pub fn new(viewer: V, minter: M, config: ConfiguratorConfig) -> Self {
        Self {
            viewer,
            ingestor: Ingestor::new(minter, &config),
            config,
            textures: RefCell::new(ResourceSet::new()),
            viewer_epoch: Cell::new(0),
        }
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn ingestor(&self) -> &Ingestor<M> {
        &self.ingestor
    }

    pub fn config(&self) -> &ConfiguratorConfig {
        &self.config
    }

    /// Ingest dropped files and load the result into the viewer.
    ///
    /// Returns `Ok(None)` when a newer load was started before this one
    /// finished. On error the previously loaded asset stays on screen.
    pub async fn load_files(&self, files: Vec<InMemoryFile>) -> Result<Option<AssetReady>, LoadError> {
        let ticket = self.ingestor.begin();
        let prepared = self.ingestor.prepare(ticket, files).await?;
        let Some(ready) = self.ingestor.commit(prepared) else {
            return Ok(None);
        };

        self.bump_viewer_epoch();
        let loaded = self.viewer.load(&ready.reference).await;
        self.bump_viewer_epoch();
        match loaded {
            Ok(()) => {
                if self.ingestor.confirm_loaded(ready.generation) {
                    self.textures.take().release(self.ingestor.minter());
                }
                if !self.ingestor.is_current(ticket) {
                    tracing::info!("Load of generation {} was superseded", ready.generation);
                    return Ok(None);
                }
                tracing::info!(
                    "Viewer loaded generation {} with {} materials",
                    ready.generation,
                    self.viewer.materials().len()
                );
                Ok(Some(ready))
            }
            Err(source) => {
                self.ingestor.reject(ready.generation);
                if !self.ingestor.is_current(ticket) {
                    return Ok(None);
                }
                Err(LoadError::Viewer {
                    generation: ready.generation,
                    source,
                })
            }
        }
    }

    /// Apply an uploaded image as the base-color texture of `target`.
    ///
    /// Fails with [`CustomizeError::Superseded`] when the viewer started or
    /// finished loading another asset while the texture was being created.
    pub async fn apply_texture(
        &self,
        target: &TargetSpec,
        upload: &TextureUpload,
    ) -> Result<Applied, CustomizeError> {
        let generation = self.ensure_loaded()?;
        let epoch = self.viewer_epoch.get();
        let minter = self.ingestor.minter();
        let reference = minter.mint(upload.file())?;

        let still_current = || {
            self.viewer_epoch.get() == epoch
                && self.ingestor.loaded_generation() == Some(generation)
        };
        match self
            .customizer()
            .apply_texture(target, &reference, still_current)
            .await
        {
            Ok(applied) => {
                self.textures.borrow_mut().push(reference);
                Ok(applied)
            }
            Err(e) => {
                minter.revoke(&reference);
                Err(e)
            }
        }
    }

    /// Apply a `#rrggbb`/`#rrggbbaa` color as the base-color factor of `target`.
    pub fn apply_color(&self, target: &TargetSpec, color: &str) -> Result<Applied, CustomizeError> {
        self.ensure_loaded()?;
        let factor = parse_hex_color(color)?;
        self.customizer().apply_color(target, factor)
    }

    /// Apply a named palette swatch.
    pub fn apply_swatch(&self, target: &TargetSpec, swatch: &str) -> Result<Applied, CustomizeError> {
        let swatch = self
            .config
            .swatch(swatch)
            .ok_or_else(|| CustomizeError::UnknownSwatch(swatch.to_string()))?;
        self.apply_color(target, &swatch.hex)
    }

    /// Fresh material list of the loaded asset.
    pub fn materials(&self) -> Vec<MaterialDescriptor> {
        self.viewer.materials()
    }

    /// Handle a message from the UI and produce the reply.
    pub fn handle_message(&self, msg: UiToCore) -> CoreToUi {
        match msg {
            UiToCore::ApplyColor { target, color } => {
                let result = self.apply_color(&target, &color);
                customization_reply(target, result)
            }
            UiToCore::ApplySwatch { target, swatch } => {
                let result = self.apply_swatch(&target, &swatch);
                customization_reply(target, result)
            }
            UiToCore::RequestMaterials => CoreToUi::MaterialsUpdated {
                materials: self.materials(),
            },
        }
    }

    /// Release every reference held by the session.
    pub fn release_all(&self) {
        self.textures.take().release(self.ingestor.minter());
        self.ingestor.release_all();
    }

    /// Generation of the asset on screen.
    fn ensure_loaded(&self) -> Result<u64, CustomizeError> {
        self.ingestor.loaded_generation().ok_or(CustomizeError::NoModel)
    }

    fn bump_viewer_epoch(&self) {
        self.viewer_epoch.set(self.viewer_epoch.get() + 1);
    }

    fn customizer(&self) -> Customizer<'_, V> {
        Customizer::new(&self.viewer, self.config.active_slots())
    }
}

/// UI reply for a finished ingestion.
pub fn load_reply(result: &Result<Option<AssetReady>, LoadError>) -> Option<CoreToUi> {
    match result {
        Ok(Some(ready)) => Some(CoreToUi::AssetReady(AssetInfo::from(ready))),
        Ok(None) => None,
        Err(e) => Some(CoreToUi::IngestFailed {
            kind: e.kind(),
            message: e.to_string(),
        }),
    }
}

/// UI reply for a finished customization.
pub fn customization_reply(target: TargetSpec, result: Result<Applied, CustomizeError>) -> CoreToUi {
    match result {
        Ok(applied) => CoreToUi::CustomizationApplied {
            target,
            materials: applied.materials,
        },
        Err(e) if e.is_skip() => {
            tracing::warn!("Customization skipped: {}", e);
            CoreToUi::CustomizationSkipped {
                target,
                reason: e.to_string(),
            }
        }
        Err(e) => {
            tracing::warn!("Customization failed: {}", e);
            CoreToUi::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            }
        }
    }
}
