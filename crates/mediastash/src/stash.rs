//! Wiring of index, publisher and materializer from configuration.

use crate::MediaStashConfig;
use chrono::Utc;
use mediastash_core::Volume;
use mediastash_error::MediaStashResult;
use mediastash_index::FileSystemIndex;
use mediastash_publisher::{EmbeddedResources, MediaPublisher, ResourceMaterializer};
use std::sync::Arc;
use tracing::{info, instrument};

/// A ready-to-use publisher over a filesystem index.
pub struct MediaStash {
    index: Arc<FileSystemIndex>,
    publisher: MediaPublisher<FileSystemIndex>,
    materializer: ResourceMaterializer<EmbeddedResources>,
}

impl MediaStash {
    /// Open the index described by `config` and build a publisher over it.
    ///
    /// Mounts the configured volume and purges pending entries whose expiry
    /// has passed, recovering reservations left by an earlier crash.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the index cannot be opened.
    #[instrument(skip(config))]
    pub fn open(config: &MediaStashConfig) -> MediaStashResult<Self> {
        config.validate()?;

        let index = FileSystemIndex::open(config.index_root()?)?
            .with_pending_ttl(config.index().pending_ttl());

        let volume = Volume::new(config.index().volume().as_str());
        if !index.is_mounted(&volume)? {
            index.mount(volume.clone())?;
        }

        let purged = index.purge_expired_pending(Utc::now())?;
        info!(root = %index.base_path().display(), volume = %volume, purged, "Opened media stash");

        let index = Arc::new(index);
        let publisher = MediaPublisher::new(Arc::clone(&index))
            .with_volume(volume)
            .with_jpeg_quality(*config.publisher().jpeg_quality());
        let materializer = ResourceMaterializer::new(EmbeddedResources, config.cache_dir()?);

        Ok(Self {
            index,
            publisher,
            materializer,
        })
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<FileSystemIndex> {
        &self.index
    }

    /// The publisher.
    pub fn publisher(&self) -> &MediaPublisher<FileSystemIndex> {
        &self.publisher
    }

    /// The bundled resource materializer.
    pub fn materializer(&self) -> &ResourceMaterializer<EmbeddedResources> {
        &self.materializer
    }
}
