//! Copies bundled raw resources out to the cache directory.

use mediastash_error::{MediaStashResult, ResourceError, ResourceErrorKind};
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const TEMP_PREFIX: &str = "temp_audio";
const TEMP_SUFFIX: &str = ".mp3";

/// Read-only set of resources shipped with the application.
pub trait ResourceBundle: Send + Sync {
    /// Bytes of a resource, if the bundle has it.
    fn open(&self, id: &str) -> Option<Cow<'static, [u8]>>;

    /// Identifiers of every resource in the bundle.
    fn ids(&self) -> Vec<String>;
}

#[derive(RustEmbed)]
#[folder = "assets/raw/"]
struct RawAssets;

/// Raw resources compiled into the binary from `assets/raw/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedResources;

impl EmbeddedResources {
    /// SHA-256 of a bundled resource, computed at embed time.
    pub fn sha256(&self, id: &str) -> Option<[u8; 32]> {
        RawAssets::get(id).map(|file| file.metadata.sha256_hash())
    }
}

impl ResourceBundle for EmbeddedResources {
    fn open(&self, id: &str) -> Option<Cow<'static, [u8]>> {
        RawAssets::get(id).map(|file| file.data)
    }

    fn ids(&self) -> Vec<String> {
        RawAssets::iter().map(|id| id.into_owned()).collect()
    }
}

/// Materializes bundled resources as temporary files.
///
/// There is no commit or rollback here: the returned file belongs to the
/// caller, and failures surface as I/O errors.
///
/// # Example
///
/// ```no_run
/// use mediastash_publisher::{EmbeddedResources, ResourceMaterializer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let materializer = ResourceMaterializer::new(EmbeddedResources, "/tmp/mediastash-cache");
/// let path = materializer.materialize("chime.mp3")?;
/// assert!(path.extension().is_some_and(|ext| ext == "mp3"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceMaterializer<B> {
    bundle: B,
    cache_dir: PathBuf,
}

impl<B: ResourceBundle> ResourceMaterializer<B> {
    /// Create a materializer writing into `cache_dir`.
    pub fn new(bundle: B, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle,
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory temporary files are created in.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The bundle resources are read from.
    pub fn bundle(&self) -> &B {
        &self.bundle
    }

    /// Copy a resource into a new `temp_audio*.mp3` file and return its path.
    ///
    /// # Errors
    ///
    /// Returns error if the resource is unknown or the file cannot be written.
    /// A partially written file is removed.
    #[instrument(skip(self), fields(cache_dir = %self.cache_dir.display()))]
    pub fn materialize(&self, id: &str) -> MediaStashResult<PathBuf> {
        let data = self
            .bundle
            .open(id)
            .ok_or_else(|| ResourceError::new(ResourceErrorKind::Unknown(id.to_string())))?;

        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| ResourceError::io(self.cache_dir.display(), &e))?;

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.cache_dir)
            .map_err(|e| ResourceError::io(self.cache_dir.display(), &e))?;

        file.write_all(&data)
            .and_then(|()| file.flush())
            .map_err(|e| ResourceError::io(file.path().display(), &e))?;

        let (_, path) = file
            .keep()
            .map_err(|e| ResourceError::io("persist temporary file", &e.error))?;

        debug!(path = %path.display(), size = data.len(), "Materialized resource");
        Ok(path)
    }
}
