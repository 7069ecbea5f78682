//! Filesystem-backed content index.
//!
//! Each volume is a directory below the index root. Reserved entries keep their
//! bytes in a hidden pending area and only move into the collection's relative
//! directory when the pending flag is cleared.

use crate::catalog::{self, CatalogRow};
use crate::{ContentIndex, IndexEntry, ReadSource};
use chrono::{DateTime, Utc};
use mediastash_core::{CategoryProfile, Collection, MediaUri, PublishRecord, Volume, columns};
use mediastash_error::{MediaStashResult, StorageError, StorageErrorKind};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Pending entries left behind for longer than this may be purged.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Default)]
struct IndexState {
    mounted: BTreeSet<Volume>,
    rows: HashMap<Uuid, CatalogRow>,
}

/// Filesystem content index.
///
/// Stores entries in a per-volume structure:
/// `{base_path}/{volume}/{relative_path}/{display_name}`
///
/// # Example Structure
///
/// ```text
/// /var/mediastash/
/// └── external_primary/
///     ├── .catalog/
///     ├── .pending/
///     ├── Pictures/
///     │   └── 1700000000000_image.jpg
///     ├── Movies/
///     │   └── 1700000000500_video.mp4
///     └── Music/
///         └── song.mp3
/// ```
///
/// # Features
///
/// - **Invisible reservations**: Pending entries never show up in [`ContentIndex::query`]
/// - **Atomic publish**: Commit renames the pending file into place
/// - **Unique names**: Colliding display names become `name (1).ext`, `name (2).ext`, ...
/// - **Durable catalog**: Rows are reloaded when the index is reopened
#[derive(Debug)]
pub struct FileSystemIndex {
    base_path: PathBuf,
    pending_ttl: Duration,
    state: RwLock<IndexState>,
}

impl FileSystemIndex {
    /// Open (or create) an index rooted at `base_path`.
    ///
    /// Reloads catalog rows for every volume directory found and mounts the
    /// primary external volume.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the catalog cannot be read.
    #[instrument(skip(base_path), fields(path = %base_path.as_ref().display()))]
    pub fn open(base_path: impl AsRef<Path>) -> MediaStashResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        let mut rows = HashMap::new();
        let volumes = std::fs::read_dir(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        for volume_dir in volumes.flatten() {
            let path = volume_dir.path();
            if !path.is_dir() {
                continue;
            }
            for row in catalog::load_rows(&path)? {
                rows.insert(row.uri.id(), row);
            }
        }

        let mut mounted = BTreeSet::new();
        mounted.insert(Volume::external_primary());
        std::fs::create_dir_all(base_path.join(Volume::EXTERNAL_PRIMARY)).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        info!(path = %base_path.display(), entries = rows.len(), "Opened filesystem index");
        Ok(Self {
            base_path,
            pending_ttl: DEFAULT_PENDING_TTL,
            state: RwLock::new(IndexState { mounted, rows }),
        })
    }

    /// Set how long a pending entry may linger before it counts as expired.
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Root directory of the index.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Make a volume available for new reservations.
    #[instrument(skip(self, volume), fields(volume = %volume))]
    pub fn mount(&self, volume: Volume) -> MediaStashResult<()> {
        let root = self.volume_root(&volume)?;
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        self.write_state()?.mounted.insert(volume);
        info!("Mounted volume");
        Ok(())
    }

    /// Stop accepting reservations on a volume. Existing entries are kept.
    ///
    /// # Returns
    ///
    /// `true` if the volume was mounted.
    #[instrument(skip(self, volume), fields(volume = %volume))]
    pub fn unmount(&self, volume: &Volume) -> MediaStashResult<bool> {
        let removed = self.write_state()?.mounted.remove(volume);
        info!(removed, "Unmounted volume");
        Ok(removed)
    }

    /// Whether a volume currently accepts reservations.
    pub fn is_mounted(&self, volume: &Volume) -> MediaStashResult<bool> {
        Ok(self.read_state()?.mounted.contains(volume))
    }

    /// Delete pending entries whose expiry is at or before `now`.
    ///
    /// Recovers reservations abandoned by a process that died between insert
    /// and commit.
    ///
    /// # Returns
    ///
    /// Number of entries purged.
    #[instrument(skip(self))]
    pub fn purge_expired_pending(&self, now: DateTime<Utc>) -> MediaStashResult<usize> {
        let mut state = self.write_state()?;
        let cutoff = now.timestamp();

        let expired: Vec<MediaUri> = state
            .rows
            .values()
            .filter(|row| row.is_pending())
            .filter(|row| {
                row.record
                    .integer(columns::DATE_EXPIRES)
                    .is_some_and(|expires| expires <= cutoff)
            })
            .map(|row| row.uri.clone())
            .collect();

        for uri in &expired {
            self.remove_row(&mut state, uri)?;
            info!(uri = %uri, "Purged expired pending entry");
        }

        Ok(expired.len())
    }

    fn read_state(&self) -> MediaStashResult<RwLockReadGuard<'_, IndexState>> {
        self.state.read().map_err(|e| {
            StorageError::new(StorageErrorKind::Poisoned(e.to_string())).into()
        })
    }

    fn write_state(&self) -> MediaStashResult<RwLockWriteGuard<'_, IndexState>> {
        self.state.write().map_err(|e| {
            StorageError::new(StorageErrorKind::Poisoned(e.to_string())).into()
        })
    }

    /// Directory of a volume. Volume names must be a single plain path component.
    fn volume_root(&self, volume: &Volume) -> MediaStashResult<PathBuf> {
        let name = volume.as_str();
        let mut components = Path::new(name).components();
        let valid = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none()
            && !name.starts_with('.');
        if !valid {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "volume name {:?}",
                name
            )))
            .into());
        }
        Ok(self.base_path.join(name))
    }

    fn expiry_from_now(&self) -> i64 {
        let ttl = i64::try_from(self.pending_ttl.as_secs()).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_add(ttl)
    }

    /// Directory and file name an entry is published under.
    fn placement(record: &PublishRecord) -> MediaStashResult<(PathBuf, String)> {
        let relative = record.text(columns::RELATIVE_PATH).unwrap_or_default();
        let relative_path = Path::new(relative);
        let relative_ok = !relative.is_empty()
            && relative_path
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !relative_ok {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "relative path {:?}",
                relative
            )))
            .into());
        }

        let name = record.text(columns::DISPLAY_NAME).unwrap_or_default();
        let mut name_components = Path::new(name).components();
        let name_ok = matches!(name_components.next(), Some(Component::Normal(_)))
            && name_components.next().is_none();
        if !name_ok {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "display name {:?}",
                name
            )))
            .into());
        }

        Ok((relative_path.to_path_buf(), name.to_string()))
    }

    /// First free location for a record, numbering the name on collision.
    fn unique_location(volume_root: &Path, record: &PublishRecord) -> MediaStashResult<PathBuf> {
        let (dir, name) = Self::placement(record)?;
        let mut candidate = dir.join(&name);
        let mut counter = 1u32;
        while volume_root.join(&candidate).exists() {
            candidate = dir.join(numbered_name(&name, counter));
            counter += 1;
        }
        Ok(candidate)
    }

    fn placement_changed(before: &PublishRecord, after: &PublishRecord) -> bool {
        before.text(columns::RELATIVE_PATH) != after.text(columns::RELATIVE_PATH)
            || before.text(columns::DISPLAY_NAME) != after.text(columns::DISPLAY_NAME)
    }

    fn move_bytes(from: &Path, to: &Path) -> MediaStashResult<()> {
        if from == to {
            return Ok(());
        }
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        std::fs::rename(from, to).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                from.display(),
                to.display(),
                e
            )))
        })?;
        Ok(())
    }

    fn create_empty(path: &Path) -> MediaStashResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        File::create(path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(())
    }

    fn open_file(path: &Path) -> MediaStashResult<Option<Box<dyn Read + Send>>> {
        match File::open(path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Read source not found");
                Ok(None)
            }
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    /// Remove a row's catalog file, bytes and in-memory state.
    ///
    /// The catalog file goes first; if the bytes then cannot be removed the
    /// catalog file is written back so the row stays whole.
    fn remove_row(&self, state: &mut IndexState, uri: &MediaUri) -> MediaStashResult<bool> {
        let Some(row) = state.rows.get(&uri.id()).filter(|row| row.uri == *uri) else {
            return Ok(false);
        };
        let volume_root = self.volume_root(uri.collection().volume())?;
        let path = row.data_path(&volume_root);

        catalog::remove_row(&volume_root, uri.id())?;

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Entry bytes already missing");
            }
            Err(e) => {
                if let Err(restore) = catalog::write_row(&volume_root, row) {
                    error!(uri = %uri, error = %restore, "Could not restore catalog row");
                }
                return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        }
        state.rows.remove(&uri.id());
        Ok(true)
    }

    fn snapshot(&self, row: &CatalogRow) -> MediaStashResult<IndexEntry> {
        let volume_root = self.volume_root(row.uri.collection().volume())?;
        let path = row.data_path(&volume_root);
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Ok(IndexEntry::new(
            row.uri.clone(),
            row.record.clone(),
            path,
            size_bytes,
        ))
    }
}

/// `photo.jpg` -> `photo (2).jpg`
fn numbered_name(name: &str, counter: u32) -> String {
    let path = Path::new(name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|s| s.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{} ({}).{}", stem, counter, ext),
        _ => format!("{} ({})", name, counter),
    }
}

impl ContentIndex for FileSystemIndex {
    #[instrument(skip(self, collection, record), fields(collection = %collection))]
    fn insert(
        &self,
        collection: &Collection,
        record: &PublishRecord,
    ) -> MediaStashResult<Option<MediaUri>> {
        let mut state = self.write_state()?;
        if !state.mounted.contains(collection.volume()) {
            debug!("Volume not mounted, declining reservation");
            return Ok(None);
        }

        let volume_root = self.volume_root(collection.volume())?;
        let id = Uuid::new_v4();
        let uri = MediaUri::new(collection.clone(), id);

        let mut record = record.clone();
        if record.text(columns::RELATIVE_PATH).is_none() {
            let default_dir = CategoryProfile::for_category(collection.category()).relative_path();
            record.put(columns::RELATIVE_PATH, default_dir);
        }
        if record.text(columns::DISPLAY_NAME).is_none() {
            record.put(columns::DISPLAY_NAME, id.to_string());
        }
        Self::placement(&record)?;

        let pending = record.is_pending().unwrap_or(false);
        let row = if pending {
            record.put(columns::DATE_EXPIRES, self.expiry_from_now());
            Self::create_empty(&catalog::pending_path(&volume_root, id))?;
            CatalogRow {
                uri: uri.clone(),
                record,
                location: None,
            }
        } else {
            let location = Self::unique_location(&volume_root, &record)?;
            Self::create_empty(&volume_root.join(&location))?;
            if let Some(name) = location.file_name() {
                record.put(columns::DISPLAY_NAME, name.to_string_lossy().into_owned());
            }
            CatalogRow {
                uri: uri.clone(),
                record,
                location: Some(location),
            }
        };

        catalog::write_row(&volume_root, &row)?;
        state.rows.insert(id, row);

        info!(uri = %uri, pending, "Inserted entry");
        Ok(Some(uri))
    }

    #[instrument(skip(self, uri), fields(uri = %uri))]
    fn open_write(&self, uri: &MediaUri) -> MediaStashResult<Option<Box<dyn Write + Send>>> {
        let state = self.read_state()?;
        let Some(row) = state.rows.get(&uri.id()).filter(|row| row.uri == *uri) else {
            debug!("Unknown entry, no write stream");
            return Ok(None);
        };
        if !row.is_pending() {
            debug!("Entry already published, no write stream");
            return Ok(None);
        }

        let path = row.data_path(&self.volume_root(uri.collection().volume())?);
        let file = File::create(&path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        debug!(path = %path.display(), "Opened write stream");
        Ok(Some(Box::new(BufWriter::new(file))))
    }

    #[instrument(skip(self))]
    fn open_read(&self, source: &ReadSource) -> MediaStashResult<Option<Box<dyn Read + Send>>> {
        match source {
            ReadSource::File(path) => Self::open_file(path),
            ReadSource::Entry(uri) => {
                let path = {
                    let state = self.read_state()?;
                    let Some(row) = state.rows.get(&uri.id()).filter(|row| row.uri == *uri)
                    else {
                        return Ok(None);
                    };
                    row.data_path(&self.volume_root(uri.collection().volume())?)
                };
                Self::open_file(&path)
            }
        }
    }

    #[instrument(skip(self, uri, record), fields(uri = %uri, field_count = record.len()))]
    fn update(&self, uri: &MediaUri, record: &PublishRecord) -> MediaStashResult<usize> {
        let mut state = self.write_state()?;
        let volume_root = self.volume_root(uri.collection().volume())?;
        let expiry = self.expiry_from_now();

        let Some(row) = state
            .rows
            .get_mut(&uri.id())
            .filter(|row| row.uri == *uri)
        else {
            debug!("Unknown entry, nothing updated");
            return Ok(0);
        };

        let mut merged = row.record.clone();
        merged.merge(record);

        let was_pending = row.is_pending();
        let now_pending = merged.is_pending().unwrap_or(false);

        let location = if now_pending {
            None
        } else if !was_pending && !Self::placement_changed(&row.record, &merged) {
            row.location.clone()
        } else {
            Some(Self::unique_location(&volume_root, &merged)?)
        };

        let from = row.data_path(&volume_root);
        let to = match &location {
            Some(location) => volume_root.join(location),
            None => catalog::pending_path(&volume_root, uri.id()),
        };
        Self::move_bytes(&from, &to)?;

        if let Some(name) = location.as_ref().and_then(|l| l.file_name()) {
            merged.put(columns::DISPLAY_NAME, name.to_string_lossy().into_owned());
        }
        if now_pending {
            if !was_pending {
                merged.put(columns::DATE_EXPIRES, expiry);
            }
        } else {
            merged.remove(columns::DATE_EXPIRES);
        }

        let updated = CatalogRow {
            uri: row.uri.clone(),
            record: merged,
            location,
        };
        if let Err(e) = catalog::write_row(&volume_root, &updated) {
            if let Err(restore) = Self::move_bytes(&to, &from) {
                error!(
                    from = %to.display(),
                    to = %from.display(),
                    error = %restore,
                    "Could not restore entry bytes after failed catalog write"
                );
            }
            return Err(e);
        }
        *row = updated;

        let published = was_pending && !now_pending;
        info!(published, path = %to.display(), "Updated entry");
        Ok(1)
    }

    #[instrument(skip(self, uri), fields(uri = %uri))]
    fn delete(&self, uri: &MediaUri) -> MediaStashResult<usize> {
        let mut state = self.write_state()?;
        let removed = self.remove_row(&mut state, uri)?;
        if removed {
            info!("Deleted entry");
        } else {
            debug!("Unknown entry, nothing deleted");
        }
        Ok(usize::from(removed))
    }

    #[instrument(skip(self, uri), fields(uri = %uri))]
    fn entry(&self, uri: &MediaUri) -> MediaStashResult<Option<IndexEntry>> {
        let state = self.read_state()?;
        state
            .rows
            .get(&uri.id())
            .filter(|row| row.uri == *uri)
            .map(|row| self.snapshot(row))
            .transpose()
    }

    #[instrument(skip(self, collection), fields(collection = %collection))]
    fn query(&self, collection: &Collection) -> MediaStashResult<Vec<IndexEntry>> {
        let state = self.read_state()?;
        let mut entries = state
            .rows
            .values()
            .filter(|row| row.uri.collection() == collection && !row.is_pending())
            .map(|row| self.snapshot(row))
            .collect::<MediaStashResult<Vec<_>>>()?;
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }
}
