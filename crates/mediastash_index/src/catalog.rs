//! On-disk catalog rows.
//!
//! Layout below each volume root:
//!
//! ```text
//! <volume>/
//! ├── .catalog/<id>.json   (one row per entry)
//! ├── .pending/<id>        (bytes of reserved entries)
//! └── Pictures/1700000000000_image.jpg   (bytes of published entries)
//! ```

use mediastash_core::{MediaUri, PublishRecord};
use mediastash_error::{MediaStashResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CATALOG_DIR: &str = ".catalog";
const PENDING_DIR: &str = ".pending";

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CatalogRow {
    pub uri: MediaUri,
    pub record: PublishRecord,
    /// Published location relative to the volume root; `None` while pending
    pub location: Option<PathBuf>,
}

impl CatalogRow {
    pub fn is_pending(&self) -> bool {
        self.location.is_none()
    }

    /// Where the row's bytes currently live.
    pub fn data_path(&self, volume_root: &Path) -> PathBuf {
        match &self.location {
            Some(location) => volume_root.join(location),
            None => pending_path(volume_root, self.uri.id()),
        }
    }
}

pub(crate) fn pending_path(volume_root: &Path, id: Uuid) -> PathBuf {
    volume_root.join(PENDING_DIR).join(id.to_string())
}

fn row_path(volume_root: &Path, id: Uuid) -> PathBuf {
    volume_root.join(CATALOG_DIR).join(format!("{}.json", id))
}

/// Persist a row with temp file + rename.
pub(crate) fn write_row(volume_root: &Path, row: &CatalogRow) -> MediaStashResult<()> {
    let path = row_path(volume_root, row.uri.id());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let json = serde_json::to_vec_pretty(row).map_err(|e| {
        StorageError::new(StorageErrorKind::Catalog(format!("{}: {}", row.uri, e)))
    })?;

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, json).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    std::fs::rename(&temp_path, &path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })?;

    Ok(())
}

pub(crate) fn remove_row(volume_root: &Path, id: Uuid) -> MediaStashResult<()> {
    let path = row_path(volume_root, id);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "delete {}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}

/// Load every readable row under a volume root.
///
/// Rows that fail to parse are skipped with a warning.
pub(crate) fn load_rows(volume_root: &Path) -> MediaStashResult<Vec<CatalogRow>> {
    let dir = volume_root.join(CATALOG_DIR);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                dir.display(),
                e
            )))
            .into());
        }
    };

    let mut rows = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", dir.display(), e)))
            })?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let bytes = std::fs::read(&path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        match serde_json::from_slice::<CatalogRow>(&bytes) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping corrupt catalog row");
            }
        }
    }

    Ok(rows)
}
