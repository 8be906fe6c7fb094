use super::source::TileKey;
use crate::{MapError, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Append-only on-disk tile store, one file per [`TileKey`].
///
/// Entries are never evicted. Files hold the exact bytes the service
/// returned, so concurrent writers of the same key write identical content.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    dir: PathBuf,
}

impl DiskTileCache {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &TileKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Loads and decodes a cached tile.
    ///
    /// A missing file is `Ok(None)`. So is a file that cannot be read or
    /// decoded; it is logged and left to be overwritten by a fresh fetch.
    pub fn load(&self, key: &TileKey) -> Option<RgbImage> {
        let path = self.path_for(key);
        if !path.is_file() {
            return None;
        }
        let decoded = fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()));
        match decoded {
            Ok(image) => Some(image.to_rgb8()),
            Err(e) => {
                log::warn!("ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Persists the raw response bytes for `key`.
    pub fn store(&self, key: &TileKey, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(key);
        let storage_error = |source| MapError::Storage {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(storage_error)?;

        // Write beside the target, then rename, so readers never see a partial file.
        let partial = self
            .dir
            .join(format!("{}.{}.part", key.file_name(), std::process::id()));
        fs::write(&partial, bytes).map_err(storage_error)?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(storage_error(e));
        }
        Ok(path)
    }
}
