//! Read/write opaque bytes keyed by canonicalized URL.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::BlobStoreError;
use crate::url::canonicalize;

/// A content-addressed tree of downloaded blobs rooted at `data_root`.
#[derive(Debug, Clone)]
pub struct BlobStore {
    data_root: PathBuf,
}

impl BlobStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        BlobStore {
            data_root: data_root.into(),
        }
    }

    /// Computes the on-disk path for `url` without touching the filesystem.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.data_root.join(canonicalize(url))
    }

    pub fn exists(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    /// Writes `bytes` to the blob slot for `url`, creating parent
    /// directories as needed. A pre-existing parent directory is not an
    /// error.
    pub fn write(&self, url: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BlobStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = File::create(&path).map_err(|source| BlobStoreError::Write {
            path: path.clone(),
            source,
        })?;
        file.write_all(bytes)
            .map_err(|source| BlobStoreError::Write { path, source })
    }

    /// Reads the full contents of the blob for `url`.
    pub fn read(&self, url: &str) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.path_for(url);
        let mut file = File::open(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BlobStoreError::NotFound { path: path.clone() }
            } else {
                BlobStoreError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|source| BlobStoreError::Read { path, source })?;
        Ok(buf)
    }

    /// Opens a read handle to the blob for `url` without loading it fully
    /// into memory, e.g. for streaming a PACK's contained files.
    pub fn open(&self, url: &str) -> Result<File, BlobStoreError> {
        let path = self.path_for(url);
        File::open(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BlobStoreError::NotFound { path }
            } else {
                BlobStoreError::Read { path, source }
            }
        })
    }

    /// Copies a local file into the blob slot for `url`.
    pub fn adopt(&self, local_path: &Path, url: &str) -> Result<(), BlobStoreError> {
        let dest = self.path_for(url);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BlobStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::copy(local_path, &dest).map_err(|source| BlobStoreError::Write {
            path: dest,
            source,
        })?;
        Ok(())
    }
}
