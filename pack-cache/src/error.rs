use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading or writing the on-disk blob store.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read blob at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write blob at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("blob not found in cache: {path}")]
    NotFound { path: PathBuf },
}

/// Failures raised while performing a single HTTP GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
}

/// Failures raised while deriving a PACK URL or extracting device records from a PDSC.
#[derive(Debug, Error)]
pub enum PdscError {
    #[error("{url} does not appear to be a conforming .pdsc file")]
    NotConforming { url: String },
    #[error("failed to parse XML in {url}")]
    Xml {
        url: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// Failures raised while fetching and parsing the root vendor index.
#[derive(Debug, Error)]
pub enum RootIndexError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] PdscError),
}

/// Fatal failures raised while orchestrating a cache-everything / cache-descriptors run.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("could not fetch or parse the root vendor index")]
    RootIndex(#[from] RootIndexError),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error("failed to persist {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode JSON")]
    Json(#[from] serde_json::Error),
    #[error("PACK {path} does not contain an embedded .pdsc file")]
    MissingEmbeddedPdsc { path: PathBuf },
    #[error("failed to open PACK archive {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Failures raised while answering a query against the loaded index.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("index has not been generated yet at {path}")]
    IndexNotLoaded {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no device matching {query:?} was found in the index")]
    DeviceNotFound { query: String },
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error("failed to open PACK archive {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("device {device} has no {what} on record")]
    MissingField { device: String, what: &'static str },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
