//! Concurrent cache engine for the ARM CMSIS-Pack catalog.
//!
//! [`Engine`] resolves the global vendor index, downloads each vendor's PDSC
//! in parallel, extracts a normalized device/board index from them, and
//! serves queries for a device's flashing algorithms and debug descriptors
//! out of the resulting cache. See `SPEC_FULL.md` for the full component
//! breakdown; this module wires C1–C9 together behind one entry point.

mod blob_store;
mod config;
mod error;
mod fetch;
mod index;
mod pack_url;
mod pdsc;
mod pool;
mod progress;
mod query;
mod record;
mod root_index;
mod url;
mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

pub use blob_store::BlobStore;
pub use config::{EngineConfig, DEFAULT_VIDX_URL};
pub use error::{BlobStoreError, FetchError, IndexError, PdscError, QueryError, RootIndexError};
pub use pool::POOL_WIDTH;
pub use progress::{NullProgress, ProgressReporter};
pub use query::Query;
pub use record::{
    AlgorithmRegion, CompileInfo, DeviceRecord, GlobalAliases, GlobalIndex, MemoryRegion,
    ProcessorInfo, INDEX_VERSION,
};
pub use url::canonicalize;
pub use version::{largest_version, LooseVersion};

use fetch::Fetcher;

/// The catalog cache engine: the concurrent download pipeline, PDSC
/// extraction, and query surface bound to one `data_path`/`json_path` pair.
///
/// Construct with [`Engine::new`] (silent, no custom progress hook) or
/// [`Engine::with_progress`] (a caller-supplied [`ProgressReporter`], e.g.
/// the CLI's `indicatif` renderer). Every method that talks to the network
/// or the JSON store is `&self` and safe to call repeatedly; the root vendor
/// index is cached in memory after its first successful fetch.
pub struct Engine {
    config: EngineConfig,
    fetcher: Fetcher,
    blob_store: BlobStore,
    progress: Arc<dyn ProgressReporter>,
    root_index_cache: Mutex<Option<Vec<String>>>,
}

impl Engine {
    /// Builds an engine that reports no progress.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_progress(config, Arc::new(NullProgress))
    }

    /// Builds an engine that reports [`Download Pool`](pool) progress through `progress`.
    pub fn with_progress(config: EngineConfig, progress: Arc<dyn ProgressReporter>) -> Self {
        let fetcher = Fetcher::new(config.no_timeouts);
        let blob_store = BlobStore::new(config.data_path.clone());
        Engine {
            config,
            fetcher,
            blob_store,
            progress,
            root_index_cache: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The directory blobs are cached under, for `print-cache-dir`.
    pub fn cache_dir(&self) -> &Path {
        &self.config.data_path
    }

    /// Resolves the root vendor index's PDSC URL set, fetching and caching
    /// it in memory on first call.
    fn root_pdsc_urls(&self) -> Result<Vec<String>, IndexError> {
        let mut cache = self.root_index_cache.lock();
        if let Some(urls) = cache.as_ref() {
            return Ok(urls.clone());
        }
        let mut urls = root_index::fetch(&self.fetcher, &self.config.vidx_url)?;
        urls.sort_unstable();
        urls.dedup();
        *cache = Some(urls.clone());
        Ok(urls)
    }

    fn run_cache(&self, also_cache_pack: bool) -> Result<(), IndexError> {
        let urls = self.root_pdsc_urls()?;
        let (built_index, built_aliases) = index::build(
            urls,
            &self.fetcher,
            &self.blob_store,
            self.progress.as_ref(),
            also_cache_pack,
        );
        index::persist_index(&self.config, &built_index)?;
        index::persist_aliases(&self.config, &built_aliases)?;
        Ok(())
    }

    /// Fetches the root index, downloads every PDSC concurrently, and
    /// persists the merged device/alias index. Does not fetch PACK archives.
    pub fn cache_descriptors(&self) -> Result<(), IndexError> {
        self.run_cache(false)
    }

    /// As [`Engine::cache_descriptors`], plus fetches and caches every
    /// resolved PACK archive.
    pub fn cache_everything(&self) -> Result<(), IndexError> {
        self.run_cache(true)
    }

    /// Merges a local PACK file's embedded PDSC into the persisted index and
    /// aliases, and adopts the PACK into the blob store under its derived
    /// URL (not the local path it was read from).
    pub fn add_local_pack(&self, path: &Path) -> Result<(), IndexError> {
        let mut built_index = index::load_index(&self.config)?;
        let mut built_aliases = index::load_aliases(&self.config)?;
        index::add_local_pack(path, &self.blob_store, &mut built_index, &mut built_aliases)?;
        index::persist_index(&self.config, &built_index)?;
        index::persist_aliases(&self.config, &built_aliases)?;
        Ok(())
    }

    /// Opens the query surface over the persisted index/aliases, lazily
    /// loading them on first use.
    pub fn query(&self) -> Query<'_> {
        Query::new(&self.config, &self.blob_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_empty_reads_as_an_empty_index_with_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(EngineConfig::new(dir.path()));
        let matches = engine.query().find_device("anything").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn add_local_pack_for_a_pdsc_whose_url_differs_from_its_download_source_stores_under_the_derived_url(
    ) {
        use std::io::Write as _;

        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(EngineConfig::new(dir.path()));

        let pdsc = r#"<package>
  <vendor>MyVendor</vendor>
  <name>MyPack</name>
  <url>http://vendor.example.com/packs/</url>
  <releases><release version="1.0.0"/></releases>
  <devices>
    <family Dvendor="MyVendor" Dfamily="MyFamily">
      <device Dname="MyDevice"/>
    </family>
  </devices>
  <boards>
    <board name="MyBoard"><mounteddevice Dname="MyDevice"/></board>
  </boards>
</package>"#;

        let local_pack = dir.path().join("local-copy.pack");
        let file = std::fs::File::create(&local_pack).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("MyVendor.MyPack.pdsc", options).unwrap();
        zip.write_all(pdsc.as_bytes()).unwrap();
        zip.finish().unwrap();

        engine.add_local_pack(&local_pack).unwrap();

        let record = engine.query().device("MyDevice").unwrap();
        assert_eq!(
            record.pack_file,
            "http://vendor.example.com/packs/MyVendor.MyPack.1.0.0.pack"
        );
        assert!(engine
            .query()
            .board("MyBoard")
            .unwrap()
            .contains(&"MyDevice".to_string()));

        let blob_store = BlobStore::new(dir.path());
        assert!(blob_store.exists(&record.pack_file));
    }
}
