//! Query Surface: lazily loads the persisted index/alias maps and answers
//! device lookups, fuzzy search, and PACK-archive retrieval out of the cache.

use std::io::Read;
use std::path::Path;

use parking_lot::Mutex;

use crate::blob_store::BlobStore;
use crate::config::EngineConfig;
use crate::error::QueryError;
use crate::record::{DeviceRecord, GlobalAliases, GlobalIndex};

struct Loaded {
    index: GlobalIndex,
    aliases: GlobalAliases,
}

/// The read-only query surface over a cache's persisted `index.json` and
/// `aliases.json`.
///
/// Constructed by [`crate::Engine::query`]; loads both files into memory on
/// first use and keeps them for the lifetime of this handle. A fresh cache
/// that has never run `cache_descriptors`/`cache_everything` loads as an
/// empty index rather than erroring (see [`crate::index::load_index`]).
pub struct Query<'a> {
    config: &'a EngineConfig,
    blob_store: &'a BlobStore,
    state: Mutex<Option<Loaded>>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(config: &'a EngineConfig, blob_store: &'a BlobStore) -> Self {
        Query {
            config,
            blob_store,
            state: Mutex::new(None),
        }
    }

    fn with_loaded<T>(&self, f: impl FnOnce(&Loaded) -> Result<T, QueryError>) -> Result<T, QueryError> {
        let mut state = self.state.lock();
        if state.is_none() {
            let index = read_json_or_default(&self.config.index_path(), GlobalIndex::new)?;
            let aliases = read_json_or_default(&self.config.aliases_path(), GlobalAliases::new)?;
            *state = Some(Loaded { index, aliases });
        }
        f(state.as_ref().expect("just populated"))
    }

    /// Fuzzy-matches `query` against every device name and returns the tier
    /// of `(name, record)` pairs sharing the single highest similarity
    /// score, in device-name order. Empty when the index itself is empty.
    pub fn find_device(&self, query: &str) -> Result<Vec<(String, DeviceRecord)>, QueryError> {
        self.with_loaded(|loaded| {
            let scored: Vec<(f64, &String, &DeviceRecord)> = loaded
                .index
                .devices
                .iter()
                .map(|(name, record)| (strsim::jaro_winkler(query, name), name, record))
                .collect();

            let Some(best) = scored.iter().map(|(score, ..)| *score).fold(None, |acc: Option<f64>, s| {
                Some(acc.map_or(s, |a| a.max(s)))
            }) else {
                return Ok(Vec::new());
            };

            Ok(scored
                .into_iter()
                .filter(|(score, ..)| *score == best)
                .map(|(_, name, record)| (name.clone(), record.clone()))
                .collect())
        })
    }

    /// Looks up a single device by its exact name.
    pub fn device(&self, name: &str) -> Result<DeviceRecord, QueryError> {
        self.with_loaded(|loaded| {
            loaded
                .index
                .devices
                .get(name)
                .cloned()
                .ok_or_else(|| QueryError::DeviceNotFound {
                    query: name.to_string(),
                })
        })
    }

    /// Returns the mounted-device list for `board`.
    pub fn board(&self, board: &str) -> Result<Vec<String>, QueryError> {
        self.with_loaded(|loaded| {
            loaded
                .aliases
                .boards
                .get(board)
                .cloned()
                .ok_or_else(|| QueryError::DeviceNotFound {
                    query: board.to_string(),
                })
        })
    }

    /// Opens `device`'s PACK archive and returns the first (or every, if
    /// `all`) flashing algorithm file named in its record, as
    /// `(path_in_pack, bytes)` pairs.
    pub fn flash_algorithm(&self, device: &str, all: bool) -> Result<Vec<(String, Vec<u8>)>, QueryError> {
        let record = self.device(device)?;
        if record.algorithm.is_empty() {
            return Err(QueryError::MissingField {
                device: device.to_string(),
                what: "flash algorithm",
            });
        }

        let mut archive = self.open_pack(&record.pack_file)?;
        let names: Vec<&String> = if all {
            record.algorithm.keys().collect()
        } else {
            record.algorithm.keys().take(1).collect()
        };

        names
            .into_iter()
            .map(|name| {
                let bytes = read_zip_entry(&mut archive, name, &record.pack_file)?;
                Ok((name.clone(), bytes))
            })
            .collect()
    }

    /// Opens `device`'s PACK archive and returns the bytes of its SVD file.
    pub fn svd_file(&self, device: &str) -> Result<Vec<u8>, QueryError> {
        let record = self.device(device)?;
        let debug = record.debug.clone().ok_or_else(|| QueryError::MissingField {
            device: device.to_string(),
            what: "debug/svd file",
        })?;
        let mut archive = self.open_pack(&record.pack_file)?;
        read_zip_entry(&mut archive, &debug, &record.pack_file)
    }

    /// Writes the current in-memory index to `path` verbatim.
    pub fn dump_index(&self, path: &Path) -> Result<(), QueryError> {
        self.with_loaded(|loaded| {
            let file = std::fs::File::create(path).map_err(|source| QueryError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_writer_pretty(file, &loaded.index).map_err(|source| QueryError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    /// Resolves `query` via [`Query::find_device`], writes `index.json` to
    /// `dir`, then extracts every algorithm file named on each matched
    /// device into `dir`.
    pub fn dump_parts(&self, dir: &Path, query: &str) -> Result<(), QueryError> {
        std::fs::create_dir_all(dir).map_err(|source| QueryError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        self.dump_index(&dir.join("index.json"))?;

        for (name, _) in self.find_device(query)? {
            for (path_in_pack, bytes) in self.flash_algorithm(&name, true)? {
                let basename = path_in_pack.rsplit('/').next().unwrap_or(&path_in_pack);
                std::fs::write(dir.join(basename), bytes).map_err(|source| QueryError::Write {
                    path: dir.join(basename),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn open_pack(&self, pack_file: &str) -> Result<zip::ZipArchive<std::fs::File>, QueryError> {
        let file = self.blob_store.open(pack_file)?;
        zip::ZipArchive::new(file).map_err(|source| QueryError::Zip {
            path: self.blob_store.path_for(pack_file),
            source,
        })
    }
}

/// Reads and parses the JSON file at `path`, or calls `default` when it does
/// not exist yet (a fresh cache with no prior crawl).
fn read_json_or_default<T: serde::de::DeserializeOwned>(
    path: &Path,
    default: impl FnOnce() -> T,
) -> Result<T, QueryError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| QueryError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(default()),
        Err(source) => Err(QueryError::IndexNotLoaded {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads `name` out of `archive`, falling back to a case-insensitive
/// basename match (PACK authors are inconsistent about path separators and
/// casing between the PDSC's recorded path and the ZIP's actual entry name).
fn read_zip_entry(
    archive: &mut zip::ZipArchive<std::fs::File>,
    name: &str,
    pack_path_for_errors: &str,
) -> Result<Vec<u8>, QueryError> {
    let resolved = if archive.by_name(name).is_ok() {
        name.to_string()
    } else {
        let basename = name.rsplit('/').next().unwrap_or(name).to_lowercase();
        let mut found = None;
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|source| QueryError::Zip {
                path: std::path::PathBuf::from(pack_path_for_errors),
                source,
            })?;
            let entry_name = entry.name().to_string();
            if entry_name.to_lowercase().ends_with(&basename) {
                found = Some(entry_name);
                break;
            }
        }
        found.ok_or_else(|| QueryError::Zip {
            path: std::path::PathBuf::from(pack_path_for_errors),
            source: zip::result::ZipError::FileNotFound,
        })?
    };

    let mut entry = archive.by_name(&resolved).map_err(|source| QueryError::Zip {
        path: std::path::PathBuf::from(pack_path_for_errors),
        source,
    })?;
    let mut buf = Vec::new();
    entry
        .read_to_end(&mut buf)
        .map_err(|source| QueryError::Write {
            path: std::path::PathBuf::from(pack_path_for_errors),
            source,
        })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sample_pack(dir: &Path) -> (std::path::PathBuf, Vec<u8>) {
        let pack_path = dir.join("sample.pack");
        let file = std::fs::File::create(&pack_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("Flash/IAP.FLM", options).unwrap();
        zip.write_all(b"algo-bytes").unwrap();
        zip.start_file("MyDevice.svd", options).unwrap();
        zip.write_all(b"<svd/>").unwrap();
        zip.finish().unwrap();
        (pack_path, std::fs::read(dir.join("sample.pack")).unwrap())
    }

    fn device_record(pack_file: &str) -> DeviceRecord {
        let mut algorithm = std::collections::BTreeMap::new();
        algorithm.insert(
            "Flash/IAP.FLM".to_string(),
            crate::record::AlgorithmRegion {
                start: "0x0".to_string(),
                size: "0x80000".to_string(),
                ram_start: None,
                ram_size: None,
                default: true,
            },
        );
        DeviceRecord {
            pdsc_file: "http://example.com/a.pdsc".to_string(),
            pack_file: pack_file.to_string(),
            memory: Default::default(),
            algorithm,
            debug: Some("MyDevice.svd".to_string()),
            compile: None,
            core: None,
            processor: None,
            vendor: None,
        }
    }

    #[test]
    fn fresh_cache_with_no_prior_crawl_reads_as_an_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let blob_store = BlobStore::new(dir.path());
        let query = Query::new(&config, &blob_store);
        assert!(query.find_device("anything").unwrap().is_empty());
    }

    #[test]
    fn find_device_returns_only_the_top_scoring_tier() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let blob_store = BlobStore::new(dir.path());

        let mut index = GlobalIndex::new();
        index
            .devices
            .insert("STM32F407VG".to_string(), device_record("http://x/a.pack"));
        index
            .devices
            .insert("STM32F407VE".to_string(), device_record("http://x/a.pack"));
        index
            .devices
            .insert("NRF52840".to_string(), device_record("http://x/b.pack"));
        crate::index::persist_index(&config, &index).unwrap();
        crate::index::persist_aliases(&config, &GlobalAliases::new()).unwrap();

        let query = Query::new(&config, &blob_store);
        let matches = query.find_device("STM32F407VG").unwrap();
        let names: Vec<_> = matches.into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"STM32F407VG".to_string()));
    }

    #[test]
    fn flash_algorithm_reads_the_first_algorithm_from_the_cached_pack() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let blob_store = BlobStore::new(dir.path());

        let (_local_path, bytes) = sample_pack(dir.path());
        blob_store.write("http://example.com/a.pack", &bytes).unwrap();

        let mut index = GlobalIndex::new();
        index
            .devices
            .insert("MyDevice".to_string(), device_record("http://example.com/a.pack"));
        crate::index::persist_index(&config, &index).unwrap();
        crate::index::persist_aliases(&config, &GlobalAliases::new()).unwrap();

        let query = Query::new(&config, &blob_store);
        let algos = query.flash_algorithm("MyDevice", false).unwrap();
        assert_eq!(algos.len(), 1);
        assert_eq!(algos[0].1, b"algo-bytes");
    }

    #[test]
    fn svd_file_reads_the_debug_entry_from_the_cached_pack() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let blob_store = BlobStore::new(dir.path());

        let (_local_path, bytes) = sample_pack(dir.path());
        blob_store.write("http://example.com/a.pack", &bytes).unwrap();

        let mut index = GlobalIndex::new();
        index
            .devices
            .insert("MyDevice".to_string(), device_record("http://example.com/a.pack"));
        crate::index::persist_index(&config, &index).unwrap();
        crate::index::persist_aliases(&config, &GlobalAliases::new()).unwrap();

        let query = Query::new(&config, &blob_store);
        assert_eq!(query.svd_file("MyDevice").unwrap(), b"<svd/>");
    }

    #[test]
    fn unknown_device_is_reported_distinctly_from_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let blob_store = BlobStore::new(dir.path());
        crate::index::persist_index(&config, &GlobalIndex::new()).unwrap();
        crate::index::persist_aliases(&config, &GlobalAliases::new()).unwrap();

        let query = Query::new(&config, &blob_store);
        let err = query.device("NoSuchDevice").unwrap_err();
        assert!(matches!(err, QueryError::DeviceNotFound { .. }));
    }
}
