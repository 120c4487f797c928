//! Orchestrates a full cache-and-index run, merging per-PDSC extraction
//! results into the two global maps and persisting them as JSON.

use std::io::Read;
use std::path::Path;

use parking_lot::Mutex;

use crate::blob_store::BlobStore;
use crate::config::EngineConfig;
use crate::error::{IndexError, PdscError};
use crate::fetch::Fetcher;
use crate::pdsc::{extract_board_aliases, extract_device, PdscDocument};
use crate::pool;
use crate::progress::ProgressReporter;
use crate::record::{GlobalAliases, GlobalIndex};

/// One PDSC URL's worth of work: fetch it, cache it, parse it, and fold its
/// devices/boards into the shared maps. Optionally also fetches and caches
/// the PACK it resolves to (`cache_everything`'s extra step over
/// `cache_descriptors`).
fn process_pdsc(
    pdsc_url: &str,
    fetcher: &Fetcher,
    blob_store: &BlobStore,
    index: &Mutex<GlobalIndex>,
    aliases: &Mutex<GlobalAliases>,
    also_cache_pack: bool,
) {
    let bytes = match fetcher.fetch(pdsc_url) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(url = pdsc_url, error = %err, "failed to fetch PDSC");
            return;
        }
    };

    if let Err(err) = blob_store.write(pdsc_url, &bytes) {
        tracing::error!(url = pdsc_url, error = %err, "failed to cache PDSC");
        return;
    }

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(_) => {
            tracing::error!(url = pdsc_url, "PDSC is not valid UTF-8");
            return;
        }
    };

    let doc = match PdscDocument::parse(text, pdsc_url) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(url = pdsc_url, error = %err, "failed to parse PDSC");
            return;
        }
    };

    let pack_url = match crate::pack_url::resolve(&doc, pdsc_url) {
        Ok(pack_url) => pack_url,
        Err(PdscError::NotConforming { url }) => {
            tracing::error!(url, "PDSC does not conform, skipping PACK resolution");
            return;
        }
        Err(err) => {
            tracing::error!(url = pdsc_url, error = %err, "failed to resolve PACK url");
            return;
        }
    };

    let devices: Vec<_> = doc
        .devices()
        .into_iter()
        .filter_map(|d| Some((crate::pdsc::device_name(d)?, extract_device(d, pdsc_url, &pack_url)?)))
        .collect();
    let board_aliases = extract_board_aliases(&doc.boards());

    {
        let mut index = index.lock();
        for (name, device) in devices {
            index.devices.insert(name, device);
        }
    }
    {
        let mut aliases = aliases.lock();
        for (board, mounted) in board_aliases {
            aliases.add(board, mounted);
        }
    }

    if also_cache_pack {
        match fetcher.fetch(&pack_url) {
            Ok(bytes) => {
                if let Err(err) = blob_store.write(&pack_url, &bytes) {
                    tracing::error!(url = pack_url, error = %err, "failed to cache PACK");
                }
            }
            Err(err) => {
                tracing::warn!(url = pack_url, error = %err, "failed to fetch PACK");
            }
        }
    }
}

/// Runs `cache_descriptors` (`also_cache_pack = false`) or `cache_everything`
/// (`also_cache_pack = true`) against `pdsc_urls`, returning the freshly
/// built index and aliases.
pub fn build(
    pdsc_urls: Vec<String>,
    fetcher: &Fetcher,
    blob_store: &BlobStore,
    progress: &dyn ProgressReporter,
    also_cache_pack: bool,
) -> (GlobalIndex, GlobalAliases) {
    let index = Mutex::new(GlobalIndex::new());
    let aliases = Mutex::new(GlobalAliases::new());

    let message = if also_cache_pack {
        "Caching everything"
    } else {
        "Caching descriptors"
    };

    pool::dispatch(pdsc_urls, progress, message, |url| {
        process_pdsc(url, fetcher, blob_store, &index, &aliases, also_cache_pack);
    });

    (index.into_inner(), aliases.into_inner())
}

/// Loads `index.json`, falling back to an empty index when the file does not
/// exist yet (a fresh cache has no prior crawl to merge against).
pub fn load_index(config: &EngineConfig) -> Result<GlobalIndex, IndexError> {
    let path = config.index_path();
    match std::fs::read(&path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(GlobalIndex::new()),
        Err(source) => Err(IndexError::Read { path, source }),
    }
}

/// Loads `aliases.json`, falling back to an empty map when the file does not
/// exist yet.
pub fn load_aliases(config: &EngineConfig) -> Result<GlobalAliases, IndexError> {
    let path = config.aliases_path();
    match std::fs::read(&path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(GlobalAliases::new()),
        Err(source) => Err(IndexError::Read { path, source }),
    }
}

pub fn persist_index(config: &EngineConfig, index: &GlobalIndex) -> Result<(), IndexError> {
    crate::config::ensure_dir(&config.json_path).map_err(|source| IndexError::Persist {
        path: config.json_path.clone(),
        source,
    })?;
    let path = config.index_path();
    let file = std::fs::File::create(&path).map_err(|source| IndexError::Persist {
        path: path.clone(),
        source,
    })?;
    serde_json::to_writer(file, index)?;
    Ok(())
}

pub fn persist_aliases(config: &EngineConfig, aliases: &GlobalAliases) -> Result<(), IndexError> {
    crate::config::ensure_dir(&config.json_path).map_err(|source| IndexError::Persist {
        path: config.json_path.clone(),
        source,
    })?;
    let path = config.aliases_path();
    let file = std::fs::File::create(&path).map_err(|source| IndexError::Persist {
        path: path.clone(),
        source,
    })?;
    serde_json::to_writer(file, aliases)?;
    Ok(())
}

/// Merges a locally supplied PACK file into `index`/`aliases` and adopts it
/// into the blob store under its *derived* URL (not the local path).
pub fn add_local_pack(
    path: &Path,
    blob_store: &BlobStore,
    index: &mut GlobalIndex,
    aliases: &mut GlobalAliases,
) -> Result<(), IndexError> {
    let file = std::fs::File::open(path).map_err(|source| IndexError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| IndexError::Zip {
        path: path.to_path_buf(),
        source,
    })?;

    let mut pdsc_name = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|source| IndexError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        let name = entry.name().to_string();
        if name.to_uppercase().ends_with(".PDSC") {
            pdsc_name = Some(name);
            break;
        }
    }
    let pdsc_name = pdsc_name.ok_or_else(|| IndexError::MissingEmbeddedPdsc {
        path: path.to_path_buf(),
    })?;

    let mut pdsc_text = String::new();
    archive
        .by_name(&pdsc_name)
        .map_err(|source| IndexError::Zip {
            path: path.to_path_buf(),
            source,
        })?
        .read_to_string(&mut pdsc_text)
        .map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let doc = PdscDocument::parse(&pdsc_text, &pdsc_name)
        .map_err(|_| IndexError::MissingEmbeddedPdsc {
            path: path.to_path_buf(),
        })?;

    let basename = pdsc_name.rsplit('/').next().unwrap_or(&pdsc_name);
    let package_url = doc.package_url().ok_or_else(|| IndexError::MissingEmbeddedPdsc {
        path: path.to_path_buf(),
    })?;
    let pdsc_url = format!("{package_url}{basename}");
    let pack_url = crate::pack_url::resolve(&doc, &pdsc_url).map_err(|_| IndexError::MissingEmbeddedPdsc {
        path: path.to_path_buf(),
    })?;

    for device in doc.devices() {
        if let Some(record) = extract_device(device, &pdsc_url, &pack_url) {
            let name = crate::pdsc::device_name(device).expect("validated above");
            index.devices.insert(name, record);
        }
    }
    for (board, mounted) in extract_board_aliases(&doc.boards()) {
        aliases.add(board, mounted);
    }

    blob_store
        .adopt(path, &pack_url)
        .map_err(IndexError::from)?;

    Ok(())
}
