use std::path::{Path, PathBuf};

/// The default root vendor index, served by Keil/ARM.
pub const DEFAULT_VIDX_URL: &str = "http://www.keil.com/pack/index.idx";

/// Construction-time configuration for an [`Engine`](crate::Engine).
///
/// Every field has a sensible default via [`EngineConfig::new`]; callers
/// override only what they need.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Suppresses progress output when set.
    pub silent: bool,
    /// Disables the connect and low-speed timeouts on HTTP fetches.
    pub no_timeouts: bool,
    /// Directory that `index.json` and `aliases.json` are written to and read from.
    pub json_path: PathBuf,
    /// Directory that downloaded blobs are cached under.
    pub data_path: PathBuf,
    /// Override for the root vendor index URL.
    pub vidx_url: String,
}

impl EngineConfig {
    /// Builds a config rooted at `data_path` for both blobs and JSON, pointed
    /// at the default vendor index, with timeouts enabled and progress
    /// output on.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        let data_path = data_path.into();
        EngineConfig {
            silent: false,
            no_timeouts: false,
            json_path: data_path.clone(),
            data_path,
            vidx_url: DEFAULT_VIDX_URL.to_string(),
        }
    }

    pub fn with_json_path(mut self, json_path: impl Into<PathBuf>) -> Self {
        self.json_path = json_path.into();
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_no_timeouts(mut self, no_timeouts: bool) -> Self {
        self.no_timeouts = no_timeouts;
        self
    }

    pub fn with_vidx_url(mut self, vidx_url: impl Into<String>) -> Self {
        self.vidx_url = vidx_url.into();
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.json_path.join("index.json")
    }

    pub fn aliases_path(&self) -> PathBuf {
        self.json_path.join("aliases.json")
    }
}

pub(crate) fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
