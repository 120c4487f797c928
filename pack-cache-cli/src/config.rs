//! Layers CLI flags over environment variables (handled by `clap`'s `env`
//! attribute) over platform defaults into an [`EngineConfig`].

use std::path::PathBuf;

use pack_cache::EngineConfig;

use crate::cli::Cli;

/// Resolves `cli` into an [`EngineConfig`], falling back to
/// `directories::ProjectDirs`' data directory when neither `--data-path` nor
/// `--json-path` (nor their `PACK_CACHE_*` environment equivalents) is set.
pub fn resolve(cli: &Cli) -> EngineConfig {
    let platform_default = directories::ProjectDirs::from("", "", "pack-cache")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".pack-cache"));

    let data_path = cli.data_path.clone().unwrap_or_else(|| platform_default.clone());
    let json_path = cli.json_path.clone().unwrap_or(platform_default);

    let mut config = EngineConfig::new(data_path)
        .with_json_path(json_path)
        .with_silent(cli.silent)
        .with_no_timeouts(cli.no_timeouts);

    if let Some(vidx_list) = &cli.vidx_list {
        config = config.with_vidx_url(vidx_list.clone());
    }

    config
}
