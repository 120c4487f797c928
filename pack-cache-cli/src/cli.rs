//! `clap` argument definitions. Dispatch logic lives in `main.rs`; this
//! module only describes the surface, per §4.10 of SPEC_FULL.md.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pack-cache", version, about = "Mirror and query the ARM CMSIS-Pack catalog")]
pub struct Cli {
    /// Directory downloaded PDSC/PACK blobs are cached under.
    #[arg(long, global = true, env = "PACK_CACHE_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Directory `index.json`/`aliases.json` are written to and read from.
    #[arg(long, global = true, env = "PACK_CACHE_JSON_PATH")]
    pub json_path: Option<PathBuf>,

    /// Override for the root vendor index URL.
    #[arg(long, global = true, env = "PACK_CACHE_VIDX_LIST")]
    pub vidx_list: Option<String>,

    /// Suppress progress output.
    #[arg(long, global = true)]
    pub silent: bool,

    /// Disable the connect and low-speed timeouts on HTTP fetches.
    #[arg(long, global = true)]
    pub no_timeouts: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the root index, every PDSC, and every resolved PACK archive.
    CacheEverything,
    /// Fetch the root index and every PDSC, without fetching PACK archives.
    CacheDescriptors,
    /// Write the index plus a matched device's flash algorithms into `dir`.
    DumpParts { dir: PathBuf, query: String },
    /// Merge one or more local PACK files into the cache.
    AddPacks { paths: Vec<PathBuf> },
    /// Print the resolved data directory and exit.
    PrintCacheDir,
}
