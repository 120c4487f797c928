mod cli;
mod config;
mod logging;
mod progress;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use cli::{Cli, Command};
use pack_cache::Engine;

fn main() {
    let cli = Cli::parse();
    logging::setup(cli.silent);

    if let Err(err) = run(&cli) {
        tracing::error!(error = %err, "pack-cache-cli failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let engine_config = config::resolve(cli);

    let engine = if cli.silent {
        Engine::new(engine_config)
    } else {
        Engine::with_progress(engine_config, Arc::new(progress::IndicatifProgress::new()))
    };

    match &cli.command {
        Command::CacheEverything => engine
            .cache_everything()
            .context("cache-everything failed")?,
        Command::CacheDescriptors => engine
            .cache_descriptors()
            .context("cache-descriptors failed")?,
        Command::DumpParts { dir, query } => engine
            .query()
            .dump_parts(dir, query)
            .context("dump-parts failed")?,
        Command::AddPacks { paths } => {
            for path in paths {
                engine
                    .add_local_pack(path)
                    .with_context(|| format!("failed to add pack {}", path.display()))?;
            }
        }
        Command::PrintCacheDir => {
            println!("{}", engine.cache_dir().display());
        }
    }

    Ok(())
}
