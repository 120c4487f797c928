//! Sets up `tracing-subscriber`: compact formatter, `EnvFilter`-driven level,
//! a single stdout layer (no file logging surface).

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `silent` forces the level to
/// `off`; otherwise `RUST_LOG` is honored, defaulting to `info`.
pub fn setup(silent: bool) {
    let filter = if silent {
        EnvFilter::new("off")
    } else {
        EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .from_env_lossy()
    };

    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_env_filter(filter)
        .init();
}
