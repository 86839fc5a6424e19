//! `tracing` subscriber bootstrap for processes embedding platelog.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogConfig, LogFormat};

/// Install a global subscriber built from `config`.
///
/// An unparseable filter directive falls back to the default one. Returns
/// `false` when a global subscriber was already installed, which leaves the
/// existing subscriber in place.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter '{}': {err}", config.filter);
        EnvFilter::new(LogConfig::default().filter)
    });

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };
    installed.is_ok()
}
