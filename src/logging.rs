//! Tracing subscriber setup
//!
//! Native builds log to stderr through a `tracing-subscriber` fmt layer.
//! `RUST_LOG` takes precedence over the configured default directive.
//! WASM builds install no subscriber; events are dropped.

/// Install the global subscriber. Call once, early in `main`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(default_filter: &str) {
    use tracing_subscriber::{fmt, fmt::time, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(time::uptime()).with_target(true))
        .try_init();

    if let Err(e) = result {
        eprintln!("logging already initialized: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
pub fn init(_default_filter: &str) {}
