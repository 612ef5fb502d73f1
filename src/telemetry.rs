use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global `fmt` subscriber. `RUST_LOG` overrides the default
/// `info` level; actix's `log` records are bridged into the same output.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}
