use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `tracing` subscriber honouring `RUST_LOG`, defaulting to `info`.
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(true);

    if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.compact().try_init()
    }
}
