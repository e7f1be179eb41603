use tracing_subscriber::{fmt, EnvFilter};

/// Installs the process-wide `tracing` subscriber. Call once, from the
/// binary's `main`; library crates only ever emit `tracing::{debug,info,warn,error}!`
/// and never configure a subscriber themselves.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
