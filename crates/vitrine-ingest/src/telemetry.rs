use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for binaries and embedders.
///
/// Honors `RUST_LOG`; defaults to debug-level output for the vitrine crates.
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "vitrine=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
