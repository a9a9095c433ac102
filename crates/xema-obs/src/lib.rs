//! Logging setup shared by the XEMA binaries

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is unset or unparseable
pub const DEFAULT_FILTER: &str = "info,xema=debug";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: JSON lines on stdout, with the current
/// span's fields (station, anchor) attached to every event.
pub fn init(service_name: &str) {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_current_span(true).with_span_list(false))
        .init();

    tracing::info!(service = %service_name, version = env!("CARGO_PKG_VERSION"), "logging initialized");
}
