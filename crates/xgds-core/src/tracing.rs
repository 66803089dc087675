use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured stdout tracing. Call once at process startup.
/// Uses JSON format with env-filter (`RUST_LOG` env var, `info` when unset).
///
/// Safe to call multiple times; later calls are ignored.
pub fn init_tracing(process: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .try_init()
        .is_ok();
    if installed {
        ::tracing::info!(process, "tracing initialised");
    }
}
