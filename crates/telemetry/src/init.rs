// Path: crates/telemetry/src/init.rs
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset. HTTP client internals are noisy at `info`.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn,h2=warn";

/// Installs the process-wide JSON `tracing` subscriber writing to stderr, and
/// routes `log` records from dependencies into it. Fails if called twice.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    let json_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(Registry::default().with(filter).with(json_layer))?;
    Ok(())
}
