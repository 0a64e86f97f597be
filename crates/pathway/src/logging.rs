//! Global tracing subscriber setup.

use pathway_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level. Subsequent calls are no-ops.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_filter_str()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let _ = if settings.json {
        registry.with(fmt_layer.json()).try_init()
    } else {
        registry.with(fmt_layer.compact()).try_init()
    };
}
