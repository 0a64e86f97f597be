//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before any metric is recorded. The returned handle
/// renders the `/metrics` endpoint.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render the Prometheus text exposition.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// WebSocket connections accepted (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Open WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connections ended (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Connection lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Decoded commands (counter, labels: command).
pub const SESSION_COMMANDS_TOTAL: &str = "session_commands_total";
/// Messages dropped without effect (counter, labels: reason).
pub const SESSION_COMMANDS_IGNORED_TOTAL: &str = "session_commands_ignored_total";
/// Frames written to clients (counter).
pub const SESSION_EVENTS_WRITTEN_TOTAL: &str = "session_events_written_total";
/// Sessions that ended with an error (counter, labels: kind).
pub const SESSION_FAULTS_TOTAL: &str = "session_faults_total";
