//! `PathwayServer`: axum router, WebSocket upgrade, and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::http::{HeaderValue, header};
use axum::response::{Json, Response};
use axum::routing::get;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use pathway_search::{AStarEngine, PathSearch};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_SERVER_TOKEN, ServerConfig};
use crate::health::{self, HealthResponse};
use crate::metrics::{
    SESSION_FAULTS_TOTAL, WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE,
    WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};
use crate::session::Session;
use crate::shutdown::ShutdownCoordinator;
use crate::transport::WsTransport;

/// Builds a fresh, empty engine for each new session.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn PathSearch> + Send + Sync>;

/// Factory producing Euclidean [`AStarEngine`]s.
pub fn astar_engine_factory() -> EngineFactory {
    Arc::new(|| -> Box<dyn PathSearch> { Box::new(AStarEngine::new()) })
}

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engine constructor for new sessions.
    pub engines: EngineFactory,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Currently open WebSocket connections.
    pub open_connections: Arc<AtomicUsize>,
    /// Prometheus handle for `/metrics`.
    pub metrics: PrometheusHandle,
    /// `Server` header on upgrade responses.
    pub server_token: HeaderValue,
    /// Largest accepted inbound message.
    pub max_message_size: usize,
    /// Idle timeout applied to every session.
    pub idle_timeout: Duration,
}

/// The Pathway WebSocket server.
pub struct PathwayServer {
    config: ServerConfig,
    engines: EngineFactory,
    shutdown: Arc<ShutdownCoordinator>,
    open_connections: Arc<AtomicUsize>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

impl PathwayServer {
    /// Create a server whose sessions use [`AStarEngine`].
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        Self {
            config,
            engines: astar_engine_factory(),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            open_connections: Arc::new(AtomicUsize::new(0)),
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Replace the engine factory.
    #[must_use]
    pub fn with_engine_factory(mut self, engines: EngineFactory) -> Self {
        self.engines = engines;
        self
    }

    /// Build the axum router with all routes.
    ///
    /// The upgrade is served on `/ws` and on `/`, where the browser client
    /// connects.
    pub fn router(&self) -> Router {
        let server_token = HeaderValue::from_str(&self.config.server_token).unwrap_or_else(|_| {
            warn!(
                token = %self.config.server_token,
                "server token is not a valid header value, using default"
            );
            HeaderValue::from_static(DEFAULT_SERVER_TOKEN)
        });

        let state = AppState {
            engines: Arc::clone(&self.engines),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
            open_connections: Arc::clone(&self.open_connections),
            metrics: self.metrics.clone(),
            server_token,
            max_message_size: self.config.max_message_size,
            idle_timeout: self.config.idle_timeout,
        };

        Router::new()
            .route("/", get(ws_handler))
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
    }

    /// Bind and start serving in a background task.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task,
    /// which finishes after [`ShutdownCoordinator::shutdown`].
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown.token();

        info!(%addr, "pathway server listening");
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(error) = served {
                error!(%error, "server terminated");
            }
            info!("server stopped accepting connections");
        });
        Ok((addr, handle))
    }

    /// The shutdown coordinator, which also tracks session tasks.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Currently open WebSocket connections.
    pub fn connection_count(&self) -> usize {
        self.open_connections.load(Ordering::Relaxed)
    }
}

/// GET `/` and `/ws`: upgrade to a WebSocket and run a session on it.
///
/// The session task is tracked by the shutdown coordinator so graceful
/// shutdown waits for its teardown.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let session = Session::new((state.engines)()).with_idle_timeout(state.idle_timeout);
    let coordinator = Arc::clone(&state.shutdown);
    let shutdown = coordinator.token();
    let open = Arc::clone(&state.open_connections);

    let mut response = ws
        .max_message_size(state.max_message_size)
        .on_failed_upgrade(|error: axum::Error| warn!(%error, "websocket handshake failed"))
        .on_upgrade(move |socket| {
            coordinator.track_session(run_connection(socket, session, shutdown, open))
        });
    let _ = response
        .headers_mut()
        .insert(header::SERVER, state.server_token);
    response
}

async fn run_connection(
    socket: WebSocket,
    mut session: Session,
    shutdown: CancellationToken,
    open: Arc<AtomicUsize>,
) {
    let _guard = ConnectionGuard::open(open);
    let session_id = session.id();
    info!(%session_id, "client connected");

    let mut transport = WsTransport::new(socket);
    if let Err(error) = session.run(&mut transport, shutdown).await {
        counter!(SESSION_FAULTS_TOTAL, "kind" => error.kind()).increment(1);
        warn!(%session_id, %error, "session ended with error");
    }
    info!(%session_id, "client disconnected");
}

/// GET `/health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    // One session per connection.
    let open = state.open_connections.load(Ordering::Relaxed);
    Json(health::health_check(state.start_time, open, open))
}

/// GET `/metrics`
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// Keeps connection counters accurate on every exit path.
struct ConnectionGuard {
    open: Arc<AtomicUsize>,
    started: Instant,
}

impl ConnectionGuard {
    fn open(open: Arc<AtomicUsize>) -> Self {
        let _ = open.fetch_add(1, Ordering::Relaxed);
        counter!(WS_CONNECTIONS_TOTAL).increment(1);
        gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
        Self {
            open,
            started: Instant::now(),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let _ = self.open.fetch_sub(1, Ordering::Relaxed);
        counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
        gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
        histogram!(WS_CONNECTION_DURATION_SECONDS).record(self.started.elapsed().as_secs_f64());
    }
}
