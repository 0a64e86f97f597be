//! Graceful shutdown via `CancellationToken`, with session tasks tracked so
//! shutdown can wait for their teardown.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TrackedFuture;
use tracing::{info, warn};

/// How long [`ShutdownCoordinator::graceful_shutdown`] waits by default.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans a single shutdown signal out to the accept loop and every session.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    sessions: TaskTracker,
}

impl ShutdownCoordinator {
    /// Create a coordinator that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token observers can await.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fire the signal. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether the signal has fired.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Register a session future; [`graceful_shutdown`](Self::graceful_shutdown)
    /// waits for it to complete.
    pub fn track_session<F: Future>(&self, session: F) -> TrackedFuture<F> {
        self.sessions.track_future(session)
    }

    /// Sessions registered and not yet finished.
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Fire the signal, then wait up to `timeout` for `handles` and every
    /// tracked session to finish.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        self.shutdown();
        let _ = self.sessions.close();
        info!(
            tasks = handles.len(),
            sessions = self.sessions.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for tasks to finish"
        );

        let drained = async {
            let _ = futures::future::join_all(handles).await;
            self.sessions.wait().await;
        };
        if tokio::time::timeout(timeout, drained).await.is_err() {
            warn!(?timeout, "shutdown timed out, abandoning remaining tasks");
        }
    }
}
