//! Debug server
//!
//! Small HTTP console started in debug mode. It exposes the retained log
//! backlog and a summary of the logger's state.

use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::info;

use crate::logging::{strip_color, Logger, LoggerError};

/// Handle to control the running server
#[derive(Debug)]
pub struct DebugServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    addr: SocketAddr,
}

impl DebugServerHandle {
    /// Get the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check if `stop` has not been called yet
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Shut the server down gracefully. Later calls do nothing.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if the server task already ended
            let _ = tx.send(());
        }
    }
}

/// Body of `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    /// Logger lifecycle state
    pub state: String,
    /// Records currently retained
    pub retained: usize,
    /// Records written since startup
    pub written: u64,
    /// Status notices waiting for the UI
    pub pending_status: usize,
}

impl StatusReport {
    fn from_logger(logger: &Logger) -> Self {
        Self {
            state: logger.state().to_string(),
            retained: logger.len(),
            written: logger.written(),
            pending_status: logger.pending_count(),
        }
    }
}

/// Start the debug server on the current tokio runtime
///
/// The server only holds a weak reference, so it never keeps the logger alive.
pub fn start(addr: SocketAddr, logger: Weak<Logger>) -> Result<DebugServerHandle, LoggerError> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| LoggerError::NoRuntime("debug server"))?;
    let bind_error = move |source| LoggerError::DebugServer { addr, source };

    let std_listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
    std_listener.set_nonblocking(true).map_err(bind_error)?;
    let listener = tokio::net::TcpListener::from_std(std_listener).map_err(bind_error)?;
    let bound_addr = listener.local_addr().map_err(bind_error)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    runtime.spawn(async move {
        axum::serve(listener, router(logger))
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                info!("debug server shutting down");
            })
            .await
            .ok();
    });

    Ok(DebugServerHandle {
        shutdown_tx: Some(shutdown_tx),
        addr: bound_addr,
    })
}

fn router(logger: Weak<Logger>) -> Router {
    Router::new()
        .route("/logs", get(logs_handler))
        .route("/status", get(status_handler))
        .with_state(logger)
}

fn upgrade(logger: &Weak<Logger>) -> Result<Arc<Logger>, StatusCode> {
    logger.upgrade().ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// GET /logs: retained backlog, one uncolored line per record
async fn logs_handler(State(logger): State<Weak<Logger>>) -> Result<String, StatusCode> {
    let logger = upgrade(&logger)?;
    let mut body = String::new();
    for line in logger.snapshot() {
        body.push_str(&strip_color(&line));
        body.push('\n');
    }
    Ok(body)
}

/// GET /status: logger state summary
async fn status_handler(
    State(logger): State<Weak<Logger>>,
) -> Result<Json<StatusReport>, StatusCode> {
    let logger = upgrade(&logger)?;
    Ok(Json(StatusReport::from_logger(&logger)))
}
