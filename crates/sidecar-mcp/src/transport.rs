//! HTTP/SSE transport for the MCP server.
//!
//! A session is one long-lived `GET /sse` stream carrying every
//! server-to-client message, plus any number of short `POST
//! /messages?sessionId=<id>` requests carrying client-to-server messages.
//! The two sides meet in the [`SessionRegistry`]: the stream owner registers
//! an inbound queue, the post handlers look it up and push raw bodies into
//! it. Bodies are not decoded here; the session's protocol task does that.
//!
//! Dropping the SSE response (client disconnect, shutdown) drops the
//! session's guard, which deregisters it, so later posts for that id get 404.

use crate::error::McpError;
use crate::protocol::JsonRpcResponse;
use crate::server::McpServer;
use crate::session::{SessionHandle, SessionRegistry};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use sidecar_core::config::ServerConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const INBOUND_CAPACITY: usize = 32;
const OUTBOUND_CAPACITY: usize = 100;

/// Shared state of the HTTP transport.
pub struct TransportState {
    registry: Arc<SessionRegistry>,
    server: Arc<McpServer>,
    config: ServerConfig,
}

impl TransportState {
    /// Create transport state routing sessions to `server`.
    pub fn new(server: Arc<McpServer>, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            server,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Removes a session from the registry when the owning stream goes away.
struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.registry.remove(&self.id) {
            tracing::info!(session_id = %self.id, "Closed SSE session");
        }
    }
}

/// Query parameters of the messages endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Open a session: register it, start its protocol task, and return its id
/// with the stream of SSE events to send to the client.
///
/// The first event is `endpoint`, telling the client where to post messages.
pub fn open_session(
    state: &TransportState,
) -> Result<(String, impl Stream<Item = Result<Event, axum::Error>> + use<>), McpError> {
    let id = uuid::Uuid::new_v4().to_string();
    let (inbound_tx, inbound_rx) = mpsc::channel::<Bytes>(INBOUND_CAPACITY);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<JsonRpcResponse>(OUTBOUND_CAPACITY);

    state
        .registry
        .insert(SessionHandle::new(id.clone(), inbound_tx))?;
    let guard = SessionGuard {
        registry: state.registry.clone(),
        id: id.clone(),
    };

    tokio::spawn(run_session(
        id.clone(),
        inbound_rx,
        outbound_tx,
        state.server.clone(),
    ));

    let endpoint = format!("{}?sessionId={}", state.config().messages_path, id);
    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok(Event::default().event("endpoint").data(endpoint));
        while let Some(message) = outbound_rx.recv().await {
            yield Event::default().event("message").json_data(&message);
        }
    };

    Ok((id, stream))
}

/// Protocol task of one session.
///
/// Each message is handled on its own task so a slow query does not hold up
/// the rest of the session. Responses for a session that has gone away are
/// dropped.
async fn run_session(
    id: String,
    mut inbound: mpsc::Receiver<Bytes>,
    outbound: mpsc::Sender<JsonRpcResponse>,
    server: Arc<McpServer>,
) {
    while let Some(body) = inbound.recv().await {
        tracing::debug!(session_id = %id, bytes = body.len(), "Routing message");
        let server = server.clone();
        let outbound = outbound.clone();
        let id = id.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_message(&body).await
                && outbound.send(response).await.is_err()
            {
                tracing::debug!(session_id = %id, "Session closed, dropping response");
            }
        });
    }
    tracing::debug!(session_id = %id, "Session task finished");
}

/// Create the HTTP router for the gateway.
pub fn create_router(state: Arc<TransportState>) -> Router {
    let config = state.config().clone();
    Router::new()
        .route("/health", get(handle_health))
        .route(&config.sse_path, get(handle_sse))
        .route(&config.messages_path, post(handle_post_message))
        .layer(DefaultBodyLimit::max(config.max_message_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle GET requests to the SSE endpoint (session open).
async fn handle_sse(State(state): State<Arc<TransportState>>) -> Response {
    match open_session(&state) {
        Ok((id, stream)) => {
            tracing::info!(session_id = %id, "Opened SSE session");
            Sse::new(stream)
                .keep_alive(
                    KeepAlive::new()
                        .interval(Duration::from_secs(state.config().sse_keep_alive_seconds))
                        .text("ping"),
                )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to open SSE session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Handle POST requests to the messages endpoint.
async fn handle_post_message(
    State(state): State<Arc<TransportState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(session_id) = query.session_id else {
        return session_not_found();
    };
    let Some(handle) = state.registry.lookup(&session_id) else {
        tracing::warn!(session_id = %session_id, "Message for unknown session");
        return session_not_found();
    };

    match handle.deliver(body).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Session closed during delivery");
            session_not_found()
        }
    }
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "session not found" })),
    )
        .into_response()
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// HTTP server for the SSE transport.
pub struct HttpServer {
    state: Arc<TransportState>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(config: ServerConfig, server: Arc<McpServer>) -> Self {
        Self {
            state: Arc::new(TransportState::new(server, config)),
        }
    }

    pub fn state(&self) -> &Arc<TransportState> {
        &self.state
    }

    /// Run the HTTP server until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<(), McpError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the HTTP server until `shutdown` resolves.
    ///
    /// On shutdown every session is closed so the open streams end and the
    /// listener can drain.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), McpError> {
        let address = self.state.config().bind_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| McpError::StartupFailed(format!("Failed to bind to {}: {}", address, e)))?;

        tracing::info!(address = %address, "MCP SSE gateway listening");

        let registry = self.state.registry.clone();
        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(async move {
                shutdown.await;
                let closed = registry.close_all();
                tracing::info!(sessions = closed, "Shutting down, closed open sessions");
            })
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
