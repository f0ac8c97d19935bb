//! Loopback HTTP server receiving payloads from the scraper processes.

use crate::error::RelayError;
use crate::payload::{missing_keys, AdminPost, Envelope, ForumPost, RelayEvent};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{post, put},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared state of the relay routes
#[derive(Clone)]
pub struct RelayState {
    /// Where validated payloads are forwarded
    pub events: mpsc::Sender<RelayEvent>,
    /// Cancelled to stop the server
    pub shutdown: CancellationToken,
}

impl RelayState {
    /// Creates the state and the receiving end of its event channel.
    pub fn new(capacity: usize, shutdown: CancellationToken) -> (Self, mpsc::Receiver<RelayEvent>) {
        let (events, rx) = mpsc::channel(capacity.max(1));
        (Self { events, shutdown }, rx)
    }
}

type Reply = (StatusCode, Json<Envelope>);

/// Create the relay router with all endpoints
pub fn create_relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/ping", put(ping))
        .route("/admin/ping", put(ping))
        .route("/admin/shutdown", put(shutdown))
        .route("/internal", put(shutdown))
        .route("/admin/post", post(admin_post))
        .route("/osu/post", post(forum_post))
        // Older scrapers still post here
        .route("/post", post(forum_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on `127.0.0.1:port` until the state's shutdown token fires.
pub async fn start_relay_server(port: u16, state: RelayState) -> Result<(), RelayError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting relay server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;

    serve_relay(listener, state).await
}

/// Serve the relay on an already bound listener.
pub async fn serve_relay(
    listener: tokio::net::TcpListener,
    state: RelayState,
) -> Result<(), RelayError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Relay server listening on {}", addr);
    }

    let token = state.shutdown.clone();
    let app = create_relay_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    info!("Relay server stopped");
    Ok(())
}

async fn ping() -> Json<Envelope> {
    Json(Envelope::ok())
}

async fn shutdown(State(state): State<RelayState>) -> Json<Envelope> {
    info!("Relay shutdown requested");
    state.shutdown.cancel();
    Json(Envelope::ok())
}

async fn admin_post(
    State(state): State<RelayState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply {
    forward(&state, "/admin/post", body, AdminPost::REQUIRED_KEYS, RelayEvent::Admin).await
}

async fn forum_post(
    State(state): State<RelayState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply {
    forward(&state, "/osu/post", body, ForumPost::REQUIRED_KEYS, |post: ForumPost| {
        RelayEvent::Forum(Box::new(post))
    })
    .await
}

async fn forward<T, F>(
    state: &RelayState,
    route: &str,
    body: Result<Json<Value>, JsonRejection>,
    required: &[&str],
    into_event: F,
) -> Reply
where
    T: DeserializeOwned,
    F: FnOnce(T) -> RelayEvent,
{
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(route, "Rejected relay payload: {}", rejection.body_text());
            return bad_request(format!("invalid JSON body: {}", rejection.body_text()));
        }
    };

    let missing = missing_keys(&body, required);
    if !missing.is_empty() {
        warn!(route, ?missing, "Relay payload is incomplete");
        return bad_request(format!("missing keys: {}", missing.join(", ")));
    }

    let payload = match serde_json::from_value::<T>(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(route, "Relay payload has invalid fields: {}", e);
            return bad_request(format!("invalid payload: {e}"));
        }
    };

    // Never wait on a backed up poster; the scraper retries on 503
    if let Err(e) = state.events.try_send(into_event(payload)) {
        let msg = match e {
            TrySendError::Full(_) => "relay event queue is full",
            TrySendError::Closed(_) => "bot is not accepting relay events",
        };
        warn!(route, "Dropping relay payload: {}", msg);
        return (StatusCode::SERVICE_UNAVAILABLE, Json(Envelope::err(msg)));
    }

    debug!(route, "Forwarded relay payload");
    (StatusCode::OK, Json(Envelope::ok()))
}

fn bad_request(msg: String) -> Reply {
    (StatusCode::BAD_REQUEST, Json(Envelope::err(msg)))
}
