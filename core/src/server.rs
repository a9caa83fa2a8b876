//! Local HTTP endpoint receiving game-state pushes.
//!
//! One route: `POST /`. Everything else is 404. Malformed bodies get a 400
//! instead of the silent-success some GSI consumers use, so a misconfigured
//! game client is visible from its own console.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::BridgeError;
use crate::gsi::parse_snapshot;
use crate::presence::{PresenceClient, PresenceSync};

/// Pushes are small; anything bigger than this is not the game.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the ingestion router around a shared synchronizer.
pub fn router<C>(sync: Arc<PresenceSync<C>>) -> Router
where
    C: PresenceClient + Send + 'static,
{
    Router::new()
        .route("/", post(ingest::<C>).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(map_response(allow_any_origin))
        .with_state(sync)
}

async fn ingest<C>(
    State(sync): State<Arc<PresenceSync<C>>>,
    body: axum::body::Bytes,
) -> Response
where
    C: PresenceClient + Send + 'static,
{
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(_) => return bad_request("body is not valid UTF-8"),
    };

    let snapshot = match parse_snapshot(text) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(%err, "rejected malformed game-state push");
            return bad_request(&err.to_string());
        }
    };

    // The sync lock is a plain mutex; keep it off the async executor.
    let applied = tokio::task::spawn_blocking(move || sync.apply_snapshot(snapshot)).await;
    match applied {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"success": true}))).into_response(),
        Ok(Err(err)) => {
            error!(%err, "failed applying game-state push");
            internal_error()
        }
        Err(err) => {
            error!(%err, "game-state apply task failed");
            internal_error()
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response()
}

fn bad_request(reason: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": reason}))).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

/// Running ingestion listener. `stop` drains in-flight handlers and releases
/// the socket; starting again is a fresh bind.
pub struct IngestServer {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), BridgeError>>,
    local_addr: SocketAddr,
}

impl IngestServer {
    pub async fn start<C>(addr: &str, sync: Arc<PresenceSync<C>>) -> Result<Self, BridgeError>
    where
        C: PresenceClient + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let app = router(sync);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .map_err(BridgeError::from)
        });

        info!("game-state ingestion listening on http://{local_addr}/");
        Ok(Self {
            shutdown,
            task,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal the accept loop, wait for in-flight handlers, release the
    /// socket. A serve-loop fault leaves the endpoint stopped; restarting is
    /// an operator decision.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(Ok(())) => info!("ingestion listener stopped"),
            Ok(Err(err)) => error!(%err, "ingestion listener exited with error"),
            Err(err) => error!(%err, "ingestion listener task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::testing::RecordingClient;
    use axum::body::Body;
    use axum::http::Request;
    use fraglight_types::BridgeSettings;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        client: RecordingClient,
        sync: Arc<PresenceSync<RecordingClient>>,
    }

    fn harness() -> Harness {
        let client = RecordingClient::default();
        let running = Arc::new(AtomicBool::new(true));
        let mut settings = BridgeSettings::default();
        settings.min_dispatch_interval_ms = 0;
        let sync = Arc::new(PresenceSync::new(
            client.clone(),
            settings,
            Arc::clone(&running),
        ));
        Harness {
            app: router(Arc::clone(&sync)),
            client,
            sync,
        }
    }

    fn post_root(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn valid_push_returns_success_and_updates_state() {
        let h = harness();
        let response = h
            .app
            .oneshot(post_root(r#"{"map":{"name":"de_dust2"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"success": true}));
        assert!(h.sync.is_in_match());
        assert_eq!(h.client.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_400_and_does_not_mutate_state() {
        let h = harness();
        let response = h.app.oneshot(post_root("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("error").is_some());
        assert!(!h.sync.is_in_match());
        assert_eq!(h.client.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn other_paths_and_methods_are_404() {
        let h = harness();
        let response = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Not found"}));

        let response = h
            .app
            .oneshot(post_root(""))
            .await
            .unwrap();
        // Empty body is still a parse failure, not a missing route.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/other")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let h = harness();
        let big = "x".repeat(MAX_BODY_BYTES + 1);
        let response = h.app.oneshot(post_root(&big)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn every_response_carries_the_cors_header() {
        let h = harness();
        let response = h
            .app
            .clone()
            .oneshot(post_root(r#"{"map":{"name":"de_dust2"}}"#))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }
}
