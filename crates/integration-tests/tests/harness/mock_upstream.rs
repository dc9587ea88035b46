//! Mock MCP backend replica for data-plane tests
//!
//! Accepts any request, records what it saw, and answers with a fixed
//! JSON body. When configured with a session id it attaches the
//! `Mcp-Session-Id` header to responses, imitating a streamable-HTTP
//! server initializing a session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderName, HeaderValue, StatusCode};
use tokio_util::sync::CancellationToken;

static SESSION_HEADER: HeaderName = HeaderName::from_static("mcp-session-id");

/// A running mock backend
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<UpstreamState>,
}

struct UpstreamState {
    /// Tag echoed in response bodies so tests can tell replicas apart
    tag: String,
    /// Session id attached to responses, if any
    session_id: Option<String>,
    /// Status answered on every request
    status: StatusCode,
    hits: AtomicU32,
    last_path: Mutex<Option<String>>,
    last_session_header: Mutex<Option<String>>,
    last_forwarded_user: Mutex<Option<String>>,
}

impl MockUpstream {
    /// Start a backend that assigns the given session id
    pub async fn start(tag: &str, session_id: Option<&str>) -> anyhow::Result<Self> {
        Self::start_with_status(tag, session_id, StatusCode::OK).await
    }

    /// Start a backend that answers every request with `status`
    pub async fn start_with_status(tag: &str, session_id: Option<&str>, status: StatusCode) -> anyhow::Result<Self> {
        let state = Arc::new(UpstreamState {
            tag: tag.to_owned(),
            session_id: session_id.map(str::to_owned),
            status,
            hits: AtomicU32::new(0),
            last_path: Mutex::new(None),
            last_session_header: Mutex::new(None),
            last_forwarded_user: Mutex::new(None),
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Port the backend listens on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of requests received
    pub fn hits(&self) -> u32 {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Path of the most recent request
    pub fn last_path(&self) -> Option<String> {
        self.state.last_path.lock().unwrap().clone()
    }

    /// Session header of the most recent request
    pub fn last_session_header(&self) -> Option<String> {
        self.state.last_session_header.lock().unwrap().clone()
    }

    /// `X-Mcp-UserId` of the most recent request
    pub fn last_forwarded_user(&self) -> Option<String> {
        self.state.last_forwarded_user.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<UpstreamState>>, request: Request) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_path.lock().unwrap() = Some(request.uri().path().to_owned());
    *state.last_session_header.lock().unwrap() = request
        .headers()
        .get(&SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.last_forwarded_user.lock().unwrap() = request
        .headers()
        .get("x-mcp-userid")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = serde_json::json!({"ok": true, "backend": state.tag});
    let mut response = (state.status, axum::Json(body)).into_response();

    if let Some(ref session_id) = state.session_id
        && let Ok(value) = HeaderValue::from_str(session_id)
    {
        response.headers_mut().insert(SESSION_HEADER.clone(), value);
    }

    response
}
