//! Mock orchestrator API server for integration tests
//!
//! Implements the handful of REST endpoints the gateway drives:
//! stateful sets, services, endpoint objects, and pod logs. State is
//! held in memory so tests can assert on what was created.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A running mock orchestrator
pub struct MockOrchestrator {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    statefulsets: Mutex<HashMap<String, Value>>,
    services: Mutex<HashMap<String, Value>>,
    /// service name → (ip, hostname, port) entries
    endpoints: Mutex<HashMap<String, Vec<(String, Option<String>, u16)>>>,
    /// per-workload status override; synthesized from the spec when absent
    statuses: Mutex<HashMap<String, Value>>,
    statefulset_creates: AtomicU32,
    statefulset_patches: AtomicU32,
}

impl MockOrchestrator {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route(
                "/apis/apps/v1/namespaces/{ns}/statefulsets",
                routing::post(create_statefulset),
            )
            .route(
                "/apis/apps/v1/namespaces/{ns}/statefulsets/{name}",
                routing::get(get_statefulset)
                    .patch(patch_statefulset)
                    .delete(delete_statefulset),
            )
            .route("/api/v1/namespaces/{ns}/services", routing::post(create_service))
            .route(
                "/api/v1/namespaces/{ns}/services/{name}",
                routing::delete(delete_service),
            )
            .route("/api/v1/namespaces/{ns}/endpoints/{name}", routing::get(get_endpoints))
            .route("/api/v1/namespaces/{ns}/pods/{pod}/log", routing::get(pod_logs))
            .with_state(Arc::clone(&state));

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

    /// Base URL for the orchestrator config
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register endpoint addresses for a service
    ///
    /// Each address is `(ip, hostname, port)`; tests pointing at local
    /// mock backends use `127.0.0.1` with no hostname and the mock's
    /// port.
    pub fn set_endpoints(&self, service: &str, addresses: Vec<(&str, Option<&str>, u16)>) {
        self.state.endpoints.lock().unwrap().insert(
            service.to_owned(),
            addresses
                .into_iter()
                .map(|(ip, hostname, port)| (ip.to_owned(), hostname.map(str::to_owned), port))
                .collect(),
        );
    }

    /// Override the status block reported for a workload
    pub fn set_status(&self, name: &str, status: Value) {
        self.state.statuses.lock().unwrap().insert(name.to_owned(), status);
    }

    /// Number of stateful-set create calls observed
    pub fn statefulset_creates(&self) -> u32 {
        self.state.statefulset_creates.load(Ordering::SeqCst)
    }

    /// Number of stateful-set patch calls observed
    pub fn statefulset_patches(&self) -> u32 {
        self.state.statefulset_patches.load(Ordering::SeqCst)
    }

    /// Whether a stateful set exists
    pub fn has_statefulset(&self, name: &str) -> bool {
        self.state.statefulsets.lock().unwrap().contains_key(name)
    }

    /// Stored stateful-set body
    pub fn statefulset(&self, name: &str) -> Option<Value> {
        self.state.statefulsets.lock().unwrap().get(name).cloned()
    }

    /// Whether a service exists
    pub fn has_service(&self, name: &str) -> bool {
        self.state.services.lock().unwrap().contains_key(name)
    }

    /// Stored service body
    pub fn service(&self, name: &str) -> Option<Value> {
        self.state.services.lock().unwrap().get(name).cloned()
    }
}

impl Drop for MockOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn create_statefulset(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.statefulset_creates.fetch_add(1, Ordering::SeqCst);

    let Some(name) = body["metadata"]["name"].as_str().map(str::to_owned) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    let mut statefulsets = state.statefulsets.lock().unwrap();
    if statefulsets.contains_key(&name) {
        return StatusCode::CONFLICT.into_response();
    }

    statefulsets.insert(name, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_statefulset(
    State(state): State<Arc<MockState>>,
    Path((_ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    let statefulsets = state.statefulsets.lock().unwrap();
    let Some(mut body) = statefulsets.get(&name).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    drop(statefulsets);

    let status = state.statuses.lock().unwrap().get(&name).cloned().unwrap_or_else(|| {
        let replicas = body["spec"]["replicas"].as_u64().unwrap_or(0);
        serde_json::json!({
            "readyReplicas": replicas,
            "updatedReplicas": replicas,
            "availableReplicas": replicas,
        })
    });
    body["status"] = status;

    Json(body).into_response()
}

async fn patch_statefulset(
    State(state): State<Arc<MockState>>,
    Path((_ns, name)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    state.statefulset_patches.fetch_add(1, Ordering::SeqCst);

    let mut statefulsets = state.statefulsets.lock().unwrap();
    let Some(existing) = statefulsets.get_mut(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // Shallow strategic merge: enough for replica/image/env patches
    if let Some(replicas) = patch["spec"]["replicas"].as_u64() {
        existing["spec"]["replicas"] = replicas.into();
    }
    if let Some(containers) = patch["spec"]["template"]["spec"]["containers"].as_array() {
        for container in containers {
            if let Some(image) = container["image"].as_str() {
                existing["spec"]["template"]["spec"]["containers"][0]["image"] = image.into();
            }
            if let Some(env) = container.get("env") {
                existing["spec"]["template"]["spec"]["containers"][0]["env"] = env.clone();
            }
        }
    }

    Json(existing.clone()).into_response()
}

async fn delete_statefulset(
    State(state): State<Arc<MockState>>,
    Path((_ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    if state.statefulsets.lock().unwrap().remove(&name).is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_service(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    let Some(name) = body["metadata"]["name"].as_str().map(str::to_owned) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    let mut services = state.services.lock().unwrap();
    if services.contains_key(&name) {
        return StatusCode::CONFLICT.into_response();
    }

    services.insert(name, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_service(
    State(state): State<Arc<MockState>>,
    Path((_ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    if state.services.lock().unwrap().remove(&name).is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_endpoints(
    State(state): State<Arc<MockState>>,
    Path((_ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    let endpoints = state.endpoints.lock().unwrap();
    let Some(addresses) = endpoints.get(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // One subset per address so each replica can publish its own port
    let subsets: Vec<Value> = addresses
        .iter()
        .map(|(ip, hostname, port)| {
            let address = match hostname {
                Some(hostname) => serde_json::json!({"ip": ip, "hostname": hostname}),
                None => serde_json::json!({"ip": ip}),
            };
            serde_json::json!({"addresses": [address], "ports": [{"port": port}]})
        })
        .collect();

    Json(serde_json::json!({"subsets": subsets})).into_response()
}

async fn pod_logs(Path((_ns, pod)): Path<(String, String)>) -> impl IntoResponse {
    format!("log line from {pod}")
}
