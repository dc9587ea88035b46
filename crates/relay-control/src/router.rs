use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use http::{StatusCode, header};
use relay_core::Principal;
use serde::Deserialize;

use crate::error::ControlError;
use crate::service::{ManagedResource, ResourceService};

/// Build the control-plane router for one record kind
///
/// Routes are registered under `base` (`/adapters` or `/tools`), which
/// is also echoed in `Location` headers. Absolute paths keep the
/// sibling data-plane routes (`{base}/{name}/mcp`) conflict-free.
pub fn resource_router<R>(service: Arc<ResourceService<R>>, base: &'static str) -> Router
where
    R: ManagedResource + serde::Serialize,
    R::Data: serde::de::DeserializeOwned,
{
    let state = ControlState { service, base };

    Router::new()
        .route(base, get(list_resources).post(create_resource))
        .route(
            &format!("{base}/{{name}}"),
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route(&format!("{base}/{{name}}/status"), get(resource_status))
        .route(&format!("{base}/{{name}}/logs"), get(resource_logs))
        .with_state(state)
}

struct ControlState<R: ManagedResource> {
    service: Arc<ResourceService<R>>,
    base: &'static str,
}

impl<R: ManagedResource> Clone for ControlState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            base: self.base,
        }
    }
}

async fn create_resource<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Json(data): Json<R::Data>,
) -> Result<impl IntoResponse, ControlErrorResponse>
where
    R: ManagedResource + serde::Serialize,
    R::Data: serde::de::DeserializeOwned,
{
    let record = state.service.create(&principal, data).await?;
    let location = format!("{}/{}", state.base, relay_store::Named::name(&record));

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(record),
    ))
}

async fn list_resources<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<R>>, ControlErrorResponse>
where
    R: ManagedResource + serde::Serialize,
{
    let records = state.service.list(&principal).await?;
    Ok(Json(records))
}

async fn get_resource<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<Json<R>, ControlErrorResponse>
where
    R: ManagedResource + serde::Serialize,
{
    let record = state.service.get(&principal, &name).await?;
    Ok(Json(record))
}

async fn update_resource<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Json(data): Json<R::Data>,
) -> Result<Json<R>, ControlErrorResponse>
where
    R: ManagedResource + serde::Serialize,
    R::Data: serde::de::DeserializeOwned,
{
    let record = state.service.update(&principal, &name, data).await?;
    Ok(Json(record))
}

async fn delete_resource<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<StatusCode, ControlErrorResponse>
where
    R: ManagedResource,
{
    state.service.delete(&principal, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resource_status<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ControlErrorResponse>
where
    R: ManagedResource,
{
    let status = state.service.status(&principal, &name).await?;
    Ok(Json(status))
}

/// Query parameters for the logs endpoint
#[derive(Debug, Deserialize)]
struct LogsQuery {
    /// Replica ordinal to read from
    #[serde(default)]
    instance: u32,
}

async fn resource_logs<R>(
    State(state): State<ControlState<R>>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ControlErrorResponse>
where
    R: ManagedResource,
{
    let logs = state.service.logs(&principal, &name, query.instance).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        logs,
    ))
}

/// Error response wrapper that implements `IntoResponse`
struct ControlErrorResponse(ControlError);

impl From<ControlError> for ControlErrorResponse {
    fn from(e: ControlError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ControlErrorResponse {
    fn into_response(self) -> axum::response::Response {
        use relay_core::HttpError;

        let status = self.0.status_code();
        let body = serde_json::json!({
            "error": {
                "type": self.0.error_type(),
                "message": self.0.client_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}
