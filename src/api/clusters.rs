//! Cluster creation and deletion
//!
//! Each handler runs its kubectl steps strictly in order and stops at the
//! first failure. Nothing already applied is rolled back.

use super::{ApiError, AppState};
use crate::kubectl::{ResourceKind, ToolError};
use crate::template::{ManifestKind, TemplateData};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tracing::info;

/// Body of `POST /v1/clusters`
///
/// The name is not validated here; kubectl decides what it accepts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClusterRequest {
    #[serde(default)]
    pub name: String,
}

/// Body of a 202 creation response
///
/// Only `name` reflects the request. Everything else is a fixed
/// placeholder, not real provisioning state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterResponse {
    pub kubernetes_master_ips: Vec<String>,
    pub last_action: String,
    pub last_action_description: String,
    pub last_action_state: String,
    pub name: String,
    pub network_profile_name: String,
    pub parameters: ClusterParameters,
    pub plan_name: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterParameters {
    pub authorization_mode: String,
    pub kubernetes_master_host: String,
    pub kubernetes_master_port: u16,
    pub kubernetes_worker_instances: u32,
    pub nsxt_network_profile: String,
    pub worker_haproxy_ip_addresses: String,
}

const PLACEHOLDER: &str = "string";

impl ClusterResponse {
    /// Response for a cluster whose manifests were just applied
    pub fn in_progress(name: impl Into<String>) -> Self {
        let placeholder = || PLACEHOLDER.to_string();
        ClusterResponse {
            kubernetes_master_ips: vec![placeholder()],
            last_action: placeholder(),
            last_action_description: placeholder(),
            last_action_state: "in progress".to_string(),
            name: name.into(),
            network_profile_name: placeholder(),
            parameters: ClusterParameters {
                authorization_mode: placeholder(),
                kubernetes_master_host: placeholder(),
                kubernetes_master_port: 8443,
                kubernetes_worker_instances: 0,
                nsxt_network_profile: placeholder(),
                worker_haproxy_ip_addresses: placeholder(),
            },
            plan_name: placeholder(),
            uuid: placeholder(),
        }
    }
}

fn apply_operation(kind: ManifestKind) -> &'static str {
    match kind {
        ManifestKind::Cluster => "apply_cluster",
        ManifestKind::Master => "apply_master",
    }
}

/// Run one kubectl step, recording its duration and outcome
async fn tool_step<F>(
    state: &AppState,
    operation: &'static str,
    invocation: F,
) -> Result<(), ApiError>
where
    F: Future<Output = Result<(), ToolError>>,
{
    let start = Instant::now();
    let result = invocation.await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(()) => {
            state.metrics.record_tool_success(operation, elapsed);
            Ok(())
        }
        Err(source) => {
            state.metrics.record_tool_error(operation, elapsed);
            Err(ApiError::Tool { operation, source })
        }
    }
}

fn finish(state: &AppState, handler: &'static str, result: Result<Response, ApiError>) -> Response {
    let response = result.unwrap_or_else(IntoResponse::into_response);
    state
        .metrics
        .record_response(handler, response.status().as_u16());
    response
}

async fn provision(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let request: ClusterRequest = serde_json::from_slice(body)?;
    let name = request.name;
    info!(cluster = %name, "Creating cluster");

    tool_step(state, "create_namespace", state.tool.create_namespace(&name)).await?;

    let data = TemplateData::for_cluster(&name, &state.gcp_project);
    for kind in [ManifestKind::Cluster, ManifestKind::Master] {
        let manifest = state.templates.render(kind, &data)?;
        tool_step(state, apply_operation(kind), state.tool.apply(&manifest)).await?;
    }

    info!(cluster = %name, "Cluster manifests applied");
    Ok((StatusCode::ACCEPTED, Json(ClusterResponse::in_progress(name))).into_response())
}

async fn teardown(state: &AppState, cluster: &str) -> Result<Response, ApiError> {
    if cluster.trim().is_empty() {
        return Err(ApiError::BadRequest("cluster name missing from path"));
    }
    info!(cluster = %cluster, "Deleting cluster");

    tool_step(
        state,
        "delete_machines",
        state.tool.delete_all(cluster, ResourceKind::Machines),
    )
    .await?;
    tool_step(
        state,
        "delete_clusters",
        state.tool.delete_all(cluster, ResourceKind::Clusters),
    )
    .await?;
    tool_step(state, "delete_namespace", state.tool.delete_namespace(cluster)).await?;

    info!(cluster = %cluster, "Cluster deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `POST /v1/clusters`
///
/// The body is decoded by hand so malformed JSON is a 500 like every
/// other failure, not an extractor rejection.
pub async fn create_cluster(State(state): State<AppState>, body: Bytes) -> Response {
    let result = provision(&state, &body).await;
    finish(&state, "create_cluster", result)
}

/// `DELETE /v1/clusters/{cluster}`
pub async fn delete_cluster(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> Response {
    let result = teardown(&state, &cluster).await;
    finish(&state, "delete_cluster", result)
}

/// `DELETE /v1/clusters/` with an empty cluster segment
pub async fn missing_cluster(State(state): State<AppState>) -> Response {
    finish(
        &state,
        "delete_cluster",
        Err(ApiError::BadRequest("cluster name missing from path")),
    )
}
