//! HTTP API
//!
//! Routes:
//! - `/oauth/token` (any method) - canned bearer token
//! - `POST /v1/clusters` - create namespace, apply cluster and master manifests
//! - `DELETE /v1/clusters/{cluster}` - delete machines, clusters, then the namespace
//!
//! Failures are reported as a bare status code. The cause only goes to
//! the log.

mod clusters;
mod token;

pub use clusters::{
    create_cluster, delete_cluster, ClusterParameters, ClusterRequest, ClusterResponse,
};
pub use token::{token, TOKEN_RESPONSE};

use crate::kubectl::{ClusterTool, ToolError};
use crate::server::SharedMetrics;
use crate::template::{ManifestTemplates, TemplateError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, delete, post},
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

/// Everything a request handler needs, built once in `main`
#[derive(Clone)]
pub struct AppState {
    pub gcp_project: Arc<str>,
    pub templates: Arc<ManifestTemplates>,
    pub tool: Arc<dyn ClusterTool>,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(
        gcp_project: impl Into<Arc<str>>,
        templates: ManifestTemplates,
        tool: Arc<dyn ClusterTool>,
        metrics: SharedMetrics,
    ) -> Self {
        AppState {
            gcp_project: gcp_project.into(),
            templates: Arc::new(templates),
            tool,
            metrics,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error decoding request body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] TemplateError),

    #[error("kubectl {operation} failed: {source}")]
    Tool {
        operation: &'static str,
        #[source]
        source: ToolError,
    },

    #[error("Bad request: {0}")]
    BadRequest(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Decode(_) | ApiError::Render(_) | ApiError::Tool { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        status.into_response()
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/oauth/token", any(token))
        .route("/v1/clusters", post(create_cluster))
        .route("/v1/clusters/", delete(clusters::missing_cluster))
        .route("/v1/clusters/{cluster}", delete(delete_cluster))
        .with_state(state)
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
