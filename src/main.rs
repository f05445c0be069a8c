use anyhow::Context as _;
use pks_mock::api::{router, AppState};
use pks_mock::config::Config;
use pks_mock::kubectl::{ClusterTool, KubectlCli};
use pks_mock::server::{
    create_metrics, run_api_server, run_health_server, shutdown_channel, wait_for_termination,
    ReadinessState,
};
use pks_mock::template::{ManifestTemplates, CONTROL_PLANE_VERSION, KUBELET_VERSION};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the kubectl invoker described by `config`
fn build_tool(config: &Config) -> KubectlCli {
    let tool = KubectlCli::new(config.kubectl.clone());
    match &config.kubectl_context {
        Some(context) => tool.with_context(context),
        None => tool,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting PKS mock API");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        project = %config.gcp_project,
        listen = %config.listen_addr,
        tls = config.tls.is_some(),
        "Configuration loaded"
    );

    let templates = ManifestTemplates::load(&config.cluster_template, &config.master_template)
        .context("Failed to load manifest templates")?;
    info!(
        cluster = %config.cluster_template.display(),
        master = %config.master_template.display(),
        kubelet_version = KUBELET_VERSION,
        control_plane_version = CONTROL_PLANE_VERSION,
        "Manifest templates loaded"
    );

    let tool = build_tool(&config);
    info!(kubectl = tool.program(), context = ?config.kubectl_context, "kubectl configured");
    let tool: Arc<dyn ClusterTool> = Arc::new(tool);

    let metrics = create_metrics().context("Failed to create metrics registry")?;
    let readiness = ReadinessState::new();
    let (trigger, shutdown) = shutdown_channel();

    let health_readiness = readiness.clone();
    let health_metrics = metrics.clone();
    let health_shutdown = shutdown.clone();
    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) =
            run_health_server(health_port, health_readiness, health_metrics, health_shutdown).await
        {
            warn!(error = %e, "Health server failed");
        }
    });
    info!(port = health_port, "Health server task spawned");

    tokio::spawn(async move {
        wait_for_termination().await;
        trigger.trigger();
    });

    let state = AppState::new(config.gcp_project.clone(), templates, tool, metrics);
    let app = router(state);

    run_api_server(
        config.listen_addr,
        config.tls.as_ref(),
        app,
        readiness,
        shutdown,
    )
    .await
    .context("API server failed")?;

    info!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
