//! kube-query API - answers plain-English questions about a Kubernetes
//! cluster running Harbor.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use kq_api::config::ApiConfig;
use kq_api::routes::build_router;
use kq_api::state::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kq-api starting");

    let config = ApiConfig::load().context("invalid configuration")?;

    // Cluster first: a server that cannot read the cluster must not start.
    let reader = state::build_cluster_reader(&config.cluster).await?;
    let classifier = state::build_classifier(&config.classifier).await?;

    let app = build_router(AppState::from_parts(classifier, reader, &config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
