use anyhow::Context;
use deployment::Deployment;
use server::{DeploymentImpl, serve};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,server=debug,services=debug"));
    fmt().with_env_filter(filter).init();

    info!("Initializing deployment...");
    let deployment = DeploymentImpl::new()
        .await
        .context("failed to initialize deployment")?;

    let address = deployment.config().bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    serve(listener, deployment).await?;
    Ok(())
}
