use axum::Router;
use tokio::{net::TcpListener, signal};
use tracing::info;

pub mod error;
pub mod routes;

pub type DeploymentImpl = local_deployment::LocalDeployment;

/// Full application router for `deployment`
pub fn app(deployment: DeploymentImpl) -> Router {
    routes::router(deployment)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, deployment: DeploymentImpl) -> std::io::Result<()> {
    let address = listener.local_addr()?;
    info!("Server running on http://{address}");

    axum::serve(listener, app(deployment))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
