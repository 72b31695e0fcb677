use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Resolve once the process is asked to stop
#[cfg(unix)]
pub async fn wait_for_signal() {
    // SIGTERM is what container runtimes send on stop
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!("Failed to create SIGTERM signal handler: {}", e);
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
}

/// Resolve once the process is asked to stop
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C signal, initiating graceful shutdown"),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
