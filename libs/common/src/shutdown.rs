//! Shutdown signal for the HTTP server

use tracing::warn;

/// Resolve on Ctrl+C, or on SIGTERM where available
///
/// Returns the signal name for the shutdown log line.
pub async fn wait_for_shutdown() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate() => "SIGTERM",
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        },
        Err(e) => {
            warn!("SIGTERM handler unavailable, only Ctrl+C stops the service: {}", e);
            std::future::pending::<()>().await
        },
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await
}
