//! Ctrl+C / SIGTERM handling

use contracts::OpContext;
use tokio::task::JoinHandle;
use tracing::warn;

/// Cancel `ctx` when the process receives Ctrl+C or SIGTERM
///
/// Abort the returned handle once the operation is over.
pub fn cancel_on_signal(ctx: OpContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, cancelling operation");
        ctx.cancel();
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
