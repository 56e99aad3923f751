//! Graceful shutdown

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::SignalKind;
#[cfg(unix)]
use tokio::signal::unix::signal;

/// Wait for a shutdown signal
///
/// Resolves on Ctrl+C, or on SIGTERM where that exists. In-flight redirects
/// finish before the server goes down.
pub async fn handler() {
    let interrupt = async {
        ctrl_c().await.expect("Valid interrupt handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Valid terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("Interrupt received, shutting down"),
        () = terminate => tracing::info!("Terminate signal received, shutting down"),
    }
}
