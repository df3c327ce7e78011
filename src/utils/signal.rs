//! Process termination signals.

/// Resolve on the first SIGTERM or SIGINT.
///
/// Registration can fail in restricted environments; whichever handler is
/// available is used, with `ctrl_c` as the last resort.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => log::info!("Received SIGTERM"),
                _ = sigint.recv() => log::info!("Received SIGINT (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            log::warn!("Could not register SIGTERM handler, waiting for SIGINT only: {e}");
            sigint.recv().await;
            log::info!("Received SIGINT (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            log::warn!("Could not register SIGINT handler, waiting for SIGTERM only: {e}");
            sigterm.recv().await;
            log::info!("Received SIGTERM");
        }
        (Err(e), Err(_)) => {
            log::error!("Could not register signal handlers, using ctrl_c fallback: {e}");
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl+C: {e}");
            }
        }
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Received Ctrl+C"),
        Err(e) => log::error!("Failed to listen for Ctrl+C: {e}"),
    }
}
