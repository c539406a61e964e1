use tokio_util::sync::CancellationToken;

/// Cancels `token` on the first SIGINT or SIGTERM.
///
/// Everything that holds a child of the token observes the cancellation,
/// in-flight requests included.
pub fn shutdown_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => return,
            signal = wait() => {
                info!(message = "signal received", signal);
            }
        }

        token.cancel();
    });
}

#[cfg(unix)]
async fn wait() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!(message = "failed to set up SIGTERM handler", %err);

            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(message = "failed to listen for ctrl-c", %err);

        // never resolve, the token can still be cancelled by its owner
        std::future::pending::<()>().await;
    }

    "SIGINT"
}
