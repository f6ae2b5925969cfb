//! Two-stage shutdown: the first signal starts a graceful shutdown, the
//! second ends the process without waiting for it.

use std::future::Future;

use tokio::sync::oneshot;

/// Watch `next_signal` in a background task.
///
/// The returned receiver completes on the first signal and is meant for
/// `with_graceful_shutdown`. The watcher keeps running while the server
/// drains, and calls `force_exit` on the second signal.
pub fn graceful_then_forced<S, F, X>(mut next_signal: S, force_exit: X) -> oneshot::Receiver<()>
where
    S: FnMut() -> F + Send + 'static,
    F: Future<Output = ()> + Send,
    X: FnOnce() + Send + 'static,
{
    let (graceful_tx, graceful_rx) = oneshot::channel();
    tokio::spawn(async move {
        next_signal().await;
        tracing::info!("Shutting down, press Ctrl+C again to force");
        let _ = graceful_tx.send(());
        next_signal().await;
        force_exit();
    });
    graceful_rx
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
