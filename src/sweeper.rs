use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

/// Periodically drop stale per-client state until shutdown is signaled.
pub fn spawn(
    state: SharedState,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Cleanup task started, every {every:?}");

        loop {
            let closed = tokio::select! {
                _ = tokio::time::sleep(every) => false,
                changed = shutdown.changed() => changed.is_err(),
            };

            if closed || *shutdown.borrow() {
                break;
            }

            match state.cleanup() {
                Ok(report) => tracing::debug!(
                    "Cleanup removed {} sessions, {} profiles, {} stored keys",
                    report.sessions,
                    report.profiles,
                    report.store_keys
                ),
                Err(e) => tracing::warn!("Cleanup failed: {e}"),
            }
        }

        tracing::debug!("Cleanup task stopped");
    })
}
