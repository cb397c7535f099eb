// Caller-owned action handles
//
// Each UI action runs as one tokio task. The caller keeps the handle and may
// cancel it; cancellation is cooperative and takes effect at the action's
// next suspension point.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a spawned action
pub struct ActionHandle<T> {
    cancel: CancellationToken,
    join: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> ActionHandle<T> {
    /// Spawn `action` on the current runtime
    pub fn spawn<F>(action: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Action cancelled");
                    None
                }
                output = action => Some(output),
            }
        });

        Self { cancel, join }
    }

    /// Request cancellation; the result of a cancelled action is discarded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// A token that cancels this action, for wiring to signals
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the action; `None` if it was cancelled or panicked
    pub async fn join(self) -> Option<T> {
        match self.join.await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Action task failed: {}", e);
                None
            }
        }
    }
}
