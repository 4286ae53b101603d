use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use psgen_logging::psgen_trace;
use tokio_util::sync::CancellationToken;

/// Single-slot cancellable timer for the progress loop.
///
/// At most one scheduled query exists at a time: scheduling replaces (and
/// cancels) the previous one. A cancelled query never delivers its result,
/// whether it was still waiting on the timer or already in flight.
#[derive(Default)]
pub struct PollTimer {
    pending: Mutex<Option<CancellationToken>>,
}

impl PollTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `query` after `delay` and hands its output to `deliver`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<Q, T, D>(&self, delay: Duration, query: Q, deliver: D)
    where
        Q: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        D: FnOnce(T) + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.slot().replace(token.clone()) {
            previous.cancel();
        }

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    psgen_trace!("poll cancelled before timer fired");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let output = tokio::select! {
                _ = token.cancelled() => {
                    psgen_trace!("poll cancelled while query in flight");
                    return;
                }
                output = query => output,
            };

            if !token.is_cancelled() {
                deliver(output);
                // Spent tokens read as cancelled so `cancel` only reports live queries.
                token.cancel();
            }
        });
    }

    /// Cancels the pending query. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                let was_live = !token.is_cancelled();
                token.cancel();
                was_live
            }
            None => false,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
