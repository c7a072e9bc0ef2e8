//! Request-scoped cancellation.
//!
//! One [`CancelToken`] travels with a search request. It fires when
//! [`CancelToken::cancel`] is called on any clone, or when its deadline
//! passes, whichever comes first.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that only fires on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            deadline: None,
        }
    }

    /// A token that also fires `timeout` from now.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::new()
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let signalled = async move {
            // the sender lives as long as any clone of this token
            let _ = rx.wait_for(|c| *c).await;
        };
        match self.deadline {
            Some(d) => {
                tokio::select! {
                    _ = signalled => {}
                    _ = sleep_until(d) => {}
                }
            }
            None => signalled.await,
        }
    }

    /// Run `fut` unless the token fires first.
    ///
    /// Returns `None` when cancelled; the future is dropped.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            out = fut => Some(out),
            _ = self.cancelled() => None,
        }
    }
}
