//! Cooperative cancellation token.
//!
//! Cancellation is cooperative only: a wrapper racing on a token stops
//! *waiting* when it fires, but the underlying operation is only stopped if
//! it observes the same token (or is dropped by losing the race).

use std::sync::Arc;

use tokio::sync::watch;

/// Clonable cancellation handle shared between a caller and any number of
/// wrapped operations.
///
/// # Examples
///
/// ```
/// use faultline::async_ext::CancelToken;
///
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender: Arc::new(sender) }
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves when the token is cancelled; immediately if it already is.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        if *receiver.borrow() {
            return;
        }
        while receiver.changed().await.is_ok() {
            if *receiver.borrow() {
                return;
            }
        }
        // Sender side gone without cancelling; never resolves.
        std::future::pending::<()>().await
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
