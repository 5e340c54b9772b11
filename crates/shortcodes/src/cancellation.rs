//! Cancellation for evaluate calls.
//!
//! [`Cancellation`] wraps `tokio_util::sync::CancellationToken`. Clones share
//! state, so a caller keeps one clone and hands another to the engine.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: CancellationToken,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Request cancellation.
    ///
    /// The evaluator stops before the next handler runs, or abandons the
    /// handler currently awaited.
    pub fn cancel(&self) {
        self.inner.cancel()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }

    /// A token cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
        }
    }
}

impl From<CancellationToken> for Cancellation {
    fn from(token: CancellationToken) -> Self {
        Self { inner: token }
    }
}
