use std::future::Future;

use snafu::Snafu;
use tokio_util::sync::{CancellationToken, DropGuard};

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
#[snafu(display("Cancelled"))]
pub struct CancelledError;

pub type CancelledResult<T> = std::result::Result<T, CancelledError>;

/// Lifetime of a consumer of resolution results (a rendered view, a page load)
///
/// Once cancelled, nothing run through the scope yields a value anymore, even
/// if the underlying request completes afterwards. Scopes derived with
/// [`CancelScope::child`] are cancelled together with their parent.
#[derive(Debug, Clone, Default)]
pub struct CancelScope(CancellationToken);

impl CancelScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self(self.0.child_token())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Cancel the scope when the returned guard is dropped
    pub fn drop_guard(&self) -> DropGuard {
        self.0.clone().drop_guard()
    }

    pub fn check(&self) -> CancelledResult<()> {
        if self.is_cancelled() {
            return CancelledSnafu.fail();
        }
        Ok(())
    }

    /// Drive `fut` unless and until the scope gets cancelled
    pub async fn run<F>(&self, fut: F) -> CancelledResult<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.0.cancelled() => CancelledSnafu.fail(),
            out = fut => {
                self.check()?;
                Ok(out)
            }
        }
    }
}
