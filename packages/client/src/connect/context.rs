//! Cancellation and deadline scope for a dial attempt

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carries an optional deadline and a cancellation token into every stage
/// of a dial: name resolution, connect, and any proxy handshake.
#[derive(Clone, Debug, Default)]
pub struct DialContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl DialContext {
    /// A context that never expires and is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Bound the dial by `timeout` from now, keeping any earlier deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Abort the dial when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancelled, or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drive `fut` to completion unless the context is cancelled
    /// (`ErrorKind::Interrupted`) or its deadline passes
    /// (`ErrorKind::TimedOut`) first. The future is dropped on abort.
    pub async fn run<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(canceled());
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(timed_out());
        }

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(canceled()),
            () = expiry => Err(timed_out()),
            result = fut => result,
        }
    }
}

fn canceled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "operation was canceled")
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "i/o timeout")
}
