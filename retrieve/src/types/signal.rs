//! Cancellation signals for in-flight requests.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::AbortError;

/// Fires when its controller aborts or its deadline passes.
///
/// Clones observe the same cancellation.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    token: CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl AbortSignal {
    /// A signal that fires once `duration` has elapsed.
    ///
    /// A duration too large to be represented as a deadline never fires.
    pub fn timeout(duration: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now()
                .checked_add(duration)
                .map(|deadline| (deadline, duration)),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|(deadline, _)| Instant::now() >= deadline)
    }

    /// Resolves with the abort reason once the signal fires.
    pub async fn aborted(&self) -> AbortError {
        match self.deadline {
            Some((deadline, duration)) => tokio::select! {
                _ = self.token.cancelled() => AbortError::Aborted,
                _ = sleep_until(deadline) => AbortError::Timeout(duration),
            },
            None => {
                self.token.cancelled().await;
                AbortError::Aborted
            }
        }
    }
}

/// Owner side of an [`AbortSignal`].
#[derive(Clone, Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    pub fn abort(&self) {
        self.signal.token.cancel();
    }
}
