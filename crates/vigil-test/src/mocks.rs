//! Mock revocation checkers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vigil_auth::{ClientCertificate, RevocationChecker, RevocationError, RevocationStatus};

/// Answers `Good` after a delay. Pair with a paused Tokio clock to exercise
/// revocation timeouts.
#[derive(Debug, Clone, Copy)]
pub struct SlowRevocation {
    delay: Duration,
}

impl SlowRevocation {
    /// Answer after `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RevocationChecker for SlowRevocation {
    async fn check(&self, _: &ClientCertificate) -> Result<RevocationStatus, RevocationError> {
        tokio::time::sleep(self.delay).await;
        Ok(RevocationStatus::Good)
    }
}

/// Always fails, as an unreachable revocation responder would.
#[derive(Debug, Clone)]
pub struct FailingRevocation {
    message: String,
}

impl FailingRevocation {
    /// Fail with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingRevocation {
    fn default() -> Self {
        Self::new("revocation responder unreachable")
    }
}

#[async_trait]
impl RevocationChecker for FailingRevocation {
    async fn check(&self, _: &ClientCertificate) -> Result<RevocationStatus, RevocationError> {
        Err(RevocationError(self.message.clone()))
    }
}

/// Answers `Good` and counts how often it was asked.
#[derive(Debug, Default)]
pub struct CountingRevocation {
    calls: AtomicUsize,
}

impl CountingRevocation {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checks so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevocationChecker for CountingRevocation {
    async fn check(&self, _: &ClientCertificate) -> Result<RevocationStatus, RevocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RevocationStatus::Good)
    }
}
