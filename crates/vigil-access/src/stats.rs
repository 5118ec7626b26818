//! Evaluator counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters kept by the evaluator.
#[derive(Debug, Default)]
pub struct EvaluatorStats {
    decisions: AtomicU64,
    allowed: AtomicU64,
    denied: AtomicU64,
    auth_failures: AtomicU64,
    rejected: AtomicU64,
}

/// A point-in-time copy of [`EvaluatorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests that reached the resolver.
    pub decisions: u64,
    /// Decisions that allowed.
    pub allowed: u64,
    /// Decisions that denied.
    pub denied: u64,
    /// Requests whose credential failed to bind.
    pub auth_failures: u64,
    /// Requests rejected before binding (bad operation or path).
    pub rejected: u64,
}

impl EvaluatorStats {
    pub(crate) fn record_decision(&self, allowed: bool) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = EvaluatorStats::default();
        stats.record_decision(true);
        stats.record_decision(false);
        stats.record_decision(false);
        stats.record_auth_failure();
        stats.record_rejected();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                decisions: 3,
                allowed: 1,
                denied: 2,
                auth_failures: 1,
                rejected: 1,
            }
        );
    }
}
