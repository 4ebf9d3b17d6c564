//! # Per-dispatch error collector.
//!
//! One [`ErrorCollector`] is created per top-level dispatch and shared
//! by every effect branch in that dispatch's causal tree, including
//! branches scheduled by child dispatches. A failing branch never
//! cancels its siblings; it only adds an entry here.
//!
//! ## Rules
//! - Entries are kept in completion order.
//! - Cancellation is a graceful exit: [`EffectError::Canceled`] is
//!   dropped at the door and never aggregated.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::EffectError;

/// Shared aggregation sink for one dispatch's causal tree.
#[derive(Clone, Default)]
pub(crate) struct ErrorCollector {
    inner: Arc<Mutex<Vec<EffectError>>>,
}

impl ErrorCollector {
    /// Records a failure. Cancellations are ignored.
    pub(crate) fn push(&self, err: EffectError) {
        if err.is_cancellation() {
            return;
        }
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(err);
    }

    /// Takes every collected error, leaving the collector empty.
    pub(crate) fn drain(&self) -> Vec<EffectError> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_failure() {
        let collector = ErrorCollector::default();
        collector.push(EffectError::fail("a"));
        collector.push(EffectError::fail("b"));
        let drained = collector.drain();
        assert_eq!(drained.len(), 2);
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn cancellation_is_not_collected() {
        let collector = ErrorCollector::default();
        collector.push(EffectError::Canceled);
        assert!(collector.drain().is_empty());
    }
}
