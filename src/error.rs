//! Error types used by the statekit runtime and effect bodies.
//!
//! This module defines three error enums:
//!
//! - [`EffectError`] - failures raised by individual effect branches
//!   (and by panicking transitions, which are folded into the same
//!   taxonomy).
//! - [`DispatchError`] - the aggregated outcome of one dispatch call's
//!   whole causal tree of effects.
//! - [`StoreError`] - errors raised by the store runtime itself.
//!
//! All types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by effect execution.
///
/// These represent failures of individual effect branches run during a
/// dispatch. Cancellation is modeled here too, but it is treated as a
/// graceful exit by the runtime and is never aggregated into a
/// [`DispatchError`].
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum EffectError {
    /// Effect body returned an error.
    #[error("effect failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Effect body (or a transition function) panicked.
    #[error("panicked: {info}")]
    Panic {
        /// Captured panic payload, if it was a string.
        info: String,
    },

    /// Effect was cancelled due to dispatch or store shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl EffectError {
    /// Builds an [`EffectError::Fail`] from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        EffectError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statekit::EffectError;
    ///
    /// let err = EffectError::fail("boom");
    /// assert_eq!(err.as_label(), "effect_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EffectError::Fail { .. } => "effect_failed",
            EffectError::Panic { .. } => "effect_panicked",
            EffectError::Canceled => "effect_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EffectError::Fail { error } => format!("error: {error}"),
            EffectError::Panic { info } => format!("panic: {info}"),
            EffectError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether this is a cancellation, which the runtime
    /// treats as a graceful exit rather than a failure.
    ///
    /// # Example
    /// ```
    /// use statekit::EffectError;
    ///
    /// assert!(EffectError::Canceled.is_cancellation());
    /// assert!(!EffectError::fail("boom").is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EffectError::Canceled)
    }
}

/// # Aggregated outcome of one dispatch call.
///
/// Every failure from the causal tree of effects triggered by one
/// external [`dispatch`](crate::Store::dispatch), including child
/// dispatches issued by effects, is collected into a single
/// `Aggregate`. No sibling failure is lost because another branch
/// failed first.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// One or more effect branches failed.
    #[error("dispatch failed with {} error(s); first: {}", .errors.len(), first_message(.errors))]
    Aggregate {
        /// Every error collected during the dispatch, in completion order.
        errors: Vec<EffectError>,
    },
}

fn first_message(errors: &[EffectError]) -> String {
    errors
        .first()
        .map(EffectError::as_message)
        .unwrap_or_else(|| "<empty>".to_string())
}

impl DispatchError {
    /// Returns the first collected error, which is what a caller
    /// without a structured handler would conventionally re-raise.
    pub fn first(&self) -> Option<&EffectError> {
        match self {
            DispatchError::Aggregate { errors } => errors.first(),
        }
    }

    /// Returns all collected errors.
    pub fn errors(&self) -> &[EffectError] {
        match self {
            DispatchError::Aggregate { errors } => errors,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Aggregate { .. } => "dispatch_failed",
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Errors produced by the store runtime.
///
/// These represent failures in the runtime itself, such as a shutdown
/// sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Shutdown grace period was exceeded; some background work was
    /// still in flight and had to be abandoned.
    #[error("shutdown timeout {grace:?} exceeded; {pending} task(s) still in flight")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of background tasks that did not settle in time.
        pending: usize,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::GraceExceeded { .. } => "store_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StoreError::GraceExceeded { grace, pending } => {
                format!("grace exceeded after {grace:?}; pending tasks={pending}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_keeps_every_entry() {
        let err = DispatchError::Aggregate {
            errors: vec![EffectError::fail("a"), EffectError::fail("b")],
        };
        assert_eq!(err.errors().len(), 2);
        assert!(matches!(err.first(), Some(EffectError::Fail { error }) if error == "a"));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(EffectError::Canceled.as_label(), "effect_canceled");
        assert_eq!(
            EffectError::Panic { info: "x".into() }.as_label(),
            "effect_panicked"
        );
        let grace = StoreError::GraceExceeded {
            grace: Duration::from_secs(5),
            pending: 2,
        };
        assert_eq!(grace.as_label(), "store_grace_exceeded");
        assert!(grace.as_message().contains("pending tasks=2"));
    }
}
