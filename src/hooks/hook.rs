//! # Error hook trait.
//!
//! [`ErrorHook`] is the extension point for plugging error observers
//! into the runtime: metrics counters, audit logs, crash reporters.
//!
//! ## Rules
//! - Hooks run inline on the dispatch finalize path; keep them cheap
//!   and non-blocking. Ship heavy work to your own channel/task.
//! - Hooks must not panic; a panicking hook is isolated but its report
//!   is lost.
//! - Hooks observe; they cannot change the dispatch outcome.

use crate::error::EffectError;

/// Observer for errors surfaced by the runtime.
///
/// ## Example
/// ```
/// use statekit::{EffectError, ErrorHook};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ErrorHook for Counter {
///     fn on_error(&self, _err: &EffectError) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn name(&self) -> &'static str { "counter" }
/// }
/// ```
pub trait ErrorHook: Send + Sync + 'static {
    /// Observes one error. Called once per collected error, in
    /// collection order.
    fn on_error(&self, err: &EffectError);

    /// Returns the hook name used in diagnostics.
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit").
    /// The default uses `type_name::<Self>()`, which can be verbose -
    /// override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
