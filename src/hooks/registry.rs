//! # Hook registry and process-wide defaults.
//!
//! [`HookRegistry`] holds the list of installed [`ErrorHook`]s plus
//! runtime-wide defaults (the execution context applied to stores that
//! do not specify one). The list is append-only: individual hooks are
//! never removed, only bulk-[`reset`](HookRegistry::reset), intended
//! for test teardown.
//!
//! ## Rules
//! - `emit` fans one error out to every installed hook, in
//!   installation order; a panicking hook is isolated from the rest.
//! - `reset` clears hooks **and** defaults; tests that touch
//!   [`global()`] must call it on teardown.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};

use tokio::runtime::Handle;

use crate::error::EffectError;
use crate::hooks::ErrorHook;

/// Append-only list of error hooks plus runtime defaults.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn ErrorHook>>>,
    default_runtime: RwLock<Option<Handle>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook. Hooks cannot be removed individually.
    pub fn add(&self, hook: Arc<dyn ErrorHook>) {
        self.hooks
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(hook);
    }

    /// Number of installed hooks.
    pub fn len(&self) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// True when no hooks are installed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets the default execution context for stores that do not
    /// configure one explicitly.
    pub fn set_default_runtime(&self, handle: Handle) {
        *self
            .default_runtime
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(handle);
    }

    /// Returns the default execution context, if one was set.
    pub fn default_runtime(&self) -> Option<Handle> {
        self.default_runtime
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Reports one error to every installed hook.
    ///
    /// A panicking hook does not prevent later hooks from observing
    /// the error.
    pub fn emit(&self, err: &EffectError) {
        let hooks = {
            self.hooks
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        };
        for hook in hooks {
            let _ = catch_unwind(AssertUnwindSafe(|| hook.on_error(err)));
        }
    }

    /// Bulk-clears hooks and defaults.
    ///
    /// Tests that mutate the [`global()`] registry must call this on
    /// teardown; leaked hooks observe errors from unrelated tests.
    pub fn reset(&self) {
        self.hooks
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        *self
            .default_runtime
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// Returns the process-wide registry.
///
/// Stores fall back to this instance unless a registry is injected
/// through [`StoreConfig`](crate::StoreConfig).
pub fn global() -> Arc<HookRegistry> {
    static GLOBAL: OnceLock<Arc<HookRegistry>> = OnceLock::new();
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(HookRegistry::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ErrorHook for Counting {
        fn on_error(&self, _err: &EffectError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Panicking;

    impl ErrorHook for Panicking {
        fn on_error(&self, _err: &EffectError) {
            panic!("hook blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn emit_reaches_every_hook_in_order() {
        let registry = HookRegistry::new();
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        registry.add(first.clone());
        registry.add(second.clone());

        registry.emit(&EffectError::fail("boom"));
        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_hook_is_isolated() {
        let registry = HookRegistry::new();
        let counter = Arc::new(Counting::default());
        registry.add(Arc::new(Panicking));
        registry.add(counter.clone());

        registry.emit(&EffectError::fail("boom"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_clears_hooks_and_defaults() {
        let registry = HookRegistry::new();
        registry.add(Arc::new(Counting::default()));
        assert_eq!(registry.len(), 1);
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.default_runtime().is_none());
    }
}
