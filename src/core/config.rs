//! # Store configuration.
//!
//! Provides [`StoreConfig`] centralized settings for one store.
//!
//! Config is used in one place:
//! [`StoreBuilder::with_config`](crate::StoreBuilder::with_config)
//! (`Store::builder(..).with_config(cfg).build()`).
//!
//! ## Sentinel values
//! - `runtime = None` → fall back to the hook registry's default
//!   runtime, then to the ambient Tokio context
//! - `hooks = None` → use the process-global registry
//!   ([`hooks::global()`](crate::hooks::global))

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::hooks::{self, HookRegistry};

/// Configuration for one store.
///
/// Defines:
/// - **Execution context**: where dispatch drivers, suspend effects,
///   and bootstrap source tasks are spawned
/// - **Traversal pools**: how many stacks to pre-allocate and how deep
/// - **Observability**: which hook registry receives errors
///
/// ## Field semantics
/// - `runtime`: explicit Tokio handle (`None` = registry default, then
///   ambient context; dispatching outside any runtime panics)
/// - `warm_stacks`: traversal stacks pre-allocated per pool at store
///   construction, so the first dispatch does not allocate
/// - `stack_depth`: initial capacity of each pre-allocated stack;
///   size it to the deepest expected composition
/// - `hooks`: injected registry (`None` = process-global)
#[derive(Clone)]
pub struct StoreConfig {
    /// Execution context override for this store's background tasks.
    pub runtime: Option<Handle>,

    /// Traversal stacks pre-allocated per pool at construction.
    pub warm_stacks: usize,

    /// Initial capacity of each pre-allocated traversal stack.
    pub stack_depth: usize,

    /// Hook registry receiving this store's errors.
    pub hooks: Option<Arc<HookRegistry>>,
}

impl Default for StoreConfig {
    /// Default configuration:
    ///
    /// - `runtime = None` (registry default, then ambient context)
    /// - `warm_stacks = 4` (covers typical dispatch concurrency)
    /// - `stack_depth = 16` (deeper compositions just re-allocate)
    /// - `hooks = None` (process-global registry)
    fn default() -> Self {
        Self {
            runtime: None,
            warm_stacks: 4,
            stack_depth: 16,
            hooks: None,
        }
    }
}

impl StoreConfig {

    /// Resolves the hook registry this store reports to.
    #[inline]
    pub(crate) fn resolve_hooks(&self) -> Arc<HookRegistry> {
        self.hooks.clone().unwrap_or_else(hooks::global)
    }
}
