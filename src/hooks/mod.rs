//! # Error hooks: the runtime's observability side-channel.
//!
//! Every error collected during a dispatch (and every bootstrap
//! source failure) is reported to a [`HookRegistry`], independent of
//! whether the dispatch also had a local structured handler. Hooks are
//! observability, not recovery: they cannot alter the dispatch
//! outcome.
//!
//! ## Architecture
//! ```text
//! dispatch finalize ──► HookRegistry::emit(&EffectError)
//! source failure    ──►        │
//!                              ├──► hook 1 (metrics)
//!                              ├──► hook 2 (audit)
//!                              └──► hook N (LogHook, feature "logging")
//! ```
//!
//! ## Global vs injected
//! Stores default to the process-wide registry behind [`global()`];
//! tests and embedders that want isolation inject their own registry
//! via [`StoreConfig`](crate::StoreConfig). The global registry is
//! mutable process state: tests that mutate it **must** call
//! [`HookRegistry::reset`] on teardown to avoid cross-test leakage.

mod hook;
#[cfg(feature = "logging")]
mod log;
mod registry;

pub use hook::ErrorHook;
#[cfg(feature = "logging")]
pub use log::LogHook;
pub use registry::{global, HookRegistry};
