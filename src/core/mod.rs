//! Runtime core: the dispatch engine and the store facade.
//!
//! This module contains the embedded implementation of the statekit
//! runtime. The public API from this module is the [`Store`] (with its
//! [`StoreBuilder`] and [`StoreConfig`]), the per-dispatch
//! [`DispatchHandle`], the [`StateHandle`] read side, and the
//! [`EffectContext`] capability handed to effect bodies.
//!
//! Internal modules:
//! - [`cell`]: state value + subscriber count behind `watch` channels;
//! - [`collector`]: per-dispatch error aggregation;
//! - [`dispatcher`]: atomic transition, pooled effect walk, finalize;
//! - [`handle`]: settle/cancel handle for one dispatch;
//! - [`store`]: facade owning engine, sources, and the token;
//! - [`builder`], [`config`]: construction-time wiring.

mod builder;
mod cell;
mod collector;
mod config;
mod dispatcher;
mod handle;
mod store;

pub use builder::StoreBuilder;
pub use cell::StateHandle;
pub use config::StoreConfig;
pub use dispatcher::EffectContext;
pub use handle::DispatchHandle;
pub use store::Store;
