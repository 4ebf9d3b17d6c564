//! # Builder wiring a store together.
//!
//! Store construction is the only place the dispatch engine, the
//! bootstrap tasks, and the state cell meet; [`StoreBuilder`] is that
//! place.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::{ActionEmitter, Bootstrap, FetchContext};
use crate::core::dispatcher::Engine;
use crate::core::{Store, StoreConfig};
use crate::hooks::ErrorHook;
use crate::reduce::{Effect, Reduce};

/// Builder for constructing a [`Store`] with optional features.
pub struct StoreBuilder<A, S> {
    initial: S,
    reduce: Reduce<A, S>,
    bootstrap: Bootstrap<A>,
    cfg: StoreConfig,
    error_handler: Option<Arc<dyn ErrorHook>>,
    parent_token: Option<CancellationToken>,
}

impl<A, S> StoreBuilder<A, S>
where
    A: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(initial: S) -> Self {
        Self {
            initial,
            reduce: Reduce::empty(),
            bootstrap: Bootstrap::empty(),
            cfg: StoreConfig::default(),
            error_handler: None,
            parent_token: None,
        }
    }

    /// Sets the reduce algebra (transition + effect trees).
    pub fn with_reduce(mut self, reduce: Reduce<A, S>) -> Self {
        self.reduce = reduce;
        self
    }

    /// Sets the bootstrap tree; its sources are started by `build()`.
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap<A>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: StoreConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the execution context for this store's background tasks.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.cfg.runtime = Some(handle);
        self
    }

    /// Installs a structured error handler.
    ///
    /// When present, it consumes every dispatch's aggregated failures
    /// and the dispatch handles resolve `Ok`; the hook registry is
    /// notified regardless.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHook>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Appends a cross-cutting effect to the store's effect tree
    /// (e.g. request logging). May be called repeatedly.
    pub fn with_default_effect(mut self, effect: Effect<A, S>) -> Self {
        self.reduce = self.reduce.compose(&Reduce::from_effect(effect));
        self
    }

    /// Parents the store's cancellation token to `token`, so the
    /// owner's shutdown tears the store down with it.
    pub fn with_parent_token(mut self, token: CancellationToken) -> Self {
        self.parent_token = Some(token);
        self
    }

    /// Builds the store and starts its bootstrap sources.
    ///
    /// Must run inside a Tokio runtime unless a runtime handle was
    /// configured.
    pub fn build(self) -> Store<A, S> {
        let token = match &self.parent_token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let hooks = self.cfg.resolve_hooks();
        let runtime = self
            .cfg
            .runtime
            .clone()
            .or_else(|| hooks.default_runtime());

        let engine = Arc::new(Engine::new(
            self.initial,
            self.reduce,
            Arc::clone(&hooks),
            self.error_handler,
            runtime.clone(),
            token.clone(),
            self.cfg.warm_stacks,
            self.cfg.stack_depth,
        ));

        let emitter = {
            let engine = Arc::clone(&engine);
            ActionEmitter::new(move |action| engine.dispatch_root(action))
        };
        let fetch_ctx = FetchContext {
            emitter,
            subscribers: engine.cell.subscriber_count(),
            token: token.clone(),
            runtime,
            tracker: engine.tasks.clone(),
            hooks,
        };
        let sources = self.bootstrap.fetch(&fetch_ctx);

        Store::assemble(engine, sources, token)
    }
}
