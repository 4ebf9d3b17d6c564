//! # Store facade: state stream in, actions out.
//!
//! The [`Store`] is the public object the embedding layer talks to. It
//! owns the dispatch engine, the strong handles to every
//! bootstrap-spawned task, and the cancellation token scoping all
//! background work.
//!
//! ## High-level architecture
//! ```text
//! Inputs to build():
//!   initial state + Reduce + Bootstrap ──► StoreBuilder::build()
//!
//! Wiring:
//!   - Engine: state cell, reduce trees, traversal pools, hooks
//!   - Bootstrap::fetch(): one SourceActor task per leaf source
//!     (handles retained by the Store for its whole lifetime)
//!
//! Runtime flow:
//!   caller ──dispatch(a)──► Engine ──► transition (atomic)
//!   sources ─────┘                 └─► effect tree (tracked tasks)
//!                                        └─ child dispatches (same scope)
//!   UI/domain ◄──state()── StateHandle (counted subscriber)
//!
//! Shutdown path:
//!   close(): cancel token → sources + in-flight effects stop
//!   shutdown(grace): close + bounded wait on the store tracker
//!       ├─ all settled within grace → Ok
//!       └─ timeout → StoreError::GraceExceeded { pending }
//! ```
//!
//! ## Rules
//! - Dropping the store cancels its token; background tasks stop at
//!   their next await point. Use [`Store::shutdown`] to wait for them.
//! - Two independent `dispatch` calls race freely; causally related
//!   dispatches (an effect dispatching a child) are ordered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::Bootstrap;
use crate::core::dispatcher::Engine;
use crate::core::{DispatchHandle, StateHandle, StoreBuilder};
use crate::error::StoreError;
use crate::reduce::Reduce;

/// A running state container.
///
/// ## Example
/// ```no_run
/// use statekit::{Bootstrap, Reduce, Store, Transition};
///
/// #[derive(Clone)]
/// enum Action { Inc }
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = Store::new(
///         0u64,
///         Reduce::from_transition(Transition::new(|_: &Action, s: u64| s + 1)),
///         Bootstrap::empty(),
///     );
///
///     let done = store.dispatch(Action::Inc);
///     done.settled().await.expect("dispatch failed");
///     assert_eq!(store.snapshot(), 1);
/// }
/// ```
pub struct Store<A, S> {
    engine: Arc<Engine<A, S>>,
    sources: Vec<JoinHandle<()>>,
    token: CancellationToken,
}

impl<A, S> Store<A, S>
where
    A: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    /// Starts building a store from its initial state.
    pub fn builder(initial: S) -> StoreBuilder<A, S> {
        StoreBuilder::new(initial)
    }

    /// Creates a store with default configuration.
    ///
    /// Must run inside a Tokio runtime unless a runtime handle is
    /// configured via [`Store::builder`].
    pub fn new(initial: S, reduce: Reduce<A, S>, bootstrap: Bootstrap<A>) -> Self {
        Self::builder(initial)
            .with_reduce(reduce)
            .with_bootstrap(bootstrap)
            .build()
    }

    pub(crate) fn assemble(
        engine: Arc<Engine<A, S>>,
        sources: Vec<JoinHandle<()>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            engine,
            sources,
            token,
        }
    }

    /// Subscribes to the state stream.
    ///
    /// Every live handle counts toward the subscriber count that
    /// gates `Lazy`/`WhileSubscribed` bootstrap sources.
    pub fn state(&self) -> StateHandle<S> {
        self.engine.cell.subscribe()
    }

    /// Clones the current state without subscribing.
    pub fn snapshot(&self) -> S {
        self.engine.cell.snapshot()
    }

    /// Observes the live subscriber count of the state stream.
    pub fn subscriber_count(&self) -> watch::Receiver<usize> {
        self.engine.cell.subscriber_count()
    }

    /// Dispatches one action.
    ///
    /// The transition has committed by the time this returns; the
    /// handle settles when the action's whole causal tree of effects
    /// has finished.
    pub fn dispatch(&self, action: A) -> DispatchHandle {
        self.engine.dispatch_root(action)
    }

    /// Cancels every background task owned by this store: bootstrap
    /// sources and in-flight effect work.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Closes the store and waits up to `grace` for background tasks
    /// to settle.
    pub async fn shutdown(self, grace: Duration) -> Result<(), StoreError> {
        self.token.cancel();
        self.engine.tasks.close();
        match tokio::time::timeout(grace, self.engine.tasks.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::GraceExceeded {
                grace,
                pending: self.engine.tasks.len(),
            }),
        }
    }

    /// Token scoping this store's background work; child of the
    /// parent token when one was configured.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of bootstrap source tasks this store retains.
    pub fn source_tasks(&self) -> usize {
        self.sources.len()
    }
}

impl<A, S> Drop for Store<A, S> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
