//! # Side-effect tree.
//!
//! An [`Effect`] describes what side effects a dispatched action
//! triggers, as a value the dispatcher walks after the transition has
//! committed. Effect bodies receive the action, the **pre-transition**
//! state the action observed, and an [`EffectContext`] capability for
//! dispatching further actions into the same causal scope.
//!
//! ## Node kinds
//! - **Node**: synchronous body, run inline during the walk.
//! - **Suspend**: asynchronous body, spawned as a concurrent child
//!   task of the dispatch; its future owns clones of the action and
//!   state.
//! - **Composite**: sibling effects that all start within the same
//!   dispatch; suspend siblings run in parallel, no mutual ordering.
//! - **Filtered**: same action/state gating as
//!   [`Transition`](crate::Transition).
//!
//! ## Rules
//! - A failing or panicking sibling never prevents the other siblings
//!   from running; every failure is collected per dispatch.
//! - Returning [`EffectError::Canceled`] is a graceful exit, not a
//!   failure.
//! - Bodies that loop should poll `ctx.is_cancelled()` (or race
//!   against `ctx.cancelled()`) to honor dispatch cancellation.
//!
//! ## Example
//! ```
//! use statekit::{Effect, EffectContext, EffectError};
//!
//! #[derive(Clone)]
//! enum Action { Saved, Save(String) }
//!
//! let log: Effect<Action, u64> = Effect::new(|_a, state, _ctx| {
//!     let _ = state;
//!     Ok(())
//! });
//! let persist: Effect<Action, u64> = Effect::filtered(
//!     |a: &Action| matches!(a, Action::Save(_)),
//!     Effect::suspend(|_a, _state, ctx: EffectContext<Action>| async move {
//!         // ...await some I/O, then report back into the store:
//!         ctx.dispatch(Action::Saved);
//!         Ok::<(), EffectError>(())
//!     }),
//! );
//! let combined = log.merge(&persist);
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::core::EffectContext;
use crate::error::EffectError;
use crate::reduce::{ActionPredicate, StatePredicate};

/// Synchronous effect body, run inline during the walk.
type SyncEffectFn<A, S> =
    Arc<dyn Fn(&A, &S, &EffectContext<A>) -> Result<(), EffectError> + Send + Sync>;

/// Asynchronous effect body; called once per dispatch to produce the
/// future that runs as a child task.
type SuspendEffectFn<A, S> =
    Arc<dyn Fn(A, S, EffectContext<A>) -> BoxFuture<'static, Result<(), EffectError>> + Send + Sync>;

/// Immutable, cheaply cloneable side-effect tree.
pub struct Effect<A, S> {
    node: Arc<EffectNode<A, S>>,
}

pub(crate) enum EffectNode<A, S> {
    Node(SyncEffectFn<A, S>),
    Suspend(SuspendEffectFn<A, S>),
    Composite(Vec<Effect<A, S>>),
    Filtered {
        action: Option<ActionPredicate<A>>,
        state: Option<StatePredicate<S>>,
        inner: Effect<A, S>,
    },
}

impl<A, S> Clone for Effect<A, S> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<A, S> fmt::Debug for Effect<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            EffectNode::Node(_) => f.write_str("Effect::Node"),
            EffectNode::Suspend(_) => f.write_str("Effect::Suspend"),
            EffectNode::Composite(cs) => write!(f, "Effect::Composite(len={})", cs.len()),
            EffectNode::Filtered { .. } => f.write_str("Effect::Filtered"),
        }
    }
}

impl<A, S> Effect<A, S> {
    fn from_node(node: EffectNode<A, S>) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Creates a synchronous effect node.
    ///
    /// The body runs inline while the dispatcher walks the tree; keep
    /// it short and non-blocking. Use [`Effect::suspend`] for anything
    /// that awaits.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A, &S, &EffectContext<A>) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        Self::from_node(EffectNode::Node(Arc::new(f)))
    }

    /// Creates an asynchronous effect node.
    ///
    /// `f` is called once per matching dispatch and must return a
    /// fresh future; the future owns its action/state clones and runs
    /// as a concurrent child task of the dispatch.
    pub fn suspend<F, Fut>(f: F) -> Self
    where
        F: Fn(A, S, EffectContext<A>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), EffectError>> + Send + 'static,
    {
        Self::from_node(EffectNode::Suspend(Arc::new(move |a, s, ctx| {
            f(a, s, ctx).boxed()
        })))
    }

    /// Gates `inner` behind an action predicate (exact variant match).
    pub fn filtered<P>(pred: P, inner: Effect<A, S>) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::from_node(EffectNode::Filtered {
            action: Some(Arc::new(pred)),
            state: None,
            inner,
        })
    }

    /// Gates `inner` behind a predicate over the pre-transition state.
    pub fn filtered_state<P>(pred: P, inner: Effect<A, S>) -> Self
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::from_node(EffectNode::Filtered {
            action: None,
            state: Some(Arc::new(pred)),
            inner,
        })
    }

    /// Merges two effects into a parallel composite.
    ///
    /// Both sides start within the same dispatch; there is no ordering
    /// between them. Top-level composites are flattened, so `merge` is
    /// associative.
    pub fn merge(&self, other: &Effect<A, S>) -> Self {
        let mut children = match self.node.as_ref() {
            EffectNode::Composite(cs) => cs.clone(),
            _ => vec![self.clone()],
        };
        match other.node.as_ref() {
            EffectNode::Composite(cs) => children.extend(cs.iter().cloned()),
            _ => children.push(other.clone()),
        }
        Self::from_node(EffectNode::Composite(children))
    }

    pub(crate) fn node(&self) -> &EffectNode<A, S> {
        self.node.as_ref()
    }

    pub(crate) fn gate_matches(
        action_pred: &Option<ActionPredicate<A>>,
        state_pred: &Option<StatePredicate<S>>,
        action: &A,
        state: &S,
    ) -> bool {
        action_pred.as_ref().map_or(true, |p| p(action))
            && state_pred.as_ref().map_or(true, |p| p(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    enum Action {
        Ping,
    }

    #[test]
    fn merge_flattens_composites() {
        let a: Effect<Action, ()> = Effect::new(|_, _, _| Ok(()));
        let b: Effect<Action, ()> = Effect::new(|_, _, _| Ok(()));
        let c: Effect<Action, ()> = Effect::new(|_, _, _| Ok(()));
        let merged = a.merge(&b).merge(&c);
        match merged.node() {
            EffectNode::Composite(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected composite, got {merged:?}"),
        }
        let _ = Action::Ping;
    }
}
