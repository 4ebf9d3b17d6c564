//! # Dispatch engine: atomic transitions, tracked effect fan-out.
//!
//! The [`Engine`] is the shared heart of a store: it owns the state
//! cell, the reduce tree, the traversal-stack pools, and the hook
//! registry. One engine serves both dispatcher roles:
//!
//! - **Root dispatch** ([`Engine::dispatch_root`]): one external
//!   `dispatch(action)` call. Creates a fresh [`DispatchCtx`] (error
//!   collector + task tracker + cancellation token) for the action's
//!   whole causal tree.
//! - **Child dispatch** ([`EffectContext::dispatch`]): an effect body
//!   dispatching a further action. Reuses the parent's context, so the
//!   child's effect tasks settle and fail together with the parent's.
//!
//! ## Dispatch flow
//! ```text
//! dispatch(action)
//!   ├─► transition fold (atomic on the state cell, pre-state captured)
//!   │     └─ panic → collected, state untouched, effects skipped
//!   ├─► effect walk (pooled stack)
//!   │     ├─ Node      → run inline, error/panic collected
//!   │     ├─ Suspend   → spawn child task (tracked, raced vs token)
//!   │     ├─ Composite → push children (all started this dispatch)
//!   │     └─ Filtered  → gate on (action, pre-state)
//!   └─► driver task: tracker settles → finalize
//!         ├─ every error → hook registry (always)
//!         └─ structured handler? → handler, Ok
//!            otherwise          → Err(DispatchError::Aggregate)
//! ```
//!
//! ## Rules
//! - Effects observe the **pre-transition** state paired with their
//!   action, even when unrelated dispatches race on the cell.
//! - A child dispatch's transition always observes a state that
//!   already reflects its parent's transition.
//! - Two independent root dispatches have no mutual ordering.
//! - Cancelling a dispatch token stops its suspend tasks at the next
//!   await point; the transition has already committed by then.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::cell::StateCell;
use crate::core::collector::ErrorCollector;
use crate::core::handle::DispatchHandle;
use crate::error::{panic_message, DispatchError, EffectError};
use crate::hooks::{ErrorHook, HookRegistry};
use crate::pool::TraversalPool;
use crate::reduce::Effect;
use crate::reduce::Reduce;
use crate::reduce::Transition;

/// Per-dispatch shared context: one per **root** dispatch, shared by
/// every causally connected child dispatch.
#[derive(Clone)]
pub(crate) struct DispatchCtx {
    pub(crate) collector: ErrorCollector,
    pub(crate) tracker: TaskTracker,
    pub(crate) token: CancellationToken,
}

impl DispatchCtx {
    fn child_of(store_token: &CancellationToken) -> Self {
        Self {
            collector: ErrorCollector::default(),
            tracker: TaskTracker::new(),
            token: store_token.child_token(),
        }
    }
}

/// Capability handed to effect bodies.
///
/// Lets an effect dispatch further actions into the **same** causal
/// scope (same collector, tracker, and cancellation token as the
/// dispatch that ran the effect) and observe cancellation.
pub struct EffectContext<A> {
    dispatch: Arc<dyn Fn(A) + Send + Sync>,
    token: CancellationToken,
}

impl<A> Clone for EffectContext<A> {
    fn clone(&self) -> Self {
        Self {
            dispatch: Arc::clone(&self.dispatch),
            token: self.token.clone(),
        }
    }
}

impl<A> EffectContext<A> {
    /// Dispatches a child action.
    ///
    /// The child's transition runs immediately against the shared
    /// state cell (it observes a state that already reflects the
    /// parent's transition) and the child's effects are scheduled
    /// into the parent dispatch's scope.
    pub fn dispatch(&self, action: A) {
        (self.dispatch)(action);
    }

    /// True once this dispatch (or the owning store) was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when this dispatch is cancelled. Suspend bodies can
    /// race long waits against this.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Shared dispatch engine behind a store.
pub(crate) struct Engine<A, S> {
    pub(crate) cell: StateCell<S>,
    transition: Option<Transition<A, S>>,
    effect: Option<Effect<A, S>>,
    transition_stacks: TraversalPool<Transition<A, S>>,
    effect_stacks: TraversalPool<Effect<A, S>>,
    pub(crate) hooks: Arc<HookRegistry>,
    error_handler: Option<Arc<dyn ErrorHook>>,
    runtime: Option<Handle>,
    pub(crate) token: CancellationToken,
    pub(crate) tasks: TaskTracker,
}

impl<A, S> Engine<A, S>
where
    A: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        initial: S,
        reduce: Reduce<A, S>,
        hooks: Arc<HookRegistry>,
        error_handler: Option<Arc<dyn ErrorHook>>,
        runtime: Option<Handle>,
        token: CancellationToken,
        warm_stacks: usize,
        stack_depth: usize,
    ) -> Self {
        let transition_stacks = TraversalPool::new();
        let effect_stacks = TraversalPool::new();
        transition_stacks.warm(warm_stacks, stack_depth);
        effect_stacks.warm(warm_stacks, stack_depth);
        Self {
            cell: StateCell::new(initial),
            transition: reduce.transition().cloned(),
            effect: reduce.effect().cloned(),
            transition_stacks,
            effect_stacks,
            hooks,
            error_handler,
            runtime,
            token,
            tasks: TaskTracker::new(),
        }
    }

    /// One external dispatch call.
    ///
    /// The transition commits before this function returns; the
    /// returned handle settles once the whole causal tree of effects
    /// (including child dispatches) has finished.
    pub(crate) fn dispatch_root(self: &Arc<Self>, action: A) -> DispatchHandle {
        let ctx = DispatchCtx::child_of(&self.token);
        self.run_reduce(&action, &ctx);

        let engine = Arc::clone(self);
        let driver_ctx = ctx.clone();
        let driver = async move {
            driver_ctx.tracker.close();
            driver_ctx.tracker.wait().await;
            engine.finalize(&driver_ctx)
        };
        let join = self.spawn(self.tasks.track_future(driver));
        DispatchHandle::new(ctx.token, join)
    }

    /// Transition-then-effect for one action inside `ctx`. Shared by
    /// root and child dispatch.
    fn run_reduce(self: &Arc<Self>, action: &A, ctx: &DispatchCtx) {
        if let Some(pre) = self.apply_transition(action, ctx) {
            if let Some(effect) = &self.effect {
                self.walk_effects(effect, action, &pre, ctx);
            }
        }
    }

    /// Atomically replaces the state with `transition(action, state)`,
    /// returning the pre-transition snapshot the effects must observe.
    ///
    /// A panicking transition leaves the cell untouched, records the
    /// panic, and returns `None`: effects are skipped because the
    /// (action, pre-state) pairing it would hand them never committed.
    fn apply_transition(&self, action: &A, ctx: &DispatchCtx) -> Option<S> {
        let transition = match &self.transition {
            Some(t) => t,
            None => return Some(self.cell.snapshot()),
        };
        let outcome = self.cell.modify(|s| {
            let pre = s.clone();
            let folded = {
                let mut stack = self.transition_stacks.acquire();
                catch_unwind(AssertUnwindSafe(|| {
                    transition.apply(action, pre.clone(), &mut stack)
                }))
            };
            match folded {
                Ok(next) => {
                    *s = next;
                    Ok(pre)
                }
                Err(payload) => Err(panic_message(payload)),
            }
        });
        match outcome {
            Ok(pre) => Some(pre),
            Err(info) => {
                ctx.collector.push(EffectError::Panic { info });
                None
            }
        }
    }

    /// Walks the effect tree for `(action, pre)` with a pooled stack.
    ///
    /// Sync nodes run inline; suspend nodes become tracked child tasks
    /// raced against the dispatch token. Every sibling is started
    /// before this function returns.
    fn walk_effects(self: &Arc<Self>, root: &Effect<A, S>, action: &A, pre: &S, ctx: &DispatchCtx) {
        use crate::reduce::EffectNode;

        let effect_ctx = self.effect_context(ctx);
        let mut stack = self.effect_stacks.acquire();
        stack.push(root.clone());
        while let Some(effect) = stack.pop() {
            match effect.node() {
                EffectNode::Composite(children) => {
                    for child in children.iter().rev() {
                        stack.push(child.clone());
                    }
                }
                EffectNode::Filtered {
                    action: ap,
                    state: sp,
                    inner,
                } => {
                    if Effect::gate_matches(ap, sp, action, pre) {
                        stack.push(inner.clone());
                    }
                }
                EffectNode::Node(body) => {
                    match catch_unwind(AssertUnwindSafe(|| body(action, pre, &effect_ctx))) {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => ctx.collector.push(err),
                        Err(payload) => ctx.collector.push(EffectError::Panic {
                            info: panic_message(payload),
                        }),
                    }
                }
                EffectNode::Suspend(body) => {
                    let fut = body(action.clone(), pre.clone(), effect_ctx.clone());
                    let collector = ctx.collector.clone();
                    let token = ctx.token.clone();
                    let task = async move {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            res = AssertUnwindSafe(fut).catch_unwind() => match res {
                                Ok(Ok(())) => {}
                                Ok(Err(err)) => collector.push(err),
                                Err(payload) => collector.push(EffectError::Panic {
                                    info: panic_message(payload),
                                }),
                            }
                        }
                    };
                    let _ = self.spawn(ctx.tracker.track_future(task));
                }
            }
        }
    }

    fn effect_context(self: &Arc<Self>, ctx: &DispatchCtx) -> EffectContext<A> {
        let engine = Arc::clone(self);
        let child_ctx = ctx.clone();
        EffectContext {
            dispatch: Arc::new(move |action: A| engine.run_reduce(&action, &child_ctx)),
            token: ctx.token.clone(),
        }
    }

    /// Settles one dispatch: reports every collected error to the hook
    /// registry, then routes the aggregate to the structured handler
    /// if one is configured, otherwise fails the handle.
    fn finalize(&self, ctx: &DispatchCtx) -> Result<(), DispatchError> {
        let errors = ctx.collector.drain();
        if errors.is_empty() {
            return Ok(());
        }
        for err in &errors {
            self.hooks.emit(err);
        }
        match &self.error_handler {
            Some(handler) => {
                for err in &errors {
                    handler.on_error(err);
                }
                Ok(())
            }
            None => Err(DispatchError::Aggregate { errors }),
        }
    }

    /// Spawns on the configured runtime: explicit store handle first,
    /// then the registry default, then the ambient Tokio context.
    pub(crate) fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.runtime.clone().or_else(|| self.hooks.default_runtime()) {
            Some(handle) => handle.spawn(fut),
            None => tokio::spawn(fut),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn pools_idle_empty(&self) -> bool {
        self.transition_stacks.all_idle_empty() && self.effect_stacks.all_idle_empty()
    }
}
