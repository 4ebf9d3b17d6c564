//! # SourceActor: single-source lifecycle supervisor.
//!
//! One actor per bootstrap leaf. The actor owns the policy state
//! machine: it watches the state stream's subscriber count and starts,
//! keeps, or cancels the source's consumption task accordingly.
//!
//! ## Policy flow
//! ```text
//! Eager:            run ──────────────────────────────► done/cancel
//! Lazy:             wait count>0 ──► run ─────────────► done/cancel
//! WhileSubscribed:  wait count>0 ──► run epoch task
//!                        ▲              │ count==0
//!                        │              ▼
//!                        │         grace window (timeout)
//!                        │              ├─ count>0 again → keep task
//!                        └── cancel ◄───┘ timeout elapsed
//! ```
//!
//! ## Rules
//! - Cancellation is checked at safe points (subscriber waits, the
//!   grace window) and raced against the running source.
//! - A source that completes or fails on its own ends the actor; the
//!   failure is reported to the hook registry and isolated from
//!   sibling sources.
//! - Each `WhileSubscribed` epoch calls [`ActionSource::run`] afresh
//!   on a new child token.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bootstrap::{ActionEmitter, DeliveryPolicy, SourceRef};
use crate::error::{panic_message, EffectError};
use crate::hooks::HookRegistry;

/// Everything a bootstrap needs to spawn its source tasks.
pub(crate) struct FetchContext<A> {
    pub(crate) emitter: ActionEmitter<A>,
    pub(crate) subscribers: watch::Receiver<usize>,
    pub(crate) token: CancellationToken,
    pub(crate) runtime: Option<Handle>,
    pub(crate) tracker: TaskTracker,
    pub(crate) hooks: Arc<HookRegistry>,
}

/// Supervises one action source under its delivery policy.
pub(crate) struct SourceActor<A> {
    source: SourceRef<A>,
    policy: DeliveryPolicy,
    emitter: ActionEmitter<A>,
    subscribers: watch::Receiver<usize>,
    token: CancellationToken,
    hooks: Arc<HookRegistry>,
}

impl<A: Clone + Send + Sync + 'static> SourceActor<A> {
    /// Spawns the actor on the store's runtime; the handle is retained
    /// by the store for its whole lifetime.
    pub(crate) fn spawn(
        source: SourceRef<A>,
        policy: DeliveryPolicy,
        ctx: &FetchContext<A>,
    ) -> JoinHandle<()> {
        let actor = Self {
            source,
            policy,
            emitter: ctx.emitter.clone(),
            subscribers: ctx.subscribers.clone(),
            // Child token: one source's teardown never affects siblings.
            token: ctx.token.child_token(),
            hooks: Arc::clone(&ctx.hooks),
        };
        let fut = ctx.tracker.track_future(actor.run());
        match &ctx.runtime {
            Some(handle) => handle.spawn(fut),
            None => tokio::spawn(fut),
        }
    }

    async fn run(mut self) {
        match self.policy {
            DeliveryPolicy::Eager => {
                run_source(&self.source, &self.emitter, self.token.clone(), &self.hooks).await;
            }
            DeliveryPolicy::Lazy => {
                if self.wait_subscribed().await {
                    run_source(&self.source, &self.emitter, self.token.clone(), &self.hooks).await;
                }
            }
            DeliveryPolicy::WhileSubscribed { timeout } => self.run_gated(timeout).await,
        }
    }

    /// Waits until the subscriber count is positive at least once.
    /// Returns `false` on cancellation or when the store is gone.
    async fn wait_subscribed(&mut self) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            res = self.subscribers.wait_for(|c| *c > 0) => res.is_ok(),
        }
    }

    /// `WhileSubscribed` epochs: one consumption task per subscription
    /// window, with a grace period on last-unsubscribe.
    async fn run_gated(mut self, timeout: Duration) {
        'epochs: loop {
            if !self.wait_subscribed().await {
                return;
            }

            let epoch_token = self.token.child_token();
            let mut task = {
                let source = Arc::clone(&self.source);
                let emitter = self.emitter.clone();
                let hooks = Arc::clone(&self.hooks);
                let run_token = epoch_token.clone();
                tokio::spawn(async move {
                    run_source(&source, &emitter, run_token, &hooks).await;
                })
            };

            loop {
                tokio::select! {
                    _ = self.token.cancelled() => {
                        epoch_token.cancel();
                        let _ = (&mut task).await;
                        return;
                    }
                    res = &mut task => {
                        // Source ended on its own; the actor is done.
                        self.report_join(res);
                        return;
                    }
                    closed = async { self.subscribers.wait_for(|c| *c == 0).await.is_err() } => {
                        if closed {
                            epoch_token.cancel();
                            let _ = (&mut task).await;
                            return;
                        }
                        // Last subscriber left: hold the task through
                        // the grace window.
                        tokio::select! {
                            _ = self.token.cancelled() => {
                                epoch_token.cancel();
                                let _ = (&mut task).await;
                                return;
                            }
                            res = &mut task => {
                                self.report_join(res);
                                return;
                            }
                            closed = async { self.subscribers.wait_for(|c| *c > 0).await.is_err() } => {
                                if closed {
                                    epoch_token.cancel();
                                    let _ = (&mut task).await;
                                    return;
                                }
                                // Resubscribed in time: keep the task.
                                continue;
                            }
                            _ = tokio::time::sleep(timeout) => {
                                epoch_token.cancel();
                                let _ = (&mut task).await;
                                continue 'epochs;
                            }
                        }
                    }
                }
            }
        }
    }

    fn report_join(&self, res: Result<(), tokio::task::JoinError>) {
        if let Err(join_err) = res {
            self.hooks.emit(&EffectError::Panic {
                info: join_err.to_string(),
            });
        }
    }
}

/// Runs one consumption pass: races the source against its token,
/// captures panics, and reports failures to the hooks.
async fn run_source<A: Clone + Send + Sync + 'static>(
    source: &SourceRef<A>,
    emitter: &ActionEmitter<A>,
    token: CancellationToken,
    hooks: &HookRegistry,
) {
    let fut = source.run(emitter.clone(), token.clone());
    let res = tokio::select! {
        _ = token.cancelled() => Ok(()),
        caught = AssertUnwindSafe(fut).catch_unwind() => match caught {
            Ok(outcome) => outcome,
            Err(payload) => Err(EffectError::Panic {
                info: panic_message(payload),
            }),
        },
    };
    if let Err(err) = res {
        if !err.is_cancellation() {
            hooks.emit(&err);
        }
    }
}
