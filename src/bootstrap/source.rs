//! # Action source abstraction and function-backed implementation.
//!
//! This module defines the [`ActionSource`] trait (async, cancelable)
//! and a convenient function-backed implementation [`SourceFn`]. The
//! common handle type is [`SourceRef`], an `Arc<dyn ActionSource<A>>`
//! suitable for sharing across the runtime.
//!
//! A source receives an [`ActionEmitter`] to feed actions into the
//! store and a [`CancellationToken`] it should check to stop
//! cooperatively when its policy (or the store) shuts it down.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::DispatchHandle;
use crate::error::EffectError;

/// Shared reference to an action source.
pub type SourceRef<A> = Arc<dyn ActionSource<A>>;

/// Feeds actions from a bootstrap source into the store.
///
/// Every emitted action is a full root dispatch: its transition runs
/// atomically and its effect tree gets a fresh causal scope. The
/// returned [`DispatchHandle`] may be awaited when the source wants
/// backpressure, or dropped to fire-and-forget.
pub struct ActionEmitter<A> {
    send: Arc<dyn Fn(A) -> DispatchHandle + Send + Sync>,
}

impl<A> Clone for ActionEmitter<A> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

impl<A> ActionEmitter<A> {
    pub(crate) fn new(send: impl Fn(A) -> DispatchHandle + Send + Sync + 'static) -> Self {
        Self {
            send: Arc::new(send),
        }
    }

    /// Dispatches one action into the store.
    pub fn dispatch(&self, action: A) -> DispatchHandle {
        (self.send)(action)
    }
}

/// # Asynchronous, cancelable producer of actions.
///
/// A source has a stable [`name`](ActionSource::name) and an async
/// [`run`](ActionSource::run) that emits actions until its stream is
/// exhausted or it is cancelled. Under
/// [`DeliveryPolicy::WhileSubscribed`](crate::DeliveryPolicy) `run` is
/// called afresh for every subscription epoch, so implementations
/// must not assume they run only once.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use statekit::{ActionEmitter, ActionSource, EffectError};
///
/// #[derive(Clone)]
/// enum Action { Tick }
///
/// struct Ticker;
///
/// #[async_trait]
/// impl ActionSource<Action> for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(
///         &self,
///         emitter: ActionEmitter<Action>,
///         token: CancellationToken,
///     ) -> Result<(), EffectError> {
///         while !token.is_cancelled() {
///             emitter.dispatch(Action::Tick);
///             tokio::time::sleep(std::time::Duration::from_secs(1)).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ActionSource<A: Send + 'static>: Send + Sync + 'static {
    /// Returns a stable, human-readable source name.
    fn name(&self) -> &str;

    /// Emits actions until exhausted or cancelled.
    ///
    /// Implementations should check `token.is_cancelled()` (or race
    /// awaits against `token.cancelled()`) and exit promptly when
    /// their policy stops them.
    async fn run(
        &self,
        emitter: ActionEmitter<A>,
        token: CancellationToken,
    ) -> Result<(), EffectError>;
}

/// Function-backed source implementation.
///
/// Wraps a closure that *creates* a new future per start, so a source
/// restarted by `WhileSubscribed` begins from a clean slate.
pub struct SourceFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SourceFn<F> {
    /// Creates a new function-backed source.
    ///
    /// Prefer [`SourceFn::arc`] when you immediately need a
    /// [`SourceRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the source and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use statekit::{ActionEmitter, EffectError, SourceFn, SourceRef};
    ///
    /// let src: SourceRef<u32> = SourceFn::arc(
    ///     "one-shot",
    ///     |emitter: ActionEmitter<u32>, _token: CancellationToken| async move {
    ///         emitter.dispatch(42);
    ///         Ok::<_, EffectError>(())
    ///     },
    /// );
    /// assert_eq!(src.name(), "one-shot");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<A, F, Fut> ActionSource<A> for SourceFn<F>
where
    A: Send + 'static,
    F: Fn(ActionEmitter<A>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        emitter: ActionEmitter<A>,
        token: CancellationToken,
    ) -> Result<(), EffectError> {
        (self.f)(emitter, token).await
    }
}

/// Stream-backed source implementation.
///
/// Wraps a factory that *creates* a new action stream per start, so a
/// source restarted by `WhileSubscribed` consumes a fresh stream.
/// Every item is dispatched in order; the source ends when the stream
/// does.
pub struct StreamSource<F> {
    name: Cow<'static, str>,
    factory: F,
}

impl<F> StreamSource<F> {
    /// Creates a new stream-backed source.
    pub fn new(name: impl Into<Cow<'static, str>>, factory: F) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// Creates the source and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use statekit::{SourceRef, StreamSource};
    ///
    /// let src: SourceRef<u32> =
    ///     StreamSource::arc("replay", || futures::stream::iter(vec![1, 2, 3]));
    /// assert_eq!(src.name(), "replay");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, factory: F) -> Arc<Self> {
        Arc::new(Self::new(name, factory))
    }
}

#[async_trait]
impl<A, F, St> ActionSource<A> for StreamSource<F>
where
    A: Send + 'static,
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = A> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        emitter: ActionEmitter<A>,
        token: CancellationToken,
    ) -> Result<(), EffectError> {
        let mut stream = std::pin::pin!((self.factory)());
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                item = stream.next() => match item {
                    Some(action) => {
                        emitter.dispatch(action);
                    }
                    None => return Ok(()),
                },
            }
        }
    }
}
