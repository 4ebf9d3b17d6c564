//! # State cell and subscriber-counted read handles.
//!
//! [`StateCell`] is a thin wrapper around a pair of
//! [`tokio::sync::watch`] channels: one carrying the state value, one
//! carrying the live subscriber count. The count is what gates
//! [`DeliveryPolicy`](crate::DeliveryPolicy)-driven bootstrap sources.
//!
//! ## Rules
//! - The state channel always has a current value; a fresh
//!   [`StateHandle`] observes the latest snapshot immediately.
//! - Writers go through [`StateCell::modify`], which serializes
//!   mutations on the watch writer lock; no partial states are ever
//!   observable.
//! - Every live [`StateHandle`] counts as exactly one subscriber;
//!   cloning registers, dropping unregisters.

use std::sync::Arc;

use tokio::sync::watch;

/// Owns the state value and the subscriber count.
pub(crate) struct StateCell<S> {
    state: watch::Sender<S>,
    subscribers: Arc<watch::Sender<usize>>,
}

impl<S: Clone + Send + Sync + 'static> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        let (subscribers, _) = watch::channel(0usize);
        Self {
            state,
            subscribers: Arc::new(subscribers),
        }
    }

    /// Runs `f` against the current state under the watch writer lock.
    ///
    /// Concurrent callers serialize here; each sees the value the
    /// previous writer left behind, which is what makes a transition
    /// read-compute-write atomic.
    pub(crate) fn modify<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut out = None;
        self.state.send_modify(|s| out = Some(f(s)));
        // send_modify invokes the closure exactly once.
        out.expect("send_modify ran")
    }

    /// Clones the current state without subscribing.
    pub(crate) fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    /// Creates a new counted read handle.
    pub(crate) fn subscribe(&self) -> StateHandle<S> {
        StateHandle {
            rx: self.state.subscribe(),
            count: CountGuard::register(&self.subscribers),
        }
    }

    /// Observes the live subscriber count.
    pub(crate) fn subscriber_count(&self) -> watch::Receiver<usize> {
        self.subscribers.subscribe()
    }
}

/// Read-only, multi-subscriber view of a store's state.
///
/// Each live handle (including clones) counts as one subscriber for
/// bootstrap gating purposes. Dropping the handle unsubscribes.
///
/// ## Example
/// ```no_run
/// # async fn demo(store: statekit::Store<u8, u64>) {
/// let mut state = store.state();
/// println!("current: {}", state.get());
/// while state.changed().await.is_ok() {
///     println!("updated: {}", state.get());
/// }
/// # }
/// ```
pub struct StateHandle<S> {
    rx: watch::Receiver<S>,
    count: CountGuard,
}

impl<S: Clone> StateHandle<S> {
    /// Clones the current snapshot.
    pub fn get(&self) -> S {
        self.rx.borrow().clone()
    }
}

impl<S> StateHandle<S> {
    /// Borrows the current snapshot without cloning.
    ///
    /// Keep the borrow short: it holds a read lock on the channel.
    pub fn borrow(&self) -> watch::Ref<'_, S> {
        self.rx.borrow()
    }

    /// Waits for the next state change.
    ///
    /// Returns `Err` once the owning store is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// Waits until the state matches `pred`, returning a borrow of the
    /// matching snapshot.
    pub async fn wait_for(
        &mut self,
        pred: impl FnMut(&S) -> bool,
    ) -> Result<watch::Ref<'_, S>, watch::error::RecvError> {
        self.rx.wait_for(pred).await
    }
}

impl<S> Clone for StateHandle<S> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            count: self.count.clone(),
        }
    }
}

/// Registers one subscriber for its whole lifetime.
struct CountGuard {
    counter: Arc<watch::Sender<usize>>,
}

impl CountGuard {
    fn register(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|c| *c += 1);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Clone for CountGuard {
    fn clone(&self) -> Self {
        Self::register(&self.counter)
    }
}

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|c| *c = c.saturating_sub(1));
    }
}
