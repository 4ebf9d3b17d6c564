//! # Bootstrap tree and delivery policies.
//!
//! [`Bootstrap`] is the declarative value describing a store's action
//! sources; [`DeliveryPolicy`] is the knob controlling **when** each
//! source's background task runs relative to the state stream's
//! subscriber count.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::bootstrap::{FetchContext, SourceActor, SourceRef};

/// When a bootstrap source's task runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Start immediately at store creation; run for the lifetime of
    /// the store scope.
    Eager,

    /// Suspend until the state stream has had at least one subscriber,
    /// then behave like [`DeliveryPolicy::Eager`] permanently; the
    /// source does not stop when subscribers later drop to zero.
    Lazy,

    /// Run only while the subscriber count is positive. The task is
    /// restarted on resubscription; shutdown after the last subscriber
    /// leaves is delayed by `timeout`, and a subscriber arriving
    /// within that window cancels the pending shutdown (tolerates
    /// rapid resubscribe, e.g. UI rotation).
    WhileSubscribed {
        /// Grace period between the last unsubscribe and task shutdown.
        timeout: Duration,
    },
}

impl Default for DeliveryPolicy {
    /// Returns [`DeliveryPolicy::Eager`].
    fn default() -> Self {
        DeliveryPolicy::Eager
    }
}

/// Declarative tree of action sources.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use statekit::{ActionEmitter, Bootstrap, DeliveryPolicy, EffectError, SourceFn};
///
/// #[derive(Clone)]
/// enum Action { Tick }
///
/// let ticker = Bootstrap::source(
///     SourceFn::arc("ticker", |emitter: ActionEmitter<Action>, token: CancellationToken| async move {
///         while !token.is_cancelled() {
///             emitter.dispatch(Action::Tick);
///             tokio::time::sleep(Duration::from_secs(1)).await;
///         }
///         Ok::<_, EffectError>(())
///     }),
///     DeliveryPolicy::WhileSubscribed { timeout: Duration::from_millis(500) },
/// );
/// let bootstrap = Bootstrap::empty().merge(&ticker);
/// ```
pub struct Bootstrap<A> {
    node: BootstrapNode<A>,
}

enum BootstrapNode<A> {
    /// Never emits and holds no resources.
    Empty,
    Source {
        source: SourceRef<A>,
        policy: DeliveryPolicy,
    },
    Composite(Vec<Bootstrap<A>>),
}

impl<A> Clone for Bootstrap<A> {
    fn clone(&self) -> Self {
        let node = match &self.node {
            BootstrapNode::Empty => BootstrapNode::Empty,
            BootstrapNode::Source { source, policy } => BootstrapNode::Source {
                source: Arc::clone(source),
                policy: *policy,
            },
            BootstrapNode::Composite(children) => BootstrapNode::Composite(children.clone()),
        };
        Self { node }
    }
}

impl<A> Default for Bootstrap<A> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A> fmt::Debug for Bootstrap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            BootstrapNode::Empty => f.write_str("Bootstrap::Empty"),
            BootstrapNode::Source { policy, .. } => {
                write!(f, "Bootstrap::Source(policy={policy:?})")
            }
            BootstrapNode::Composite(cs) => write!(f, "Bootstrap::Composite(len={})", cs.len()),
        }
    }
}

impl<A> Bootstrap<A> {
    /// A bootstrap that never emits.
    pub fn empty() -> Self {
        Self {
            node: BootstrapNode::Empty,
        }
    }

    /// A single source under the given policy.
    pub fn source(source: SourceRef<A>, policy: DeliveryPolicy) -> Self {
        Self {
            node: BootstrapNode::Source { source, policy },
        }
    }

    /// Combines two bootstraps; both sides' sources are fetched
    /// independently and concurrently. Nested composites flatten.
    pub fn merge(&self, other: &Bootstrap<A>) -> Self {
        let mut children = match &self.node {
            BootstrapNode::Empty => Vec::new(),
            BootstrapNode::Composite(cs) => cs.clone(),
            BootstrapNode::Source { .. } => vec![self.clone()],
        };
        match &other.node {
            BootstrapNode::Empty => {}
            BootstrapNode::Composite(cs) => children.extend(cs.iter().cloned()),
            BootstrapNode::Source { .. } => children.push(other.clone()),
        }
        if children.len() <= 1 {
            return children.pop().unwrap_or_else(Self::empty);
        }
        Self {
            node: BootstrapNode::Composite(children),
        }
    }

    /// Flattens the tree into its leaf sources.
    fn leaves(&self, out: &mut Vec<(SourceRef<A>, DeliveryPolicy)>) {
        match &self.node {
            BootstrapNode::Empty => {}
            BootstrapNode::Source { source, policy } => out.push((Arc::clone(source), *policy)),
            BootstrapNode::Composite(children) => {
                for child in children {
                    child.leaves(out);
                }
            }
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Bootstrap<A> {
    /// Spawns one background task per leaf source.
    ///
    /// Returns the task handles; the store retains them for its whole
    /// lifetime so source tasks are never silently dropped.
    pub(crate) fn fetch(&self, ctx: &FetchContext<A>) -> Vec<JoinHandle<()>> {
        let mut leaves = Vec::new();
        self.leaves(&mut leaves);
        leaves
            .into_iter()
            .map(|(source, policy)| SourceActor::spawn(source, policy, ctx))
            .collect()
    }
}
