//! # Completion handle for one dispatch.
//!
//! [`DispatchHandle`] is returned by
//! [`Store::dispatch`](crate::Store::dispatch). It lets the caller
//! wait for the dispatch's full effect tree (including recursively
//! triggered child dispatches) to settle, and cancel that one
//! dispatch's background work.
//!
//! ## Rules
//! - Dropping the handle detaches the dispatch; it keeps running and
//!   its errors still reach the hook registry.
//! - [`cancel`](DispatchHandle::cancel) stops only this dispatch's
//!   effect subtree: sibling dispatches, bootstrap tasks, and the
//!   store itself are unaffected. The transition has already committed
//!   by the time cancellation could apply.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, EffectError};

/// Handle to one in-flight dispatch.
pub struct DispatchHandle {
    token: CancellationToken,
    join: JoinHandle<Result<(), DispatchError>>,
}

impl DispatchHandle {
    pub(crate) fn new(
        token: CancellationToken,
        join: JoinHandle<Result<(), DispatchError>>,
    ) -> Self {
        Self { token, join }
    }

    /// Waits until the dispatch's whole causal tree has settled.
    ///
    /// Resolves `Ok(())` when no effect failed, or when the store's
    /// structured error handler consumed the failures; otherwise
    /// resolves with the aggregate of every collected error.
    pub async fn settled(self) -> Result<(), DispatchError> {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(DispatchError::Aggregate {
                errors: vec![EffectError::Panic {
                    info: join_err.to_string(),
                }],
            }),
        }
    }

    /// Cancels this dispatch's remaining effect work.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the dispatch has settled.
    pub fn is_settled(&self) -> bool {
        self.join.is_finished()
    }
}
