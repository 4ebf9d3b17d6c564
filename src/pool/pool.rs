//! # Free-list pool of traversal stacks.
//!
//! [`TraversalPool`] keeps a free list of `Vec<T>` buffers handed out
//! as [`TraversalStack`] guards. Releasing is automatic on guard drop:
//! the buffer is cleared and pushed back, so a buffer handed out by
//! [`TraversalPool::acquire`] is never observed non-empty, including
//! when a panic unwinds through a traversal.
//!
//! ## Rules
//! - `acquire`/`release` are safe under arbitrary concurrent callers,
//!   including reentrant acquires from nested dispatches on the same
//!   task.
//! - The free list is bounded by [`TraversalPool::max_idle`]; buffers
//!   beyond it are simply dropped on release.
//! - [`TraversalPool::warm`] pre-allocates buffers at store
//!   construction so the first dispatch does not pay allocation cost.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Default cap on retained idle buffers.
const DEFAULT_MAX_IDLE: usize = 64;

/// Thread-safe free list of reusable traversal stacks.
pub struct TraversalPool<T> {
    free: Mutex<Vec<Vec<T>>>,
    max_idle: usize,
}

impl<T> Default for TraversalPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TraversalPool<T> {
    /// Creates an empty pool with the default idle cap.
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Pre-allocates `slots` buffers, each with room for `depth`
    /// nodes, capped at `max_idle`.
    pub fn warm(&self, slots: usize, depth: usize) {
        let mut free = self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let target = slots.min(self.max_idle);
        while free.len() < target {
            free.push(Vec::with_capacity(depth));
        }
    }

    /// Takes an empty buffer from the pool, or allocates a fresh one.
    ///
    /// The returned guard derefs to `Vec<T>` and returns the buffer on
    /// drop.
    pub fn acquire(&self) -> TraversalStack<'_, T> {
        let buf = {
            let mut free = self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            free.pop()
        };
        let buf = buf.unwrap_or_default();
        debug_assert!(buf.is_empty());
        TraversalStack {
            buf: Some(buf),
            pool: self,
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// True when every retained buffer is empty.
    ///
    /// This is an invariant, not a transient condition; it is exposed
    /// for tests and debug assertions.
    pub fn all_idle_empty(&self) -> bool {
        self.free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .all(|buf| buf.is_empty())
    }

    fn release(&self, mut buf: Vec<T>) {
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

/// Guard over a pooled buffer; clears and returns it on drop.
pub struct TraversalStack<'a, T> {
    buf: Option<Vec<T>>,
    pool: &'a TraversalPool<T>,
}

impl<T> Deref for TraversalStack<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        self.buf.as_ref().expect("buffer taken")
    }
}

impl<T> DerefMut for TraversalStack<'_, T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        self.buf.as_mut().expect("buffer taken")
    }
}

impl<T> Drop for TraversalStack<'_, T> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}
