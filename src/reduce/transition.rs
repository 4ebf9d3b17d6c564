//! # Pure state-transition tree.
//!
//! A [`Transition`] describes how an action changes state, as a value:
//! a small closed set of node kinds that the dispatcher walks with a
//! pooled traversal stack instead of recursing.
//!
//! ## Node kinds
//! - **Leaf**: wraps a concrete `Fn(&A, S) -> S`.
//! - **Composite**: ordered children, evaluated left-to-right as a
//!   fold; each child receives the state produced by the previous
//!   child, not the original state.
//! - **Filtered**: gates a child behind an action predicate and/or a
//!   state predicate; when the gate does not match, the state passes
//!   through unchanged.
//!
//! ## Rules
//! - Transition functions are synchronous and must not block.
//! - Filters match the **concrete** action variant (`matches!`-style);
//!   unrelated variants sharing an enum never both match one instance.
//! - `then` is associative; nested top-level composites are flattened
//!   so composition order is the only thing that matters.
//!
//! ## Example
//! ```
//! use statekit::Transition;
//!
//! #[derive(Clone)]
//! enum Action { Add(i32), Clear }
//!
//! let add = Transition::new(|a: &Action, s: i32| match a {
//!     Action::Add(n) => s + n,
//!     _ => s,
//! });
//! let clear = Transition::filtered(
//!     |a: &Action| matches!(a, Action::Clear),
//!     Transition::new(|_, _| 0),
//! );
//! let combined = add.then(&clear);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::reduce::{ActionPredicate, StatePredicate};

/// Leaf computation: pure `(action, state) -> state`.
type TransitionFn<A, S> = Arc<dyn Fn(&A, S) -> S + Send + Sync>;

/// Immutable, cheaply cloneable state-transition tree.
///
/// Cloning a `Transition` clones an `Arc` handle; the tree itself is
/// shared and never mutated after construction.
pub struct Transition<A, S> {
    node: Arc<TransitionNode<A, S>>,
}

enum TransitionNode<A, S> {
    Leaf(TransitionFn<A, S>),
    Composite(Vec<Transition<A, S>>),
    Filtered {
        action: Option<ActionPredicate<A>>,
        state: Option<StatePredicate<S>>,
        inner: Transition<A, S>,
    },
}

impl<A, S> Clone for Transition<A, S> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<A, S> fmt::Debug for Transition<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            TransitionNode::Leaf(_) => f.write_str("Transition::Leaf"),
            TransitionNode::Composite(cs) => {
                write!(f, "Transition::Composite(len={})", cs.len())
            }
            TransitionNode::Filtered { .. } => f.write_str("Transition::Filtered"),
        }
    }
}

impl<A, S> Transition<A, S> {
    fn from_node(node: TransitionNode<A, S>) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Creates a leaf transition from a pure function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A, S) -> S + Send + Sync + 'static,
    {
        Self::from_node(TransitionNode::Leaf(Arc::new(f)))
    }

    /// Gates `inner` behind an action predicate.
    ///
    /// The inner transition only runs when `pred` returns `true` for
    /// the dispatched action; otherwise the state passes through
    /// unchanged. Use an exact variant match
    /// (`matches!(a, Action::X(..))`); several filtered branches may
    /// match the same action, and all of them fire.
    pub fn filtered<P>(pred: P, inner: Transition<A, S>) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::from_node(TransitionNode::Filtered {
            action: Some(Arc::new(pred)),
            state: None,
            inner,
        })
    }

    /// Gates `inner` behind a predicate over the current state.
    ///
    /// The predicate sees the state as produced by any earlier sibling
    /// in a composite fold, not the state at dispatch entry.
    pub fn filtered_state<P>(pred: P, inner: Transition<A, S>) -> Self
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::from_node(TransitionNode::Filtered {
            action: None,
            state: Some(Arc::new(pred)),
            inner,
        })
    }

    /// Sequences `self` before `next`: the combined transition folds
    /// left-to-right, `next` seeing the state `self` produced.
    ///
    /// Top-level composites on either side are flattened, so `then` is
    /// associative and produces the same tree regardless of grouping.
    pub fn then(&self, next: &Transition<A, S>) -> Self {
        let mut children = match self.node.as_ref() {
            TransitionNode::Composite(cs) => cs.clone(),
            _ => vec![self.clone()],
        };
        match next.node.as_ref() {
            TransitionNode::Composite(cs) => children.extend(cs.iter().cloned()),
            _ => children.push(next.clone()),
        }
        Self::from_node(TransitionNode::Composite(children))
    }

    /// Folds the tree over `seed` with an explicit traversal stack.
    ///
    /// `stack` must be empty on entry; it is drained back to empty on
    /// exit (the dispatcher hands in a pooled stack and returns it).
    pub(crate) fn apply(&self, action: &A, seed: S, stack: &mut Vec<Transition<A, S>>) -> S {
        debug_assert!(stack.is_empty());
        let mut acc = seed;
        stack.push(self.clone());
        while let Some(t) = stack.pop() {
            match t.node.as_ref() {
                TransitionNode::Leaf(f) => acc = f(action, acc),
                TransitionNode::Composite(children) => {
                    // LIFO stack: push right-to-left so the leftmost
                    // child is evaluated first.
                    for child in children.iter().rev() {
                        stack.push(child.clone());
                    }
                }
                TransitionNode::Filtered {
                    action: ap,
                    state: sp,
                    inner,
                } => {
                    let action_ok = ap.as_ref().map_or(true, |p| p(action));
                    let state_ok = sp.as_ref().map_or(true, |p| p(&acc));
                    if action_ok && state_ok {
                        stack.push(inner.clone());
                    }
                }
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Action {
        Add(i32),
        Mul(i32),
        Reset,
    }

    fn apply(t: &Transition<Action, i32>, a: &Action, s: i32) -> i32 {
        let mut stack = Vec::new();
        t.apply(a, s, &mut stack)
    }

    #[test]
    fn composite_folds_left_to_right() {
        let plus_one = Transition::new(|_: &Action, s: i32| s + 1);
        let times_ten = Transition::new(|_: &Action, s: i32| s * 10);
        // (0 + 1) * 10, not (0 * 10) + 1
        let t = plus_one.then(&times_ten);
        assert_eq!(apply(&t, &Action::Add(0), 0), 10);
        let t = times_ten.then(&plus_one);
        assert_eq!(apply(&t, &Action::Add(0), 0), 1);
    }

    #[test]
    fn then_is_associative() {
        let a = Transition::new(|_: &Action, s: i32| s + 1);
        let b = Transition::new(|_: &Action, s: i32| s * 3);
        let c = Transition::new(|_: &Action, s: i32| s - 2);
        let left = a.then(&b).then(&c);
        let right = a.then(&b.then(&c));
        for seed in [-4, 0, 7] {
            assert_eq!(
                apply(&left, &Action::Reset, seed),
                apply(&right, &Action::Reset, seed)
            );
        }
    }

    #[test]
    fn filter_matches_exact_variant_only() {
        let on_add = Transition::filtered(
            |a: &Action| matches!(a, Action::Add(_)),
            Transition::new(|a: &Action, s: i32| match a {
                Action::Add(n) => s + n,
                _ => s,
            }),
        );
        let on_mul = Transition::filtered(
            |a: &Action| matches!(a, Action::Mul(_)),
            Transition::new(|_: &Action, _: i32| -> i32 { panic!("must not run for Add") }),
        );
        let t = on_add.then(&on_mul);
        assert_eq!(apply(&t, &Action::Add(5), 1), 6);
    }

    #[test]
    fn unmatched_filter_passes_state_through() {
        let t = Transition::filtered(
            |a: &Action| matches!(a, Action::Reset),
            Transition::new(|_: &Action, _| 0),
        );
        assert_eq!(apply(&t, &Action::Add(1), 42), 42);
        assert_eq!(apply(&t, &Action::Reset, 42), 0);
    }

    #[test]
    fn state_filter_sees_folded_state() {
        let plus_ten = Transition::new(|_: &Action, s: i32| s + 10);
        let clamp = Transition::filtered_state(
            |s: &i32| *s > 5,
            Transition::new(|_: &Action, _| 5),
        );
        // Gate must observe the +10, not the seed of 0.
        let t = plus_ten.then(&clamp);
        assert_eq!(apply(&t, &Action::Add(0), 0), 5);
    }

    #[test]
    fn traversal_stack_is_drained() {
        let t = Transition::new(|_: &Action, s: i32| s + 1)
            .then(&Transition::new(|_: &Action, s: i32| s * 2));
        let mut stack = Vec::new();
        let _ = t.apply(&Action::Reset, 3, &mut stack);
        assert!(stack.is_empty());
    }
}
