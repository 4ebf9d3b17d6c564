//! # Reduce: the paired transition/effect a store runs.
//!
//! A [`Reduce`] bundles an optional [`Transition`] and an optional
//! [`Effect`]. Either half may be absent; `Reduce::empty()` is a legal
//! no-op and the identity of [`Reduce::compose`].
//!
//! ## Rules
//! - `compose(r1, r2)` folds transitions left-to-right and fans
//!   effects out in parallel.
//! - Composing with `empty` never wraps the other operand; the result
//!   is observationally (and structurally) identical to it.

use crate::reduce::{Effect, Transition};

/// Paired transition + effect for one store.
///
/// ## Example
/// ```
/// use statekit::{Reduce, Transition};
///
/// #[derive(Clone)]
/// enum Action { Inc }
///
/// let counter = Reduce::from_transition(Transition::new(|_: &Action, s: u32| s + 1));
/// let combined = Reduce::empty().compose(&counter);
/// assert!(combined.transition().is_some());
/// assert!(combined.effect().is_none());
/// ```
pub struct Reduce<A, S> {
    transition: Option<Transition<A, S>>,
    effect: Option<Effect<A, S>>,
}

impl<A, S> Clone for Reduce<A, S> {
    fn clone(&self) -> Self {
        Self {
            transition: self.transition.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<A, S> Default for Reduce<A, S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, S> Reduce<A, S> {
    /// Creates a reduce with both halves present.
    pub fn new(transition: Transition<A, S>, effect: Effect<A, S>) -> Self {
        Self {
            transition: Some(transition),
            effect: Some(effect),
        }
    }

    /// A no-op reduce: identity of [`Reduce::compose`].
    pub fn empty() -> Self {
        Self {
            transition: None,
            effect: None,
        }
    }

    /// Creates a transition-only reduce.
    pub fn from_transition(transition: Transition<A, S>) -> Self {
        Self {
            transition: Some(transition),
            effect: None,
        }
    }

    /// Creates an effect-only reduce.
    pub fn from_effect(effect: Effect<A, S>) -> Self {
        Self {
            transition: None,
            effect: Some(effect),
        }
    }

    /// Returns the transition half, if any.
    pub fn transition(&self) -> Option<&Transition<A, S>> {
        self.transition.as_ref()
    }

    /// Returns the effect half, if any.
    pub fn effect(&self) -> Option<&Effect<A, S>> {
        self.effect.as_ref()
    }

    /// Composes two reduces.
    ///
    /// The combined transition folds `self` then `other`
    /// (left-to-right); the combined effect runs both sides in
    /// parallel. A `None` half on either side is skipped rather than
    /// wrapped, which makes [`Reduce::empty`] a true identity.
    pub fn compose(&self, other: &Reduce<A, S>) -> Self {
        let transition = match (&self.transition, &other.transition) {
            (Some(a), Some(b)) => Some(a.then(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        let effect = match (&self.effect, &other.effect) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        Self { transition, effect }
    }
}
