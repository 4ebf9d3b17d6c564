//! # Reduce algebra: transitions, effects, and their composition.
//!
//! This module provides the immutable tree values that describe what a
//! store does with a dispatched action:
//! - [`Transition`] - pure `(action, state) -> state` computation tree
//! - [`Effect`] - side-effect tree, may recursively dispatch actions
//! - [`Reduce`] - the pair of both, the unit a store is built from
//!
//! ## Quick wiring
//! ```text
//! Reduce { transition: Option<Transition>, effect: Option<Effect> }
//!      └─► core::dispatcher uses:
//!           - transition to fold the new state (atomic, before effects)
//!           - effect to fan out side effects under the dispatch scope
//! ```
//!
//! ## Composition rules
//! - `Reduce::compose` is associative and `Reduce::empty()` is its
//!   identity: composing with empty leaves the other operand
//!   structurally untouched.
//! - Transition children fold **left-to-right**, each child seeing the
//!   state produced by the previous child.
//! - Effect siblings all start within the same dispatch; they have no
//!   ordering guarantee relative to each other.
//! - Filters are non-exclusive: every branch whose predicate matches
//!   the concrete action fires.

mod effect;
mod reduce;
mod transition;

pub use effect::Effect;
pub use reduce::Reduce;
pub use transition::Transition;

pub(crate) use effect::EffectNode;

use std::sync::Arc;

/// Predicate over the dispatched action, used by `Filtered` nodes.
pub(crate) type ActionPredicate<A> = Arc<dyn Fn(&A) -> bool + Send + Sync>;

/// Predicate over the current state, used by `Filtered` nodes.
pub(crate) type StatePredicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
