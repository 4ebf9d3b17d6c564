//! # Reusable traversal-stack pool.
//!
//! Dispatch walks transition/effect trees with an explicit stack of
//! "remaining nodes to visit". Dispatch is a hot path (potentially
//! many times per second), so those stacks are pooled and reused
//! instead of allocated per call.

mod pool;

pub use pool::{TraversalPool, TraversalStack};
