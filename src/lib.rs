//! # statekit
//!
//! **statekit** is a composable state-container runtime for Rust.
//!
//! It represents application logic as an algebra of state transitions
//! and side effects, executes effects under structured concurrency so
//! that actions triggered by other actions stay causally ordered
//! against the shared state, and starts/stops external action sources
//! based on how many observers the state stream currently has.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    caller    │   │ SourceActor  │   │ SourceActor  │
//!     │  dispatch(a) │   │  (bootstrap) │   │  (bootstrap) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (per store)                                               │
//! │  - StateCell (watch-backed state + subscriber count)              │
//! │  - Transition tree (atomic fold, pre-state captured)              │
//! │  - Effect tree (pooled traversal, tracked child tasks)            │
//! │  - TraversalPools (reusable walk stacks, warmed at build)         │
//! └──────┬──────────────────┬──────────────────────────────┬──────────┘
//!        ▼                  ▼                              ▼
//!   StateHandle        DispatchHandle                 HookRegistry
//!  (counted reader)   (settle / cancel)          (error side-channel)
//! ```
//!
//! ### Dispatch lifecycle
//! ```text
//! dispatch(action)
//!   ├─► transition(action, state): atomic on the state cell;
//!   │   effects will observe the pre-transition snapshot
//!   ├─► walk effect tree:
//!   │     ├─ Node      → run inline
//!   │     ├─ Suspend   → concurrent child task (tracked)
//!   │     ├─ Composite → all siblings started this dispatch
//!   │     └─ Filtered  → exact-match gate on (action, state)
//!   │         └─ effect bodies may ctx.dispatch(child): same
//!   │            collector, tracker, and token as the parent
//!   └─► handle.settled().await
//!         ├─ no failures → Ok(())
//!         ├─ structured handler installed → handler gets all, Ok(())
//!         └─ otherwise → Err(DispatchError::Aggregate { errors })
//!             (every error also reaches the hook registry)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------------|------------------------------------------|
//! | **Reduce algebra**| Compose transitions (fold) and effects (fan-out) as values.        | [`Reduce`], [`Transition`], [`Effect`]   |
//! | **Dispatch**      | Atomic transitions, causal child dispatch, settle/cancel handles.  | [`Store::dispatch`], [`DispatchHandle`]  |
//! | **Bootstrap**     | Subscriber-gated action sources with restart-tolerant policies.    | [`Bootstrap`], [`DeliveryPolicy`], [`ActionSource`] |
//! | **State stream**  | Multi-subscriber state view with a live subscriber count.          | [`StateHandle`], [`Store::subscriber_count`] |
//! | **Errors**        | Aggregated per-dispatch failures plus a global hook side-channel.  | [`DispatchError`], [`EffectError`], [`ErrorHook`] |
//! | **Configuration** | Per-store runtime/pool settings; injectable hook registry.         | [`StoreConfig`], [`StoreBuilder`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogHook`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use statekit::{Bootstrap, Effect, EffectContext, Reduce, Store, Transition};
//!
//! #[derive(Clone)]
//! enum Action {
//!     Inc,
//!     Doubled,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // State goes up by one on Inc; an effect answers every Inc
//!     // with a causally ordered Doubled.
//!     let transition = Transition::new(|a: &Action, s: u64| match a {
//!         Action::Inc => s + 1,
//!         Action::Doubled => s * 2,
//!     });
//!     let effect = Effect::filtered(
//!         |a: &Action| matches!(a, Action::Inc),
//!         Effect::new(|_a: &Action, _state: &u64, ctx: &EffectContext<Action>| {
//!             ctx.dispatch(Action::Doubled);
//!             Ok(())
//!         }),
//!     );
//!
//!     let store = Store::new(0u64, Reduce::new(transition, effect), Bootstrap::empty());
//!
//!     store.dispatch(Action::Inc).settled().await?;
//!     // Inc committed before its effect ran: (0 + 1) * 2.
//!     assert_eq!(store.snapshot(), 2);
//!     Ok(())
//! }
//! ```

mod bootstrap;
mod core;
mod error;
mod pool;
mod reduce;

pub mod hooks;

// ---- Public re-exports ----

pub use bootstrap::{
    ActionEmitter, ActionSource, Bootstrap, DeliveryPolicy, SourceFn, SourceRef, StreamSource,
};
pub use error::{DispatchError, EffectError, StoreError};
pub use self::core::{DispatchHandle, EffectContext, StateHandle, Store, StoreBuilder, StoreConfig};
pub use hooks::{ErrorHook, HookRegistry};
pub use pool::{TraversalPool, TraversalStack};
pub use reduce::{Effect, Reduce, Transition};

// Optional: expose a simple built-in logging hook (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use hooks::LogHook;
