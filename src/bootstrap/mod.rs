//! # Bootstrap: declarative, subscriber-gated action sources.
//!
//! A [`Bootstrap`] describes where a store's unprompted actions come
//! from (timers, event streams, external feeds) and under which
//! [`DeliveryPolicy`] each source's background task runs. Sources are
//! started at store construction and torn down with the store's
//! scope, or earlier when their policy says so.
//!
//! ## Architecture
//! ```text
//! Bootstrap tree ──flatten──► leaf sources
//!     │                          │ (one SourceActor each, concurrent)
//!     ▼                          ▼
//! Store::build ──spawn──► SourceActor::run(policy)
//!                              │ gates on subscriber count
//!                              ▼
//!                  source.run(emitter, token) ──► dispatch(action)
//! ```
//!
//! ## Rules
//! - Composite nodes flatten recursively; every leaf is fetched
//!   independently and concurrently.
//! - A failing source stops alone: sibling sources and the store are
//!   unaffected; the failure is reported to the hook registry.
//! - `Eager` runs for the lifetime of the store scope; `Lazy` waits
//!   for the first subscriber, then never stops; `WhileSubscribed`
//!   restarts per subscription epoch with a shutdown grace window.

mod actor;
mod bootstrap;
mod source;

pub use bootstrap::{Bootstrap, DeliveryPolicy};
pub use source::{ActionEmitter, ActionSource, SourceFn, SourceRef, StreamSource};

pub(crate) use actor::{FetchContext, SourceActor};
