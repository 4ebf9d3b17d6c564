//! Error observability: aggregated dispatch failures reaching the
//! global hook registry.
//!
//! Run with: `cargo run --example error_hooks --features logging`

use statekit::{
    hooks, Bootstrap, Effect, EffectContext, EffectError, LogHook, Reduce, Store, Transition,
};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum Action {
    Poke,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    hooks::global().add(Arc::new(LogHook));

    // Two sibling effects fail; both entries survive aggregation.
    let flaky = Effect::new(|_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
        Err(EffectError::fail("first failure"))
    });
    let broken = Effect::new(|_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
        Err(EffectError::fail("second failure"))
    });

    let store = Store::new(
        0u64,
        Reduce::new(
            Transition::new(|_: &Action, s: u64| s + 1),
            flaky.merge(&broken),
        ),
        Bootstrap::empty(),
    );

    match store.dispatch(Action::Poke).settled().await {
        Ok(()) => println!("dispatch settled cleanly"),
        Err(err) => println!("dispatch failed: {} error(s)", err.errors().len()),
    }

    // Global registry state leaks across uses; reset when done.
    hooks::global().reset();
    Ok(())
}
