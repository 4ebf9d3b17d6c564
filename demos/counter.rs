//! Minimal store: a counter with a causally ordered follow-up action.
//!
//! Run with: `cargo run --example counter`

use statekit::{Bootstrap, Effect, EffectContext, Reduce, Store, Transition};

#[derive(Clone, Debug)]
enum Action {
    Inc,
    Audit,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transition = Transition::new(|a: &Action, s: u64| match a {
        Action::Inc => s + 1,
        Action::Audit => s,
    });

    // Every Inc triggers an Audit through the same causal scope; the
    // audit's transition is guaranteed to see the incremented state.
    let effect = Effect::filtered(
        |a: &Action| matches!(a, Action::Inc),
        Effect::new(|_a: &Action, state: &u64, ctx: &EffectContext<Action>| {
            println!("effect observed pre-state {state}");
            ctx.dispatch(Action::Audit);
            Ok(())
        }),
    );

    let store = Store::new(0u64, Reduce::new(transition, effect), Bootstrap::empty());

    for _ in 0..3 {
        store.dispatch(Action::Inc).settled().await?;
        println!("state is now {}", store.snapshot());
    }

    Ok(())
}
