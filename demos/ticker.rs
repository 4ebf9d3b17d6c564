//! Subscriber-gated bootstrap: a ticker that only runs while the
//! state stream is observed, with a grace window for resubscribes.
//!
//! Run with: `cargo run --example ticker`

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use statekit::{
    ActionEmitter, Bootstrap, DeliveryPolicy, EffectError, Reduce, SourceFn, Store, Transition,
};

#[derive(Clone, Debug)]
enum Action {
    Tick,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ticker = SourceFn::arc(
        "ticker",
        |emitter: ActionEmitter<Action>, token: CancellationToken| async move {
            println!("ticker started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        println!("ticker stopped");
                        return Ok::<_, EffectError>(());
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        emitter.dispatch(Action::Tick);
                    }
                }
            }
        },
    );

    let store = Store::new(
        0u64,
        Reduce::from_transition(Transition::new(|_: &Action, s: u64| s + 1)),
        Bootstrap::source(
            ticker,
            DeliveryPolicy::WhileSubscribed {
                timeout: Duration::from_millis(250),
            },
        ),
    );

    // First subscription epoch.
    let state = store.state();
    tokio::time::sleep(Duration::from_millis(350)).await;
    println!("ticks while subscribed: {}", store.snapshot());

    // Drop and resubscribe within the grace window: the ticker keeps
    // running.
    drop(state);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = store.state();
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("ticks after quick resubscribe: {}", store.snapshot());

    // Leave for longer than the grace window: the ticker stops.
    drop(state);
    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("ticks after unsubscribe: {}", store.snapshot());

    store.shutdown(Duration::from_secs(1)).await?;
    Ok(())
}
