//! End-to-end tests for bootstrap delivery policies and source
//! isolation, on a paused clock where timing matters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use statekit::hooks::HookRegistry;
use statekit::{
    ActionEmitter, Bootstrap, DeliveryPolicy, EffectError, ErrorHook, Reduce, SourceFn, Store,
    StoreConfig, StreamSource, Transition,
};

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Tick,
}

fn counting_reduce() -> Reduce<Action, u64> {
    Reduce::from_transition(Transition::new(|_: &Action, s: u64| s + 1))
}

/// Source that bumps `starts` per run and ticks forever until
/// cancelled.
fn ticker(starts: Arc<AtomicUsize>) -> Bootstrap<Action> {
    let source = SourceFn::arc(
        "ticker",
        move |emitter: ActionEmitter<Action>, token: CancellationToken| {
            let starts = starts.clone();
            async move {
                starts.fetch_add(1, Ordering::SeqCst);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(Duration::from_millis(10)) => {
                            emitter.dispatch(Action::Tick);
                        }
                    }
                }
            }
        },
    );
    Bootstrap::source(source, DeliveryPolicy::WhileSubscribed {
        timeout: Duration::from_millis(100),
    })
}

#[derive(Default)]
struct CountingHook(AtomicUsize);

impl ErrorHook for CountingHook {
    fn on_error(&self, _err: &EffectError) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[tokio::test(start_paused = true)]
async fn eager_source_runs_without_subscribers() {
    let finite = SourceFn::arc(
        "finite",
        |emitter: ActionEmitter<Action>, _token: CancellationToken| async move {
            for _ in 0..3 {
                emitter.dispatch(Action::Tick);
            }
            Ok(())
        },
    );
    let store = Store::new(
        0u64,
        counting_reduce(),
        Bootstrap::source(finite, DeliveryPolicy::Eager),
    );
    assert_eq!(store.source_tasks(), 1);

    let mut state = store.state();
    state.wait_for(|s| *s == 3).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn lazy_source_waits_for_first_subscriber_then_never_stops() {
    let starts = Arc::new(AtomicUsize::new(0));
    let source = {
        let starts = starts.clone();
        SourceFn::arc(
            "lazy",
            move |emitter: ActionEmitter<Action>, token: CancellationToken| {
                let starts = starts.clone();
                async move {
                    starts.fetch_add(1, Ordering::SeqCst);
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(Duration::from_millis(10)) => {
                                emitter.dispatch(Action::Tick);
                            }
                        }
                    }
                }
            },
        )
    };
    let store = Store::new(
        0u64,
        counting_reduce(),
        Bootstrap::source(source, DeliveryPolicy::Lazy),
    );

    // No subscriber yet: the source must not start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 0);
    assert_eq!(store.snapshot(), 0);

    let state = store.state();
    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert!(store.snapshot() > 0);

    // Lazy is permanent: dropping the subscriber does not stop it.
    drop(state);
    let before = store.snapshot();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.snapshot() > before);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn while_subscribed_survives_quick_resubscribe() {
    let starts = Arc::new(AtomicUsize::new(0));
    let store = Store::new(0u64, counting_reduce(), ticker(starts.clone()));

    let state = store.state();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    // 1 → 0 → 1 within the 100ms grace window: same task keeps running.
    drop(state);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = store.state();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    drop(state);
}

#[tokio::test(start_paused = true)]
async fn while_subscribed_stops_after_grace_and_restarts_fresh() {
    let starts = Arc::new(AtomicUsize::new(0));
    let store = Store::new(0u64, counting_reduce(), ticker(starts.clone()));

    let state = store.state();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    // 1 → 0 held past the 100ms grace: the task stops...
    drop(state);
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stopped_at = store.snapshot();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.snapshot(), stopped_at);
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    // ...and a later 0 → 1 starts a fresh one.
    let _state = store.state();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn stream_source_replays_every_item_in_order() {
    let source = StreamSource::arc("replay", || {
        futures::stream::iter(vec![Action::Tick, Action::Tick, Action::Tick, Action::Tick])
    });
    let store = Store::new(
        0u64,
        counting_reduce(),
        Bootstrap::source(source, DeliveryPolicy::Eager),
    );

    let mut state = store.state();
    state.wait_for(|s| *s == 4).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn composite_sources_are_fetched_independently() {
    let one_shot = |n: u64| {
        SourceFn::arc(
            "one-shot",
            move |emitter: ActionEmitter<Action>, _token: CancellationToken| async move {
                for _ in 0..n {
                    emitter.dispatch(Action::Tick);
                }
                Ok(())
            },
        )
    };
    let bootstrap = Bootstrap::source(one_shot(2), DeliveryPolicy::Eager)
        .merge(&Bootstrap::source(one_shot(3), DeliveryPolicy::Eager));

    let store = Store::new(0u64, counting_reduce(), bootstrap);
    assert_eq!(store.source_tasks(), 2);

    let mut state = store.state();
    state.wait_for(|s| *s == 5).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_source_is_isolated_from_siblings() {
    let registry = Arc::new(HookRegistry::new());
    let hook = Arc::new(CountingHook::default());
    registry.add(hook.clone());

    let failing = SourceFn::arc(
        "failing",
        |_emitter: ActionEmitter<Action>, _token: CancellationToken| async {
            Err(EffectError::fail("stream broke"))
        },
    );
    let healthy = SourceFn::arc(
        "healthy",
        |emitter: ActionEmitter<Action>, _token: CancellationToken| async move {
            emitter.dispatch(Action::Tick);
            Ok(())
        },
    );
    let bootstrap = Bootstrap::source(failing, DeliveryPolicy::Eager)
        .merge(&Bootstrap::source(healthy, DeliveryPolicy::Eager));

    let store: Store<Action, u64> = Store::builder(0)
        .with_reduce(counting_reduce())
        .with_bootstrap(bootstrap)
        .with_config(StoreConfig {
            hooks: Some(registry.clone()),
            ..StoreConfig::default()
        })
        .build();

    // The healthy sibling still delivered, the failure was reported,
    // and the store keeps dispatching.
    let mut state = store.state();
    state.wait_for(|s| *s >= 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(hook.0.load(Ordering::SeqCst), 1);

    store.dispatch(Action::Tick).settled().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn store_close_stops_sources() {
    let store = Store::new(
        0u64,
        counting_reduce(),
        Bootstrap::source(
            SourceFn::arc(
                "forever",
                move |emitter: ActionEmitter<Action>, token: CancellationToken| async move {
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(Duration::from_millis(10)) => {
                                emitter.dispatch(Action::Tick);
                            }
                        }
                    }
                },
            ),
            DeliveryPolicy::Eager,
        ),
    );

    tokio::time::sleep(Duration::from_millis(35)).await;
    assert!(store.snapshot() > 0);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
}
