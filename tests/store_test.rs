//! End-to-end tests for dispatch semantics: composition, filtering,
//! effect fan-out, causal ordering, and error aggregation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use statekit::hooks::HookRegistry;
use statekit::{
    Bootstrap, DispatchError, Effect, EffectContext, EffectError, ErrorHook, Reduce, Store,
    StoreConfig, Transition,
};

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Inc,
    IncAgain,
    Mul(u64),
    Boom,
    Slow,
}

fn store_with(reduce: Reduce<Action, u64>) -> Store<Action, u64> {
    Store::new(0, reduce, Bootstrap::empty())
}

#[derive(Default)]
struct Recording(Mutex<Vec<&'static str>>);

impl Recording {
    fn push(&self, tag: &'static str) {
        self.0.lock().unwrap().push(tag);
    }

    fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
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

#[tokio::test]
async fn composing_with_empty_changes_nothing_observable() {
    let recorded = Arc::new(Recording::default());
    let make_reduce = |recorded: Arc<Recording>| {
        Reduce::new(
            Transition::new(|_: &Action, s: u64| s + 1),
            Effect::new(move |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
                recorded.push("effect");
                Ok(())
            }),
        )
    };

    let plain = store_with(make_reduce(recorded.clone()));
    plain.dispatch(Action::Inc).settled().await.unwrap();
    let plain_state = plain.snapshot();
    let plain_effects = recorded.take();

    let left = store_with(Reduce::empty().compose(&make_reduce(recorded.clone())));
    left.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(left.snapshot(), plain_state);
    assert_eq!(recorded.take(), plain_effects);

    let right = store_with(make_reduce(recorded.clone()).compose(&Reduce::empty()));
    right.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(right.snapshot(), plain_state);
    assert_eq!(recorded.take(), plain_effects);
}

#[tokio::test]
async fn composed_transitions_fold_left_to_right() {
    let plus_one = Reduce::from_transition(Transition::new(|_: &Action, s: u64| s + 1));
    let times_ten = Reduce::from_transition(Transition::new(|_: &Action, s: u64| s * 10));

    let store = store_with(plus_one.compose(&times_ten));
    store.dispatch(Action::Inc).settled().await.unwrap();
    // t2(a, t1(a, 0)) = (0 + 1) * 10
    assert_eq!(store.snapshot(), 10);
}

#[tokio::test]
async fn sibling_filters_never_cross_fire() {
    let recorded = Arc::new(Recording::default());
    let on_inc = {
        let recorded = recorded.clone();
        Effect::filtered(
            |a: &Action| matches!(a, Action::Inc),
            Effect::new(move |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
                recorded.push("inc");
                Ok(())
            }),
        )
    };
    let on_mul = {
        let recorded = recorded.clone();
        Effect::filtered(
            |a: &Action| matches!(a, Action::Mul(_)),
            Effect::new(move |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
                recorded.push("mul");
                Ok(())
            }),
        )
    };

    let store = store_with(Reduce::from_effect(on_inc.merge(&on_mul)));
    store.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(recorded.take(), vec!["inc"]);

    store.dispatch(Action::Mul(3)).settled().await.unwrap();
    assert_eq!(recorded.take(), vec!["mul"]);
}

#[tokio::test]
async fn matching_filters_are_non_exclusive() {
    let hits = Arc::new(AtomicUsize::new(0));
    let branch = |hits: Arc<AtomicUsize>| {
        Effect::filtered(
            |a: &Action| matches!(a, Action::Inc),
            Effect::new(move |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
    };

    let store = store_with(Reduce::from_effect(
        branch(hits.clone()).merge(&branch(hits.clone())),
    ));
    store.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn composite_suspend_siblings_start_concurrently() {
    // Each sibling waits on the barrier before finishing; the dispatch
    // only settles if both were started without waiting for the other
    // to complete.
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let sibling = |barrier: Arc<tokio::sync::Barrier>| {
        Effect::suspend(move |_a: Action, _s: u64, _ctx: EffectContext<Action>| {
            let barrier = barrier.clone();
            async move {
                barrier.wait().await;
                Ok(())
            }
        })
    };

    let store = store_with(Reduce::from_effect(
        sibling(barrier.clone()).merge(&sibling(barrier.clone())),
    ));
    let settled = store.dispatch(Action::Inc).settled();
    tokio::time::timeout(Duration::from_secs(5), settled)
        .await
        .expect("siblings did not run concurrently")
        .unwrap();
}

#[tokio::test]
async fn child_dispatch_observes_parent_transition() {
    let transition = Transition::new(|a: &Action, s: u64| match a {
        Action::Inc => s + 1,
        Action::IncAgain => s * 10,
        _ => s,
    });
    let effect = Effect::filtered(
        |a: &Action| matches!(a, Action::Inc),
        Effect::new(|_a: &Action, _s: &u64, ctx: &EffectContext<Action>| {
            ctx.dispatch(Action::IncAgain);
            Ok(())
        }),
    );

    let store = store_with(Reduce::new(transition, effect));
    store.dispatch(Action::Inc).settled().await.unwrap();
    // Child saw 1 (parent committed), so 1 * 10, not 0 * 10 + anything.
    assert_eq!(store.snapshot(), 10);
}

#[tokio::test]
async fn child_dispatch_from_suspend_effect_is_causal() {
    let transition = Transition::new(|a: &Action, s: u64| match a {
        Action::Inc => s + 1,
        Action::IncAgain => s * 10,
        _ => s,
    });
    let effect = Effect::filtered(
        |a: &Action| matches!(a, Action::Inc),
        Effect::suspend(|_a: Action, _s: u64, ctx: EffectContext<Action>| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            ctx.dispatch(Action::IncAgain);
            Ok(())
        }),
    );

    let store = store_with(Reduce::new(transition, effect));
    store.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(store.snapshot(), 10);
}

#[tokio::test]
async fn effects_observe_pre_transition_state() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let transition = Transition::new(|_: &Action, s: u64| s + 1);
    let effect = {
        let seen = seen.clone();
        Effect::new(move |_a: &Action, s: &u64, _ctx: &EffectContext<Action>| {
            seen.lock().unwrap().push(*s);
            Ok(())
        })
    };

    let store = store_with(Reduce::new(transition, effect));
    store.dispatch(Action::Inc).settled().await.unwrap();
    store.dispatch(Action::Inc).settled().await.unwrap();
    // Each effect saw the state its action observed, before that
    // action's own increment.
    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
}

#[tokio::test]
async fn failing_siblings_are_all_aggregated() {
    let fail_a = Effect::new(|_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
        Err(EffectError::fail("first"))
    });
    let fail_b = Effect::suspend(|_a: Action, _s: u64, _ctx: EffectContext<Action>| async {
        Err(EffectError::fail("second"))
    });

    let store = store_with(Reduce::from_effect(fail_a.merge(&fail_b)));
    let err = store
        .dispatch(Action::Boom)
        .settled()
        .await
        .expect_err("both siblings failed");
    match err {
        DispatchError::Aggregate { errors } => assert_eq!(errors.len(), 2),
        other => panic!("unexpected dispatch error: {other}"),
    }
}

#[tokio::test]
async fn panicking_effect_is_collected_not_propagated() {
    let effect = Effect::new(|_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
        panic!("effect blew up")
    });
    let store = store_with(Reduce::new(
        Transition::new(|_: &Action, s: u64| s + 1),
        effect,
    ));

    let err = store.dispatch(Action::Boom).settled().await.expect_err("panicked");
    assert!(matches!(
        err.first(),
        Some(EffectError::Panic { info }) if info.contains("effect blew up")
    ));
    // The transition still committed.
    assert_eq!(store.snapshot(), 1);
}

#[tokio::test]
async fn panicking_transition_skips_effects_and_keeps_state() {
    let ran = Arc::new(AtomicUsize::new(0));
    let transition = Transition::new(|a: &Action, s: u64| match a {
        Action::Boom => panic!("transition blew up"),
        _ => s + 1,
    });
    let effect = {
        let ran = ran.clone();
        Effect::new(move |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };

    let store = store_with(Reduce::new(transition, effect));
    let err = store.dispatch(Action::Boom).settled().await.expect_err("panicked");
    assert!(matches!(err.first(), Some(EffectError::Panic { .. })));
    assert_eq!(store.snapshot(), 0);
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    // The store keeps working afterwards.
    store.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(store.snapshot(), 1);
}

#[tokio::test]
async fn structured_handler_consumes_failures_hooks_still_notified() {
    let registry = Arc::new(HookRegistry::new());
    let registry_hook = Arc::new(CountingHook::default());
    registry.add(registry_hook.clone());

    let handler = Arc::new(CountingHook::default());
    let store: Store<Action, u64> = Store::builder(0)
        .with_reduce(Reduce::from_effect(Effect::new(
            |_a: &Action, _s: &u64, _ctx: &EffectContext<Action>| Err(EffectError::fail("boom")),
        )))
        .with_config(StoreConfig {
            hooks: Some(registry.clone()),
            ..StoreConfig::default()
        })
        .with_error_handler(handler.clone())
        .build();

    store.dispatch(Action::Boom).settled().await.unwrap();
    assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    assert_eq!(registry_hook.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelling_a_dispatch_spares_the_store() {
    let finished = Arc::new(AtomicUsize::new(0));
    let effect = {
        let finished = finished.clone();
        Effect::filtered(
            |a: &Action| matches!(a, Action::Slow),
            Effect::suspend(move |_a: Action, _s: u64, ctx: EffectContext<Action>| {
                let finished = finished.clone();
                async move {
                    ctx.cancelled().await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
    };
    let store = store_with(Reduce::new(
        Transition::new(|_: &Action, s: u64| s + 1),
        effect,
    ));

    let slow = store.dispatch(Action::Slow);
    slow.cancel();
    // Cancellation is graceful: the handle settles Ok.
    tokio::time::timeout(Duration::from_secs(5), slow.settled())
        .await
        .expect("cancelled dispatch settled")
        .unwrap();
    // The transition had already committed.
    assert_eq!(store.snapshot(), 1);

    // Sibling dispatches and the store are unaffected.
    store.dispatch(Action::Inc).settled().await.unwrap();
    assert_eq!(store.snapshot(), 2);
}

#[tokio::test]
async fn state_handles_count_subscribers_and_observe_changes() {
    let store = store_with(Reduce::from_transition(Transition::new(
        |_: &Action, s: u64| s + 1,
    )));
    let count = store.subscriber_count();
    assert_eq!(*count.borrow(), 0);

    let mut handle = store.state();
    let second = handle.clone();
    assert_eq!(*count.borrow(), 2);

    store.dispatch(Action::Inc).settled().await.unwrap();
    handle.changed().await.unwrap();
    assert_eq!(handle.get(), 1);

    drop(second);
    drop(handle);
    assert_eq!(*count.borrow(), 0);
}

#[tokio::test]
async fn shutdown_within_grace_succeeds() {
    let store = store_with(Reduce::from_transition(Transition::new(
        |_: &Action, s: u64| s + 1,
    )));
    store.dispatch(Action::Inc).settled().await.unwrap();
    store
        .shutdown(Duration::from_secs(1))
        .await
        .expect("nothing pending");
}
