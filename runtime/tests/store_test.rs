//! Integration tests for the runtime Store
//!
//! Covers effect execution and feedback, state snapshots, the action stream
//! seen by services (including its order under concurrent dispatch), and
//! graceful shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use futures::StreamExt;
use proptest::prelude::*;
use std::time::Duration;
use store_service_core::{
    Action, SmallVec, StoreError, StoreHandle, create_action, create_selector, effect::Effect,
    reducer::Reducer, smallvec,
};
use store_service_runtime::{Store, StoreConfig};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    Increment,
    Incremented { value: u32 },
    IncrementLater { delay_ms: u64 },
    FanOut,
    Chain,
    Step { label: &'static str },
    Slow,
}

impl Action for TestAction {
    fn action_type(&self) -> &str {
        match self {
            Self::Increment => "[Test] Increment",
            Self::Incremented { .. } => "[Test] Incremented",
            Self::IncrementLater { .. } => "[Test] Increment later",
            Self::FanOut => "[Test] Fan out",
            Self::Chain => "[Test] Chain",
            Self::Step { .. } => "[Test] Step",
            Self::Slow => "[Test] Slow",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct TestState {
    counter: u32,
    steps: Vec<&'static str>,
}

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Increment => {
                state.counter += 1;
                let value = state.counter;
                smallvec![Effect::Future(Box::pin(async move {
                    Some(TestAction::Incremented { value })
                }))]
            },
            TestAction::IncrementLater { delay_ms } => smallvec![Effect::Delay {
                duration: Duration::from_millis(delay_ms),
                action: Box::new(TestAction::Increment),
            }],
            TestAction::FanOut => smallvec![Effect::merge(vec![
                Effect::future(async { Some(TestAction::Step { label: "left" }) }),
                Effect::future(async { Some(TestAction::Step { label: "right" }) }),
            ])],
            TestAction::Chain => smallvec![Effect::chain(vec![
                Effect::future(async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some(TestAction::Step { label: "first" })
                }),
                Effect::future(async { Some(TestAction::Step { label: "second" }) }),
            ])],
            TestAction::Step { label } => {
                state.steps.push(label);
                smallvec![Effect::None]
            },
            TestAction::Slow => smallvec![Effect::future(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                None
            })],
            TestAction::Incremented { .. } => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<TestState, TestAction, (), TestReducer> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("store_service_runtime=trace")
        .try_init();
    Store::new(TestState::default(), TestReducer, ())
}

const WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
struct Push(usize);

impl Action for Push {
    fn action_type(&self) -> &str {
        "[Test] Push"
    }
}

/// Appends every pushed value, so the state records reduce order
struct AppendReducer;

impl Reducer for AppendReducer {
    type State = Vec<usize>;
    type Action = Push;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Vec<usize>,
        Push(value): Push,
        _env: &(),
    ) -> SmallVec<[Effect<Push>; 4]> {
        state.push(value);
        smallvec![Effect::None]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_future_effect_feeds_action_back() {
    let store = store();

    let result = store
        .dispatch_and_wait_for(
            TestAction::Increment,
            |action| matches!(action, TestAction::Incremented { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Incremented { value: 1 });
    assert_eq!(store.state(|s| s.counter), 1);
}

#[tokio::test]
async fn test_wait_for_sees_the_dispatched_action_itself() {
    let store = store();

    let result = store
        .dispatch_and_wait_for(
            TestAction::Step { label: "only" },
            |action| matches!(action, TestAction::Step { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Step { label: "only" });
}

#[tokio::test]
async fn test_delay_effect_dispatches_later() {
    let store = store();

    store
        .dispatch_and_wait_for(
            TestAction::IncrementLater { delay_ms: 20 },
            |action| *action == TestAction::Incremented { value: 1 },
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.counter), 1);
}

#[tokio::test]
async fn test_wait_for_times_out() {
    let store = store();

    let result = store
        .dispatch_and_wait_for(
            TestAction::IncrementLater { delay_ms: 500 },
            |action| matches!(action, TestAction::Incremented { .. }),
            Duration::from_millis(20),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test]
async fn test_parallel_effects_all_run() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.dispatch(TestAction::FanOut).unwrap();

    let mut labels = Vec::new();
    while labels.len() < 2 {
        if let TestAction::Step { label } = rx.recv().await.unwrap() {
            labels.push(label);
        }
    }
    labels.sort_unstable();
    assert_eq!(labels, vec!["left", "right"]);
}

#[tokio::test]
async fn test_sequential_effects_keep_order() {
    let store = store();

    store
        .dispatch_and_wait_for(
            TestAction::Chain,
            |action| *action == TestAction::Step { label: "second" },
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.steps.clone()), vec!["first", "second"]);
}

#[tokio::test]
async fn test_state_stream_emits_once_per_dispatch() {
    let store = store();
    let mut states = StoreHandle::state(&store);

    assert_eq!(states.next().await.unwrap().counter, 0);

    store.dispatch(TestAction::Step { label: "a" }).unwrap();
    assert_eq!(states.next().await.unwrap().steps, vec!["a"]);

    store.dispatch(TestAction::Step { label: "b" }).unwrap();
    assert_eq!(states.next().await.unwrap().steps, vec!["a", "b"]);
}

#[tokio::test]
async fn test_state_stream_is_pending_between_dispatches() {
    let store = store();
    let mut states = tokio_test::task::spawn(StoreHandle::state(&store));

    let first = tokio_test::assert_ready!(states.poll_next()).unwrap();
    assert_eq!(first.counter, 0);
    tokio_test::assert_pending!(states.poll_next());

    store.dispatch(TestAction::Step { label: "a" }).unwrap();

    assert!(states.is_woken());
    let next = tokio_test::assert_ready!(states.poll_next()).unwrap();
    assert_eq!(next.steps, vec!["a"]);
}

#[tokio::test]
async fn test_context_binds_services_to_store() {
    let store = store();
    let context = store.context();
    let steps = context.select(create_selector(|state: &TestState| state.steps.len()));
    let observed = context.observe(["[Test] Step"]);

    let mut step_counts = steps.call(());
    let mut step_actions = observed.call();

    assert_eq!(step_counts.next().await, Some(0));

    store.dispatch(TestAction::Increment).unwrap();
    store.dispatch(TestAction::Step { label: "x" }).unwrap();

    assert_eq!(step_actions.next().await, Some(TestAction::Step { label: "x" }));
    // The Increment snapshot may be coalesced with the Step one
    let mut latest = step_counts.next().await;
    while latest == Some(0) {
        latest = step_counts.next().await;
    }
    assert_eq!(latest, Some(1));
}

#[tokio::test]
async fn test_services_do_not_keep_the_store_alive() {
    let store = store();
    let context = store.context();
    let steps = context.observe(["[Test] Step"]);
    let counter = context.select(create_selector(|state: &TestState| state.counter));
    let step = context.dispatch(create_action("[Test] Step", |label| TestAction::Step { label }));

    let mut pending = steps.call();
    store.dispatch(TestAction::Step { label: "x" }).unwrap();
    drop(store);

    // Already delivered actions drain, then the stream ends
    assert_eq!(pending.next().await, Some(TestAction::Step { label: "x" }));
    let end = tokio::time::timeout(WAIT, pending.next()).await.unwrap();
    assert_eq!(end, None);

    assert!(!context.actions().is_open());
    assert_eq!(steps.call().next().await, None);
    assert_eq!(counter.call(()).next().await, None);
    assert_eq!(step.call("y"), Err(StoreError::StoreDropped));
}

#[test]
fn test_concurrent_dispatches_broadcast_in_reduce_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 200;

    for _ in 0..20 {
        let config = StoreConfig::default().with_broadcast_capacity(THREADS * PER_THREAD);
        let store = Store::with_config(Vec::new(), AppendReducer, (), config);
        let mut receiver = store.subscribe_actions();

        std::thread::scope(|scope| {
            for thread in 0..THREADS {
                let store = &store;
                scope.spawn(move || {
                    for n in 0..PER_THREAD {
                        store.dispatch(Push(thread * PER_THREAD + n)).unwrap();
                    }
                });
            }
        });

        let mut broadcast = Vec::with_capacity(THREADS * PER_THREAD);
        while let Ok(Push(value)) = receiver.try_recv() {
            broadcast.push(value);
        }

        assert_eq!(broadcast.len(), THREADS * PER_THREAD);
        assert_eq!(broadcast, *store.snapshot());
    }
}

#[tokio::test]
async fn test_shutdown_waits_for_effects_then_times_out() {
    let store = store();

    store.dispatch(TestAction::Slow).unwrap();
    assert_eq!(store.pending_effects(), 1);

    let result = store.shutdown(Duration::from_millis(30)).await;

    assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
    assert_eq!(
        store.dispatch(TestAction::Increment),
        Err(StoreError::ShutdownInProgress)
    );
}

#[tokio::test]
async fn test_close_uses_configured_timeout() {
    let config = StoreConfig::default()
        .with_broadcast_capacity(4)
        .with_shutdown_timeout(Duration::from_millis(200));
    let store = Store::with_config(TestState::default(), TestReducer, (), config);

    store.dispatch(TestAction::IncrementLater { delay_ms: 10 }).unwrap();
    store.close().await.unwrap();

    assert!(store.is_shutting_down());
    assert_eq!(store.pending_effects(), 0);
    // The delayed Increment was rejected by the closing store
    assert_eq!(store.state(|s| s.counter), 0);
}

proptest! {
    #[test]
    fn prop_every_dispatch_is_reduced_and_broadcast(count in 0usize..12) {
        let store = Store::new(TestState::default(), TestReducer, ());
        let mut rx = store.subscribe_actions();

        for index in 0..count {
            let label = if index % 2 == 0 { "even" } else { "odd" };
            store.dispatch(TestAction::Step { label }).unwrap();
        }

        prop_assert_eq!(store.state(|s| s.steps.len()), count);
        for _ in 0..count {
            prop_assert!(
                matches!(rx.try_recv(), Ok(TestAction::Step { .. })),
                "expected a broadcast Step action"
            );
        }
        prop_assert!(rx.try_recv().is_err());
    }
}
