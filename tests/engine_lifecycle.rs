//! Start, stop and scope-driven termination of engines.

mod common;

use std::time::Duration;

use common::{
    feed_router, settle, FakeFeedRepository, FeedChange, FeedEngine, FeedEvent, FeedIntent,
    FeedState, Scripted,
};
use mvi_engine::buffer::OverflowPolicy;
use mvi_engine::config::EngineConfig;
use mvi_engine::{Engine, EngineError, Lifecycle, Scope, SequentialPolicy};

fn unstarted(repo: std::sync::Arc<FakeFeedRepository>, config: EngineConfig) -> FeedEngine {
    Engine::builder(feed_router(repo, SequentialPolicy::Queue), FeedState::default())
        .event_mapper(common::feed_events)
        .config(config)
        .build()
}

#[tokio::test]
async fn intents_submitted_before_start_are_processed() {
    let repo = FakeFeedRepository::new(vec![Scripted::items(&[3])]);
    let engine = unstarted(repo, EngineConfig::default());
    assert_eq!(engine.lifecycle(), Lifecycle::Uninitialized);

    engine.submit(FeedIntent::Refresh).unwrap();
    assert_eq!(engine.pending_intents(), 1);

    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();
    assert_eq!(engine.lifecycle(), Lifecycle::Running);

    let done = engine
        .observe_state()
        .wait_for(|s| s.items == vec![3])
        .await
        .unwrap();
    assert!(!done.loading);
}

#[tokio::test]
async fn second_start_is_rejected() {
    let engine = unstarted(FakeFeedRepository::new(vec![]), EngineConfig::default());
    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();
    assert_eq!(
        engine.start(&scope.handle()),
        Err(EngineError::AlreadyStarted)
    );
}

#[tokio::test]
async fn stopped_engine_keeps_last_snapshot_and_rejects_intents() {
    let repo = FakeFeedRepository::new(vec![Scripted::items(&[1])]);
    let engine = unstarted(repo, EngineConfig::default());
    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();

    engine.submit(FeedIntent::Refresh).unwrap();
    engine
        .observe_state()
        .wait_for(|s| s.items == vec![1] && !s.loading)
        .await
        .unwrap();

    engine.stop();
    assert_eq!(engine.lifecycle(), Lifecycle::Terminated);
    assert_eq!(
        engine.submit(FeedIntent::Refresh),
        Err(EngineError::Terminated)
    );
    assert_eq!(engine.state().items, vec![1]);

    settle().await;
    assert_eq!(engine.observe_common_events().recv().await, None);
    assert_eq!(engine.start(&scope.handle()), Err(EngineError::Terminated));
}

#[tokio::test]
async fn engine_stopped_before_start_cannot_start() {
    let engine = unstarted(FakeFeedRepository::new(vec![]), EngineConfig::default());
    engine.stop();
    let scope = Scope::new();
    assert_eq!(engine.start(&scope.handle()), Err(EngineError::Terminated));
}

#[tokio::test]
async fn cancelling_scope_aborts_in_flight_work() {
    let repo = FakeFeedRepository::gated(vec![Scripted::items(&[5])]);
    let engine = unstarted(repo.clone(), EngineConfig::default());
    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();

    engine.submit(FeedIntent::Refresh).unwrap();
    let mut state = engine.observe_state();
    state.wait_for(|s| s.loading).await.unwrap();

    scope.cancel();
    assert_eq!(engine.lifecycle(), Lifecycle::Terminated);

    repo.release();
    settle().await;
    assert!(engine.state().loading);
    assert!(engine.state().items.is_empty());
    assert_eq!(state.revision(), 1);
}

#[tokio::test]
async fn initial_intents_run_once() {
    let repo = FakeFeedRepository::new(vec![Scripted::items(&[1]), Scripted::items(&[2])]);
    let engine = unstarted(repo.clone(), EngineConfig::default());
    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();

    assert_eq!(engine.submit_initial([FeedIntent::Refresh]), Ok(true));
    assert_eq!(engine.submit_initial([FeedIntent::Refresh]), Ok(false));

    engine
        .observe_state()
        .wait_for(|s| s.items == vec![1] && !s.loading)
        .await
        .unwrap();
    settle().await;
    assert_eq!(repo.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn spilled_intents_are_all_delivered() {
    let config = EngineConfig {
        intent_capacity: 2,
        intent_overflow: OverflowPolicy::Spill,
        ..EngineConfig::default()
    };
    let engine = unstarted(FakeFeedRepository::new(vec![]), config);
    for id in 1..=5 {
        engine.submit(FeedIntent::Like(id)).unwrap();
    }
    assert_eq!(engine.pending_intents(), 5);

    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();
    let done = engine
        .observe_state()
        .wait_for(|s| s.liked.len() == 5)
        .await
        .unwrap();
    assert_eq!(done.liked, vec![1, 2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn drop_oldest_intent_channel_keeps_newest() {
    let config = EngineConfig {
        intent_capacity: 2,
        intent_overflow: OverflowPolicy::DropOldest,
        ..EngineConfig::default()
    };
    let engine = unstarted(FakeFeedRepository::new(vec![]), config);
    for id in 1..=5 {
        engine.submit(FeedIntent::Like(id)).unwrap();
    }
    assert_eq!(engine.pending_intents(), 2);

    let scope = Scope::new();
    engine.start(&scope.handle()).unwrap();
    engine
        .observe_state()
        .wait_for(|s| s.liked.len() == 2)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.state().liked, vec![4, 5]);
}

#[tokio::test]
async fn panicking_event_mapper_skips_only_that_change() {
    let repo = FakeFeedRepository::new(vec![Scripted::items(&[2])]);
    let scope = Scope::new();
    let engine: FeedEngine =
        Engine::builder(feed_router(repo, SequentialPolicy::Queue), FeedState::default())
            .event_mapper(|change: &FeedChange| match change {
                FeedChange::Touched => panic!("unmappable change"),
                other => common::feed_events(other),
            })
            .launch(&scope.handle())
            .unwrap();

    engine.submit(FeedIntent::Touch).unwrap();
    engine.submit(FeedIntent::Refresh).unwrap();

    engine
        .observe_state()
        .wait_for(|s| s.items == vec![2] && !s.loading)
        .await
        .unwrap();
    assert_eq!(engine.lifecycle(), Lifecycle::Running);
    assert_eq!(
        engine.observe_typed_events().drain(),
        vec![FeedEvent::Loaded(vec![2])]
    );
}
