// tests/listener_races.rs

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;

use chat_rpc_core::{
    // ---
    Category,
    Listener,
    ListenerRegistry,
    ManualClock,
    ResolveMode,
    RpcError,
    Session,
    SessionConfig,
    Update,
};

#[derive(Debug, PartialEq)]
struct Interest {
    category: u8,
    id: u32,
}

impl Listener for Interest {
    type Category = u8;

    fn category(&self) -> &u8 {
        &self.category
    }
}

#[test]
fn resolver_and_canceller_never_double_count() {
    // ---
    common::init_logging();

    // ---
    // Arrange
    // ---
    const N: u32 = 2_000;
    let registry = Arc::new(ListenerRegistry::new());
    for id in 0..N {
        registry.register(1u8, Interest { category: 1, id });
    }

    // ---
    // Act
    // ---
    // One thread plays the dispatcher, the other cancels every listener.
    let resolver = {
        let registry = registry.clone();
        thread::spawn(move || {
            let mut resolved = 0u32;
            while registry.resolve_first(&1u8, |_| true).is_some() {
                resolved += 1;
            }
            resolved
        })
    };
    let canceller = {
        let registry = registry.clone();
        thread::spawn(move || {
            (0..N)
                .filter(|&id| registry.remove(&Interest { category: 1, id }))
                .count() as u32
        })
    };

    let resolved = resolver.join().expect("resolver panicked");
    let cancelled = canceller.join().expect("canceller panicked");

    // ---
    // Assert
    // ---
    assert_eq!(resolved + cancelled, N);
    assert!(registry.is_empty());
}

#[test]
fn double_remove_and_unknown_category_are_noops() {
    // ---
    let registry = ListenerRegistry::new();
    registry.register(1u8, Interest { category: 1, id: 1 });
    registry.register(1u8, Interest { category: 1, id: 2 });

    assert!(registry.remove(&Interest { category: 1, id: 1 }));
    assert!(!registry.remove(&Interest { category: 1, id: 1 }));
    assert!(!registry.remove(&Interest { category: 9, id: 2 }));

    let remaining = registry.with_listeners(&1u8, |queue| {
        queue.iter().map(|l| l.id).collect::<Vec<_>>()
    });
    assert_eq!(remaining, vec![2]);
}

fn session(mode: ResolveMode) -> Session {
    // ---
    let config = SessionConfig::default()
        .with_resolve_mode(mode)
        .with_listener_timeout(Duration::from_secs(5));
    Session::with_clock(config, Arc::new(ManualClock::new(1_000))).expect("valid config")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_each_receive_one_update() {
    // ---
    common::init_logging();

    // ---
    // Arrange
    // ---
    let session = session(ResolveMode::First);
    let mut tasks = Vec::new();

    for _ in 0..50 {
        let pending = session.listen("photo");
        tasks.push(tokio::spawn(pending.wait()));
    }

    // ---
    // Act
    // ---
    let mut delivered = 0;
    for i in 0..50u32 {
        delivered += session.dispatch(Update::new("photo", Bytes::from(i.to_string())));
    }

    // ---
    // Assert
    // ---
    assert_eq!(delivered, 50);

    let mut payloads = Vec::new();
    for task in tasks {
        let update = timeout(Duration::from_secs(1), task)
            .await
            .expect("timed out waiting for waiter")
            .expect("waiter task panicked")
            .expect("waiter failed");
        payloads.push(update.payload);
    }

    // FIFO: the n-th registered waiter got the n-th update.
    let expected: Vec<Bytes> = (0..50u32).map(|i| Bytes::from(i.to_string())).collect();
    assert_eq!(payloads, expected);
    assert_eq!(session.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timeout_racing_dispatch_is_safe() {
    // ---
    let session = session(ResolveMode::All);

    for round in 0..200u32 {
        let pending = session.listen("photo");
        let ticket = pending.ticket().clone();

        let dispatcher = {
            let session = session.clone();
            tokio::spawn(async move {
                session.dispatch(Update::new("photo", Bytes::from(round.to_string())))
            })
        };

        match pending.wait_timeout(Duration::from_micros(50)).await {
            Ok(update) => assert_eq!(update.payload, Bytes::from(round.to_string())),
            Err(RpcError::Timeout) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }

        dispatcher.await.expect("dispatcher panicked");

        // Whichever side lost the race, the waiter is gone and
        // cancelling again is harmless.
        assert!(!session.cancel(&ticket));
        assert_eq!(session.pending_in(&Category::from("photo")), 0);
    }
}

#[tokio::test]
async fn photo_scenario_through_session() {
    // ---
    let session = session(ResolveMode::First);

    let a = session.listen("photo");
    let b = session.listen("photo");
    let a_ticket = a.ticket().clone();

    assert!(a.cancel());
    assert_eq!(session.pending_in(&Category::from("photo")), 1);
    assert!(!session.cancel(&a_ticket));

    assert!(b.cancel());
    assert_eq!(session.pending_in(&Category::from("photo")), 0);
    assert_eq!(session.dispatch(Update::new("photo", Bytes::new())), 0);
}
