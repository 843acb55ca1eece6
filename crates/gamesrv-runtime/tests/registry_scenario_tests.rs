//! End-to-end scenarios through the `ServerControl` port.

mod common;

use std::time::{Duration, Instant};

use common::{CRASHING_SERVER, FakeServer, INTERACTIVE_SERVER, settle};
use gamesrv_core::{
    LifecycleState, ServerControl, ServerStatus, StopOutcome, StopStrategy, SupervisorError,
};
use gamesrv_runtime::SupervisorRegistry;
use tokio_test::assert_ok;

#[tokio::test]
async fn minecraft_style_session() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let spec = fake
        .spec("mc")
        .with_stop_wait(Duration::from_secs(5))
        .with_stop_timeout(Duration::from_secs(15));
    assert_eq!(
        spec.stop,
        StopStrategy::Command {
            command: "stop".into()
        }
    );
    let registry = SupervisorRegistry::new([spec]).unwrap();

    assert_ok!(registry.start("mc").await);
    assert_eq!(registry.status("mc").await.unwrap(), ServerStatus::Running);

    let players = registry.execute_command("mc", "list").await.unwrap();
    let players: Vec<&str> = players
        .lines()
        .filter(|l| !l.starts_with("[noise]"))
        .collect();
    assert_eq!(
        players,
        ["There are 2 of a max of 20 players online:", "alice, bob"]
    );

    let began = Instant::now();
    assert_eq!(registry.stop("mc").await.unwrap(), StopOutcome::Graceful);
    assert!(began.elapsed() <= Duration::from_secs(20));
    assert_eq!(registry.status("mc").await.unwrap(), ServerStatus::Stopped);
}

#[tokio::test]
async fn unknown_server_touches_nothing() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let registry = SupervisorRegistry::new([fake.spec("mc")]).unwrap();
    let mut events = registry.subscribe();

    let err = registry.stop("xyz").await.unwrap_err();
    assert!(matches!(err, SupervisorError::UnknownServer { id } if id == "xyz"));
    assert!(matches!(
        registry.execute_command("xyz", "list").await,
        Err(SupervisorError::UnknownServer { .. })
    ));
    assert!(registry.spec("xyz").is_err());

    assert_eq!(registry.status("mc").await.unwrap(), ServerStatus::Stopped);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn list_all_reports_every_server_in_order() {
    let mc = FakeServer::new(INTERACTIVE_SERVER);
    let ark = FakeServer::new(INTERACTIVE_SERVER);
    let registry = SupervisorRegistry::new([mc.spec("mc"), ark.spec("ark")]).unwrap();

    let pid = registry.start("ark").await.unwrap();
    let listing = registry.list_all().await;

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, "mc");
    assert_eq!(listing[0].status, ServerStatus::Stopped);
    assert_eq!(listing[1].id, "ark");
    assert_eq!(listing[1].status, ServerStatus::Running);
    assert_eq!(listing[1].pid, Some(pid));
    assert!(listing[1].started_at.is_some());

    registry.shutdown_all().await;
    assert_eq!(registry.status("ark").await.unwrap(), ServerStatus::Stopped);
}

#[tokio::test]
async fn lifecycle_events_are_published() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let registry = SupervisorRegistry::new([fake.spec("mc")]).unwrap();
    let mut events = registry.subscribe();

    assert_ok!(registry.start("mc").await);
    assert_ok!(registry.stop("mc").await);

    let states: Vec<LifecycleState> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.state)
        .collect();
    assert_eq!(
        states,
        [
            LifecycleState::Running,
            LifecycleState::Stopping,
            LifecycleState::Stopped
        ]
    );
}

#[tokio::test]
async fn crash_event_is_flagged_unexpected() {
    let fake = FakeServer::new(CRASHING_SERVER);
    let registry = SupervisorRegistry::new([fake.spec("crashy")]).unwrap();
    let mut events = registry.subscribe();

    assert_ok!(registry.start("crashy").await);
    settle().await;
    assert_eq!(registry.status("crashy").await.unwrap(), ServerStatus::Stopped);

    let started = events.try_recv().unwrap();
    assert_eq!(started.state, LifecycleState::Running);
    let crashed = events.try_recv().unwrap();
    assert_eq!(crashed.state, LifecycleState::Stopped);
    assert!(crashed.unexpected);

    let tail = registry.recent_output("crashy", 5).await.unwrap();
    assert!(tail.iter().any(|l| l.text == "booting"));
}

#[tokio::test]
async fn operations_on_different_servers_do_not_block_each_other() {
    let slow = FakeServer::new(INTERACTIVE_SERVER);
    let fast = FakeServer::new(INTERACTIVE_SERVER);
    let registry = SupervisorRegistry::new([
        slow.spec("slow").with_stop_wait(Duration::from_secs(2)),
        fast.spec("fast"),
    ])
    .unwrap();
    assert_ok!(registry.start("slow").await);
    assert_ok!(registry.start("fast").await);

    let stopping = registry.stop("slow");
    let other = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let began = Instant::now();
        let out = registry.execute_command("fast", "list").await;
        (began.elapsed(), out)
    };
    let (stopped, (elapsed, out)) = tokio::join!(stopping, other);

    assert_ok!(stopped);
    assert_ok!(out);
    assert!(elapsed < Duration::from_secs(1), "blocked behind other server: {elapsed:?}");
    assert_ok!(registry.kill("fast").await);
}
