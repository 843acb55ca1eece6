//! Lifecycle behaviour of a single supervisor against real child processes.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{
    CRASHING_SERVER, DEAF_SERVER, FakeServer, INTERACTIVE_SERVER, STDIN_CLOSING_SERVER, settle,
};
use gamesrv_core::{
    LaunchCommand, LifecycleState, Operation, OutputStream, ServerSpec, ServerStatus,
    StopOutcome, StopStrategy, SupervisorError,
};
use gamesrv_runtime::ProcessSupervisor;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn start_then_stop_with_console_command() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("mc"));

    assert_ok!(supervisor.start().await);
    assert_eq!(supervisor.status(), ServerStatus::Running);
    assert_eq!(supervisor.state(), LifecycleState::Running);

    let outcome = supervisor.stop().await.unwrap();
    assert_eq!(outcome, StopOutcome::Graceful);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
    assert_eq!(supervisor.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn start_while_running_keeps_existing_process() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("mc"));

    let pid = supervisor.start().await.unwrap();
    let err = supervisor.start().await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyActive { .. }));
    assert_eq!(supervisor.snapshot().pid, Some(pid));
    assert_eq!(supervisor.status(), ServerStatus::Running);

    assert_ok!(supervisor.kill().await);
}

#[tokio::test]
async fn stop_when_stopped_reports_not_running() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("mc"));

    let err = supervisor.stop().await.unwrap_err();
    assert!(matches!(err, SupervisorError::NotRunning { id } if id == "mc"));
    assert_eq!(supervisor.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn kill_is_idempotent() {
    let fake = FakeServer::new(DEAF_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("deaf"));

    assert_ok!(supervisor.start().await);
    assert_ok!(supervisor.kill().await);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
    assert_ok!(supervisor.kill().await);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn ignored_stop_command_escalates_after_timeout() {
    let fake = FakeServer::new(DEAF_SERVER);
    let timeout = Duration::from_millis(800);
    let supervisor = ProcessSupervisor::standalone(fake.spec("deaf").with_stop_timeout(timeout));

    assert_ok!(supervisor.start().await);
    let began = Instant::now();
    let outcome = supervisor.stop().await.unwrap();
    let elapsed = began.elapsed();

    assert_eq!(outcome, StopOutcome::Escalated);
    assert!(elapsed >= timeout, "stopped too early: {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(2), "stopped too late: {elapsed:?}");
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn signal_strategy_interrupts_process_group() {
    let spec = ServerSpec::new(
        "sleepy",
        LaunchCommand::new("sleep").with_args(["30"]),
        StopStrategy::Signal,
    )
    .with_stop_wait(Duration::ZERO)
    .with_stop_timeout(Duration::from_secs(5));
    let supervisor = ProcessSupervisor::standalone(spec);

    assert_ok!(supervisor.start().await);
    let outcome = supervisor.stop().await.unwrap();
    assert_eq!(outcome, StopOutcome::Graceful);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn pre_stop_wait_is_honoured() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let wait = Duration::from_millis(400);
    let supervisor = ProcessSupervisor::standalone(fake.spec("mc").with_stop_wait(wait));

    assert_ok!(supervisor.start().await);
    let began = Instant::now();
    assert_ok!(supervisor.stop().await);
    assert!(began.elapsed() >= wait);
}

#[tokio::test]
async fn concurrent_stop_joins_in_flight_shutdown() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let supervisor = Arc::new(ProcessSupervisor::standalone(
        fake.spec("mc").with_stop_wait(Duration::from_millis(500)),
    ));
    assert_ok!(supervisor.start().await);

    let first = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.stop().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(supervisor.state(), LifecycleState::Stopping);
    // Still owns a live process while stopping
    assert_eq!(supervisor.status(), ServerStatus::Running);

    let second = supervisor.stop().await.unwrap();
    assert_eq!(second, StopOutcome::Joined);
    assert_eq!(first.await.unwrap().unwrap(), StopOutcome::Graceful);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn simultaneous_stops_share_one_shutdown() {
    let fake = FakeServer::new(INTERACTIVE_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("mc"));
    assert_ok!(supervisor.start().await);

    let (a, b) = tokio::join!(supervisor.stop(), supervisor.stop());
    let outcomes = [a.unwrap(), b.unwrap()];
    assert!(outcomes.contains(&StopOutcome::Graceful), "{outcomes:?}");
    assert!(outcomes.contains(&StopOutcome::Joined), "{outcomes:?}");
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn stop_queued_behind_another_stop_joins_it() {
    let fake = FakeServer::new(DEAF_SERVER);
    let supervisor = Arc::new(ProcessSupervisor::standalone(
        fake.spec("deaf")
            .with_command_timeout(Duration::from_millis(800))
            .with_stop_timeout(Duration::from_millis(500)),
    ));
    assert_ok!(supervisor.start().await);

    // Holds the supervisor lock while both stops read the state as Running
    let command = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.execute_command("list").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let spawn_stop = || {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move { supervisor.stop().await })
    };
    let first = spawn_stop();
    let second = spawn_stop();
    assert_eq!(supervisor.state(), LifecycleState::Running);

    let outcomes = [first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];
    assert!(outcomes.contains(&StopOutcome::Escalated), "{outcomes:?}");
    assert!(outcomes.contains(&StopOutcome::Joined), "{outcomes:?}");
    assert!(matches!(
        command.await.unwrap(),
        Err(SupervisorError::CommandTimeout { .. })
    ));
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn failed_stop_delivery_discards_process() {
    let fake = FakeServer::new(STDIN_CLOSING_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("deaf"));
    let mut state = supervisor.subscribe_state();
    assert_ok!(supervisor.start().await);
    settle().await;

    let err = supervisor.stop().await.unwrap_err();
    assert!(
        matches!(err, SupervisorError::ProcessError { operation: Operation::Stop, ref id, .. } if id == "deaf"),
        "{err:?}"
    );
    assert_eq!(*state.borrow_and_update(), LifecycleState::Stopped);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
    assert!(supervisor.snapshot().pid.is_none());
}

#[tokio::test]
async fn crash_is_reconciled_by_status_probe() {
    let fake = FakeServer::new(CRASHING_SERVER);
    let supervisor = ProcessSupervisor::standalone(fake.spec("crashy"));
    let mut state = supervisor.subscribe_state();

    assert_ok!(supervisor.start().await);
    settle().await;

    assert_eq!(supervisor.status(), ServerStatus::Stopped);
    assert_eq!(*state.borrow_and_update(), LifecycleState::Stopped);
    assert!(supervisor.snapshot().pid.is_none());

    // Stderr is captured alongside stdout
    let output = supervisor.recent_output(10);
    assert!(
        output
            .iter()
            .any(|l| l.stream == OutputStream::Stderr && l.text.contains("world corrupted"))
    );

    // A crashed server can be started again
    assert_ok!(supervisor.start().await);
    assert_ok!(supervisor.kill().await);
}

#[tokio::test]
async fn missing_executable_is_a_launch_failure() {
    let spec = ServerSpec::new(
        "ghost",
        LaunchCommand::new("/nonexistent/gamesrv/run.sh"),
        StopStrategy::Signal,
    );
    let supervisor = ProcessSupervisor::standalone(spec);

    let err = assert_err!(supervisor.start().await);
    assert!(matches!(err, SupervisorError::LaunchFailure { .. }));
    assert_eq!(supervisor.state(), LifecycleState::Stopped);
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn relative_launch_script_runs_from_working_dir() {
    use std::os::unix::fs::PermissionsExt;

    let fake = FakeServer::new(&format!("#!/bin/sh\n{INTERACTIVE_SERVER}"));
    std::fs::set_permissions(&fake.script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");

    let spec = ServerSpec::new(
        "mc",
        LaunchCommand::new("./run.sh"),
        StopStrategy::Command {
            command: "stop".into(),
        },
    )
    .with_working_dir(fake.dir.path())
    .with_stop_wait(Duration::ZERO);
    let supervisor = ProcessSupervisor::standalone(spec);

    assert_ok!(supervisor.start().await);
    settle().await;
    assert!(
        supervisor
            .recent_output(50)
            .iter()
            .any(|l| l.text.starts_with("Done"))
    );
    assert_eq!(supervisor.stop().await.unwrap(), StopOutcome::Graceful);
}
