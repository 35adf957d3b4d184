use rattendance::core::spawn_monitor;
use rattendance::remote::{Connectivity, SyncMode};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::FakeGateway;

#[tokio::test(start_paused = true)]
async fn test_monitor_polls_until_shut_down() {
    let fake = Arc::new(FakeGateway::online());
    let handle = spawn_monitor(fake.clone(), Duration::from_secs(60), Duration::from_secs(3));
    assert!(handle.latest().is_none());

    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();
    assert_eq!(handle.latest().unwrap().state, Connectivity::Reachable);
    assert_eq!(fake.probe_count(), 1);

    // Paused clock: the runtime jumps to the next tick.
    rx.changed().await.unwrap();
    assert_eq!(fake.probe_count(), 2);

    handle.shutdown().await;
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(fake.probe_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_probe_is_reported_as_timed_out() {
    let fake = Arc::new(FakeGateway {
        probe_delay: Some(Duration::from_secs(10)),
        ..FakeGateway::online()
    });
    let handle = spawn_monitor(fake.clone(), Duration::from_secs(60), Duration::from_secs(3));

    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();
    let status = handle.latest().unwrap();
    assert_eq!(status.state, Connectivity::TimedOut);
    assert_eq!(status.mode, SyncMode::LocalOnly);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_stops_polling() {
    let fake = Arc::new(FakeGateway::offline());
    let handle = spawn_monitor(fake.clone(), Duration::from_secs(60), Duration::from_secs(3));

    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();
    assert_eq!(handle.latest().unwrap().state, Connectivity::Unreachable);
    drop(handle);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(fake.probe_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_api_monitor_uses_configured_gateway() {
    let (api, fake) = common::api_with(FakeGateway::unconfigured());
    let handle = api.start_monitor();

    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();
    assert_eq!(handle.latest().unwrap().state, Connectivity::NotConfigured);
    assert_eq!(fake.probe_count(), 1);
    handle.shutdown().await;
}
