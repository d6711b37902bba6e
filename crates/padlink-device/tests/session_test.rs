// Session lifecycle tests against a real loopback listener.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use padlink_device::{DeviceHandle, LedValue, SessionConfig, SessionEvent};

fn test_config(port: u16) -> SessionConfig {
    let mut config = SessionConfig::new("127.0.0.1", port);
    config.connect_timeout = Duration::from_secs(2);
    config.backoff_base = Duration::from_millis(50);
    config.backoff_max = Duration::from_millis(200);
    config
}

async fn recv_event(
    rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

#[tokio::test]
async fn connects_and_delivers_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(test_config(port), cancel.clone());
    let mut rx = handle.subscribe();

    let (mut server, _) = listener.accept().await.expect("accept");

    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    server
        .write_all(br#"{"led":"255000000","events":[{"label":"Key 2","state":"1"}]}"#)
        .await
        .expect("server write");

    match recv_event(&mut rx).await {
        SessionEvent::Frame(frame) => {
            assert_eq!(frame.led, Some(LedValue::new(255, 0, 0)));
            assert_eq!(frame.edges.len(), 1);
            assert_eq!(frame.edges[0].index, 1);
            assert!(frame.edges[0].pressed);
        }
        other => panic!("expected frame, got {other:?}"),
    }

    handle.shutdown();
}

#[tokio::test]
async fn writes_reach_the_device() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(test_config(port), cancel.clone());
    let mut rx = handle.subscribe();

    let (mut server, _) = listener.accept().await.expect("accept");
    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    handle.send_command("\rled=000255000\r");

    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), server.read(&mut buf))
        .await
        .expect("timed out")
        .expect("server read");
    assert_eq!(&buf[..n], b"\rled=000255000\r");

    handle.shutdown();
}

#[tokio::test]
async fn send_while_disconnected_is_dropped() {
    // Nothing listening on this socket yet; grab a port and close it.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(test_config(port), cancel.clone());

    // Best-effort contract: no error, no panic, nothing queued.
    handle.send_command("\rled=?\r");
    assert!(!handle.is_connected());

    handle.shutdown();
}

#[tokio::test]
async fn keepalive_probes_and_silent_link_is_torn_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let mut config = test_config(port);
    config.keepalive_interval = Duration::from_millis(100);
    config.health_check_interval = Duration::from_millis(100);
    config.freshness_window = Duration::from_millis(400);
    // Keep the hard idle deadline out of the picture; staleness must
    // come from the watchdog.
    config.idle_timeout = Duration::from_secs(30);

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(config, cancel.clone());
    let mut rx = handle.subscribe();

    let (mut server, _) = listener.accept().await.expect("accept");
    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    // The LED query probe goes out unprompted.
    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), server.read(&mut buf))
        .await
        .expect("timed out waiting for keep-alive probe")
        .expect("server read");
    assert!(buf[..n].starts_with(b"\rled=?\r"));

    // The device never answers; the watchdog declares the link dead.
    loop {
        match recv_event(&mut rx).await {
            SessionEvent::Disconnected => break,
            _ => continue,
        }
    }

    handle.shutdown();
}

#[tokio::test]
async fn reconnects_after_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(test_config(port), cancel.clone());
    let mut rx = handle.subscribe();

    let (server, _) = listener.accept().await.expect("accept");
    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    drop(server);

    assert!(matches!(
        recv_event(&mut rx).await,
        SessionEvent::Disconnected
    ));

    // A zero-based backoff (counter was reset on establish) precedes
    // the next attempt.
    match recv_event(&mut rx).await {
        SessionEvent::Reconnecting { attempt, .. } => assert_eq!(attempt, 0),
        other => panic!("expected reconnecting, got {other:?}"),
    }

    let (_server, _) = listener.accept().await.expect("second accept");
    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    handle.shutdown();
}

#[tokio::test]
async fn shutdown_is_terminal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let cancel = CancellationToken::new();
    let handle = DeviceHandle::connect(test_config(port), cancel.clone());
    let mut rx = handle.subscribe();

    let (_server, _) = listener.accept().await.expect("accept");
    assert!(matches!(recv_event(&mut rx).await, SessionEvent::Connected));

    handle.shutdown();
    handle.shutdown(); // idempotent

    // The loop tears down; no reconnect is ever scheduled.
    loop {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Ok(SessionEvent::Reconnecting { .. })) => {
                panic!("reconnect scheduled after shutdown")
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }
    assert!(!handle.is_connected());
}
