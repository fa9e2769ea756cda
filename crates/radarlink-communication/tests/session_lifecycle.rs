//! Tests for the session lifecycle controller: connect/disconnect
//! sequencing, event ordering, and notification rebroadcast.

use radarlink_communication::{
    MockTransport, SerialSession, SessionConfig, SessionState, NOTIFY_CHARACTERISTIC,
    WRITE_CHARACTERISTIC,
};
use radarlink_core::{auth_command, Error, LinkEvent, TransportError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fast_config() -> SessionConfig {
    SessionConfig {
        pump_interval: Duration::from_millis(10),
        event_capacity: 64,
    }
}

fn record_events(session: &SerialSession) -> Arc<Mutex<Vec<LinkEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    session.subscribe(move |event| log_clone.lock().unwrap().push(event));
    log
}

#[tokio::test]
async fn test_connect_success_sequence() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());
    let events = record_events(&session);

    // Queued before the session exists; must flush once the pump runs.
    session.write(vec![0x01, 0x02]);

    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Connected);

    // The login frame reaches the send characteristic before anything
    // else, and Connected is broadcast before the pump first ticks.
    let send = transport.characteristic(WRITE_CHARACTERISTIC);
    assert_eq!(send.writes(), vec![auth_command().unwrap()]);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[LinkEvent::Subscribed, LinkEvent::Connected]
    );
    assert!(transport
        .characteristic(NOTIFY_CHARACTERISTIC)
        .notifications_active());

    // The pre-queued frame drains within one pump interval.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(
        send.writes(),
        vec![auth_command().unwrap(), vec![0x01, 0x02]]
    );
    assert!(events
        .lock()
        .unwrap()
        .contains(&LinkEvent::Write {
            payload: vec![0x01, 0x02]
        }));
    assert_eq!(session.queued_writes(), 0);
}

#[tokio::test]
async fn test_connect_fails_when_service_missing() {
    let transport = Arc::new(MockTransport::new().without_service());
    let session = SerialSession::with_config(transport, fast_config());
    let events = record_events(&session);

    let err = session.connect().await.unwrap_err();
    assert!(err.is_not_found());

    // No partial state, no event.
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(events.lock().unwrap().as_slice(), &[LinkEvent::Subscribed]);
}

#[tokio::test]
async fn test_connect_fails_when_characteristic_missing() {
    for missing in [WRITE_CHARACTERISTIC, NOTIFY_CHARACTERISTIC] {
        let transport = Arc::new(MockTransport::new().without_characteristic(missing));
        let session = SerialSession::with_config(transport, fast_config());

        let err = session.connect().await.unwrap_err();
        assert!(err.is_not_found(), "expected not-found for {missing:#06x}");
        assert_eq!(session.state(), SessionState::Idle);
    }
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport, fast_config());

    session.connect().await.unwrap();
    let err = session.connect().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::AlreadyConnected)
    ));
    assert_eq!(session.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_disconnect_teardown() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());
    let events = record_events(&session);

    session.connect().await.unwrap();
    session.disconnect().await.unwrap();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(transport.disconnect_count(), 1);
    assert!(!transport
        .characteristic(NOTIFY_CHARACTERISTIC)
        .notifications_active());
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&LinkEvent::Disconnected)
    );
}

#[tokio::test]
async fn test_disconnect_without_connect() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());
    let events = record_events(&session);

    session.disconnect().await.unwrap();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(transport.disconnect_count(), 1);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[LinkEvent::Subscribed, LinkEvent::Disconnected]
    );
}

#[tokio::test]
async fn test_reconnect_flushes_frames_queued_while_down() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());

    session.connect().await.unwrap();
    session.disconnect().await.unwrap();

    // Queued between sessions; the next session gets a fresh stop flag
    // and flushes it.
    session.write(vec![0xBE, 0xEF]);
    session.connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let writes = transport.characteristic(WRITE_CHARACTERISTIC).writes();
    assert_eq!(writes.last(), Some(&vec![0xBE, 0xEF]));
    // Each session performs its own handshake.
    assert_eq!(
        writes
            .iter()
            .filter(|frame| **frame == auth_command().unwrap())
            .count(),
        2
    );
}

#[tokio::test]
async fn test_notifications_rebroadcast_without_dedup() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());
    let events = record_events(&session);

    session.connect().await.unwrap();

    let notify = transport.characteristic(NOTIFY_CHARACTERISTIC);
    notify.notify(vec![0xFD, 0xFC, 0x01]);
    notify.notify(vec![0xFD, 0xFC, 0x01]);

    let reads: Vec<LinkEvent> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, LinkEvent::Read { .. }))
        .cloned()
        .collect();
    assert_eq!(
        reads,
        vec![
            LinkEvent::Read {
                payload: vec![0xFD, 0xFC, 0x01]
            },
            LinkEvent::Read {
                payload: vec![0xFD, 0xFC, 0x01]
            },
        ]
    );
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport.clone(), fast_config());

    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let id = session.subscribe(move |event| log_clone.lock().unwrap().push(event));
    assert_eq!(log.lock().unwrap().as_slice(), &[LinkEvent::Subscribed]);

    assert!(session.unsubscribe(id));
    assert!(!session.unsubscribe(id));

    session.connect().await.unwrap();
    transport
        .characteristic(NOTIFY_CHARACTERISTIC)
        .notify(vec![0x00]);

    assert_eq!(log.lock().unwrap().as_slice(), &[LinkEvent::Subscribed]);
}

#[tokio::test]
async fn test_async_event_receiver() {
    let transport = Arc::new(MockTransport::new());
    let session = SerialSession::with_config(transport, fast_config());

    let mut receiver = session.events();
    session.connect().await.unwrap();

    assert_eq!(receiver.recv().await.unwrap(), LinkEvent::Connected);
}
