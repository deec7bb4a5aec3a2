use super::*;
use crate::qr::PNG_DATA_URL_PREFIX;
use crate::testing::FakeClient;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tokio::sync::broadcast::error::TryRecvError;

fn relay_with(client: Arc<FakeClient>) -> Relay {
    Relay::new(client)
}

/// Drain everything currently buffered for a subscriber.
fn drain(rx: &mut broadcast::Receiver<SocketEvent>) -> Vec<SocketEvent> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    out
}

fn qr_event(code: &str) -> ClientEvent {
    ClientEvent::Qr {
        code: code.to_string(),
    }
}

#[tokio::test]
async fn test_new_subscriber_gets_connecting_first() {
    let relay = relay_with(Arc::new(FakeClient::new()));
    let sub = relay.subscribe().await;
    assert_eq!(
        sub.replay,
        vec![SocketEvent::Message(STATUS_CONNECTING.to_string())]
    );
}

#[tokio::test]
async fn test_subscriber_receives_exactly_one_qr() {
    let relay = relay_with(Arc::new(FakeClient::new()));
    let mut sub = relay.subscribe().await;

    relay.handle_event(qr_event("2@pairing-payload")).await;

    let events = drain(&mut sub.events);
    let qrs: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            SocketEvent::Qr(url) => Some(url),
            _ => None,
        })
        .collect();
    assert_eq!(qrs.len(), 1, "expected one qr event, got {events:?}");

    let url = qrs[0];
    let b64 = url.strip_prefix(PNG_DATA_URL_PREFIX).expect("data URL prefix");
    let png = BASE64.decode(b64).expect("valid base64");
    assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
    assert_eq!(url, &qr_data_url("2@pairing-payload").unwrap());

    assert!(events.contains(&SocketEvent::Message(STATUS_QR_RECEIVED.to_string())));
    assert_eq!(relay.state().await, SessionState::QrPending);
}

#[tokio::test]
async fn test_full_lifecycle_notifications() {
    let relay = relay_with(Arc::new(FakeClient::new()));
    let mut sub = relay.subscribe().await;

    relay.handle_event(qr_event("2@x")).await;
    relay.handle_event(ClientEvent::Authenticated).await;
    relay.handle_event(ClientEvent::Ready).await;

    let events = drain(&mut sub.events);
    assert!(events.contains(&SocketEvent::Authenticated(STATUS_AUTHENTICATED.to_string())));
    assert!(events.contains(&SocketEvent::Ready(STATUS_READY.to_string())));
    assert_eq!(
        events.last(),
        Some(&SocketEvent::Message(STATUS_READY.to_string()))
    );
    assert_eq!(relay.state().await, SessionState::Ready);
}

#[tokio::test]
async fn test_late_subscriber_replays_pending_qr() {
    let relay = relay_with(Arc::new(FakeClient::new()));
    relay.handle_event(qr_event("2@late")).await;

    let sub = relay.subscribe().await;
    assert_eq!(sub.replay.len(), 3);
    assert_eq!(sub.replay[1], SocketEvent::Qr(qr_data_url("2@late").unwrap()));
    assert_eq!(
        sub.replay[2],
        SocketEvent::Message(STATUS_QR_RECEIVED.to_string())
    );
}

#[tokio::test]
async fn test_late_subscriber_after_ready_gets_status_not_qr() {
    let relay = relay_with(Arc::new(FakeClient::new()));
    relay.handle_event(qr_event("2@x")).await;
    relay.handle_event(ClientEvent::Authenticated).await;
    relay.handle_event(ClientEvent::Ready).await;

    let sub = relay.subscribe().await;
    assert_eq!(
        sub.replay,
        vec![
            SocketEvent::Message(STATUS_CONNECTING.to_string()),
            SocketEvent::Message(STATUS_READY.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_disconnect_reconnects_once() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());
    let mut sub = relay.subscribe().await;

    relay.handle_event(ClientEvent::Authenticated).await;
    relay.handle_event(ClientEvent::Ready).await;
    relay
        .handle_event(ClientEvent::Disconnected {
            reason: "LOGOUT".into(),
        })
        .await;

    assert_eq!(client.count_calls("destroy"), 1);
    assert_eq!(client.count_calls("initialize"), 1);
    assert_eq!(client.calls(), vec!["destroy", "initialize"]);
    assert_eq!(relay.state().await, SessionState::Uninitialized);

    let events = drain(&mut sub.events);
    assert_eq!(
        events.last(),
        Some(&SocketEvent::Message(STATUS_DISCONNECTED.to_string()))
    );
}

#[tokio::test]
async fn test_auth_failure_stays_idle_by_default() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());

    relay.handle_event(qr_event("2@x")).await;
    relay
        .handle_event(ClientEvent::AuthFailure {
            reason: "rejected".into(),
        })
        .await;

    assert_eq!(relay.state().await, SessionState::AuthFailure);
    assert!(client.calls().is_empty());

    // Stale QR is not replayed after the failure.
    let sub = relay.subscribe().await;
    assert!(!sub.replay.iter().any(|e| matches!(e, SocketEvent::Qr(_))));
    assert!(sub
        .replay
        .contains(&SocketEvent::Message(STATUS_AUTH_FAILURE.to_string())));
}

#[tokio::test]
async fn test_auth_failure_restarts_when_configured() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone()).with_restart_on_auth_fail(true);

    relay.handle_event(qr_event("2@x")).await;
    relay
        .handle_event(ClientEvent::AuthFailure {
            reason: "rejected".into(),
        })
        .await;

    assert_eq!(client.calls(), vec!["destroy", "initialize"]);
    assert_eq!(relay.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn test_qr_after_ready_is_broadcast() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());
    relay.handle_event(ClientEvent::Authenticated).await;
    relay.handle_event(ClientEvent::Ready).await;

    // The bridge restarted its session without reporting a disconnect.
    let mut sub = relay.subscribe().await;
    relay.handle_event(qr_event("2@fresh")).await;

    assert_eq!(relay.state().await, SessionState::QrPending);
    assert_eq!(
        drain(&mut sub.events),
        vec![
            SocketEvent::Qr(qr_data_url("2@fresh").unwrap()),
            SocketEvent::Message(STATUS_QR_RECEIVED.to_string()),
        ]
    );
    assert!(client.calls().is_empty());

    let late = relay.subscribe().await;
    assert!(late
        .replay
        .contains(&SocketEvent::Qr(qr_data_url("2@fresh").unwrap())));
}

#[tokio::test]
async fn test_qr_after_auth_failure_resumes_pairing() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());
    relay.handle_event(qr_event("2@x")).await;
    relay
        .handle_event(ClientEvent::AuthFailure {
            reason: "rejected".into(),
        })
        .await;

    let mut sub = relay.subscribe().await;
    relay.handle_event(qr_event("2@retry")).await;

    assert_eq!(relay.state().await, SessionState::QrPending);
    let events = drain(&mut sub.events);
    assert!(events.contains(&SocketEvent::Qr(qr_data_url("2@retry").unwrap())));

    relay.handle_event(ClientEvent::Authenticated).await;
    assert_eq!(relay.state().await, SessionState::Authenticated);
}

#[tokio::test]
async fn test_out_of_order_event_ignored() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());
    let mut sub = relay.subscribe().await;

    relay.handle_event(ClientEvent::Ready).await;
    relay
        .handle_event(ClientEvent::Disconnected {
            reason: "x".into(),
        })
        .await;

    assert_eq!(relay.state().await, SessionState::Uninitialized);
    assert!(drain(&mut sub.events).is_empty());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_inbound_messages_forwarded() {
    let (tx, mut rx) = mpsc::channel(4);
    let relay = relay_with(Arc::new(FakeClient::new())).with_inbound(tx);

    let message: InboundMessage = serde_json::from_value(serde_json::json!({
        "id": "m1",
        "from": "5511999887766@c.us",
        "body": "hello"
    }))
    .unwrap();
    relay
        .handle_event(ClientEvent::Message {
            message: message.clone(),
        })
        .await;

    assert_eq!(rx.recv().await, Some(message));
    assert_eq!(relay.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn test_run_consumes_client_stream() {
    let client = Arc::new(FakeClient::new());
    let relay = relay_with(client.clone());
    let rx = client.start().await.unwrap();
    let handle = tokio::spawn(relay.clone().run(rx));

    client.emit(qr_event("2@run")).await;
    client.emit(ClientEvent::Authenticated).await;
    client.stop().await.unwrap();
    handle.await.unwrap();

    assert_eq!(relay.state().await, SessionState::Authenticated);
}

#[test]
fn test_socket_event_wire_format() {
    let json = serde_json::to_string(&SocketEvent::Qr("data:x".into())).unwrap();
    assert_eq!(json, r#"{"event":"qr","data":"data:x"}"#);
    let json = serde_json::to_string(&SocketEvent::Message("hi".into())).unwrap();
    assert_eq!(json, r#"{"event":"message","data":"hi"}"#);
}
