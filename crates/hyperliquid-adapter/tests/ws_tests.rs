/*
[INPUT]:  Subscription registrations and synthetic inbound frames
[OUTPUT]: Test results for the subscription multiplexer
[POS]:    Integration tests - multiplexer behavior without a live socket
[UPDATE]: When dedup, exclusivity, or replay rules change
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use hyperliquid_adapter::ws::{MuxState, Subscription, WireOp, WsManager, WsMsg};
use serde_json::json;

fn l2(coin: &str) -> Subscription {
    Subscription::L2Book {
        coin: coin.to_string(),
    }
}

fn l2_frame(coin: &str) -> WsMsg {
    WsMsg {
        channel: "l2Book".to_string(),
        data: json!({ "coin": coin, "levels": [[], []] }),
    }
}

#[test]
fn test_subscribe_frame_sent_only_for_first_registration() {
    let mut state = MuxState::new();
    state.on_open();

    let (_, first) = state.register(l2("ETH"), Box::new(|_| {})).unwrap();
    let (_, second) = state.register(l2("ETH"), Box::new(|_| {})).unwrap();
    // Casing differences collapse onto the same identifier.
    let (_, third) = state.register(l2("eth"), Box::new(|_| {})).unwrap();

    assert_eq!(first, Some(WireOp::Subscribe(l2("ETH"))));
    assert_eq!(second, None);
    assert_eq!(third, None);
}

#[test]
fn test_exclusive_channels_reject_sharing() {
    let mut state = MuxState::new();
    state.on_open();

    for make in [
        (|user: String| Subscription::UserEvents { user }) as fn(String) -> Subscription,
        |user: String| Subscription::OrderUpdates { user },
    ] {
        state
            .register(make("0xaa".to_string()), Box::new(|_| {}))
            .unwrap();
        assert!(state
            .register(make("0xbb".to_string()), Box::new(|_| {}))
            .is_err());
    }
}

#[test]
fn test_partial_unsubscribe_defers_wire_frame() {
    let mut state = MuxState::new();
    state.on_open();

    let (a, _) = state.register(l2("ETH"), Box::new(|_| {})).unwrap();
    let (b, _) = state.register(l2("ETH"), Box::new(|_| {})).unwrap();

    let (removed, op) = state.unregister(&l2("ETH"), a);
    assert!(removed && op.is_none());

    let (removed, op) = state.unregister(&l2("ETH"), b);
    assert!(removed);
    assert_eq!(op, Some(WireOp::Unsubscribe(l2("ETH"))));

    // Idempotent: a second removal of the same id reports false.
    let (removed, op) = state.unregister(&l2("ETH"), b);
    assert!(!removed && op.is_none());
}

#[test]
fn test_queued_registrations_flush_in_fifo_order() {
    let mut state = MuxState::new();

    let (_, op) = state.register(l2("ETH"), Box::new(|_| {})).unwrap();
    assert!(op.is_none(), "no frames before the socket opens");
    state.register(l2("BTC"), Box::new(|_| {})).unwrap();
    state.register(Subscription::AllMids, Box::new(|_| {})).unwrap();

    let ops = state.on_open();
    assert_eq!(
        ops,
        vec![
            WireOp::Subscribe(l2("ETH")),
            WireOp::Subscribe(l2("BTC")),
            WireOp::Subscribe(Subscription::AllMids),
        ]
    );
}

#[test]
fn test_reconnect_replays_active_subscriptions() {
    let mut state = MuxState::new();
    state.on_open();
    state.register(l2("ETH"), Box::new(|_| {})).unwrap();
    state
        .register(Subscription::AllMids, Box::new(|_| {}))
        .unwrap();

    state.on_close();
    assert!(!state.is_ready());

    let ops = state.on_open();
    assert_eq!(ops.len(), 2);
    assert!(ops.contains(&WireOp::Subscribe(l2("ETH"))));
    assert!(ops.contains(&WireOp::Subscribe(Subscription::AllMids)));
}

#[test]
fn test_callbacks_fire_in_registration_order() {
    let mut state = MuxState::new();
    state.on_open();

    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        state
            .register(
                l2("ETH"),
                Box::new(move |_| order.lock().unwrap().push(tag)),
            )
            .unwrap();
    }

    assert_eq!(state.route(&l2_frame("ETH")), 3);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_frames_route_only_to_matching_identifier() {
    let mut state = MuxState::new();
    state.on_open();

    let eth_hits = Arc::new(AtomicUsize::new(0));
    let hits = eth_hits.clone();
    state
        .register(
            l2("ETH"),
            Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    assert_eq!(state.route(&l2_frame("BTC")), 0);
    assert_eq!(state.route(&l2_frame("ETH")), 1);
    assert_eq!(eth_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_user_channel_routes_to_user_events_subscription() {
    let mut state = MuxState::new();
    state.on_open();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    state
        .register(
            Subscription::UserEvents {
                user: "0xAA".to_string(),
            },
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    let frame = WsMsg {
        channel: "user".to_string(),
        data: json!({ "fills": [] }),
    };
    assert_eq!(state.route(&frame), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Local server that counts accepted sockets. The first connection is
/// dropped shortly after the handshake to push the client into its
/// reconnect backoff; later connections are held open.
async fn spawn_counting_server() -> (std::net::SocketAddr, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                tokio::time::sleep(Duration::from_millis(100)).await;
                drop(ws);
            }
        }
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                tokio::spawn(async move { while let Some(Ok(_)) = ws.next().await {} });
            }
        }
    });
    (addr, accepted)
}

#[tokio::test]
async fn test_manual_reconnect_does_not_duplicate_sessions() {
    let (addr, accepted) = spawn_counting_server().await;
    let manager = WsManager::new(format!("ws://{addr}"));
    manager.connect().await.unwrap();

    // Wait out the server-side drop, then redial while the driver is in
    // its first one-second backoff sleep.
    tokio::time::sleep(Duration::from_millis(400)).await;
    manager.connect().await.unwrap();

    // The driver's own reconnect attempt fires at the one-second mark; it
    // must observe the newer session and stand down rather than open a
    // third socket.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    // And with a session live, another connect is rejected outright.
    assert!(manager.connect().await.is_err());
    manager.close().await;
}

#[test]
fn test_unroutable_frames_are_dropped_quietly() {
    let mut state = MuxState::new();
    state.on_open();
    state.register(l2("ETH"), Box::new(|_| {})).unwrap();

    let pong = WsMsg {
        channel: "pong".to_string(),
        data: serde_json::Value::Null,
    };
    let empty_trades = WsMsg {
        channel: "trades".to_string(),
        data: json!([]),
    };
    assert_eq!(state.route(&pong), 0);
    assert_eq!(state.route(&empty_trades), 0);
}
