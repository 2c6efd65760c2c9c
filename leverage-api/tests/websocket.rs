//! End-to-end real-time channel tests
//!
//! Starts the server on an ephemeral port and talks to it with real
//! WebSocket clients.
//!
//! Run with: cargo test -p leverage-api --test websocket

use futures_util::{SinkExt, StreamExt};
use leverage_api::{build_router, AppState};
use leverage_core::{TradeUpdate, UpdatePayload, UpdateType};
use leverage_services::{ConnectionRegistry, PlaceholderBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TRADE: &str =
    r#"{"type":"TRADE","data":{"action":"LONG","symbol":"BTC","amount":1,"leverage":5}}"#;

async fn start_server() -> (SocketAddr, Arc<ConnectionRegistry>) {
    let state = AppState::new(Arc::new(PlaceholderBackend));
    let registry = Arc::clone(&state.registry);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, registry)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{}{}", addr, path)).await.unwrap();
    client
}

async fn wait_for_clients(registry: &ConnectionRegistry, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.len() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {} clients, have {}", expected, registry.len()));
}

async fn next_update(client: &mut Client) -> TradeUpdate {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for update")
            .expect("stream ended")
            .unwrap();

        if let Message::Text(text) = msg {
            return TradeUpdate::from_json(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

#[tokio::test]
async fn test_trade_broadcast_to_every_client() {
    let (addr, registry) = start_server().await;
    let mut sender = connect(addr, "/ws").await;
    let mut other = connect(addr, "/ws").await;
    wait_for_clients(&registry, 2).await;

    sender.send(Message::text(TRADE)).await.unwrap();

    let a = next_update(&mut sender).await;
    let b = next_update(&mut other).await;
    assert_eq!(a.kind(), UpdateType::Execution);
    assert_eq!(a, b);

    match a.payload {
        UpdatePayload::Execution(request) => assert_eq!(request.symbol, "BTC"),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_errors_sender_only() {
    let (addr, registry) = start_server().await;
    let mut sender = connect(addr, "/ws").await;
    let mut other = connect(addr, "/ws").await;
    wait_for_clients(&registry, 2).await;

    sender.send(Message::text("{not json")).await.unwrap();

    assert_eq!(next_update(&mut sender).await.kind(), UpdateType::Error);
    assert_silent(&mut other).await;
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let (addr, registry) = start_server().await;
    let mut leaving = connect(addr, "/ws").await;
    let mut staying = connect(addr, "/ws").await;
    wait_for_clients(&registry, 2).await;

    leaving.close(None).await.unwrap();
    wait_for_clients(&registry, 1).await;

    staying.send(Message::text(TRADE)).await.unwrap();
    assert_eq!(next_update(&mut staying).await.kind(), UpdateType::Execution);
}

#[tokio::test]
async fn test_upgrade_accepted_on_any_path() {
    let (addr, registry) = start_server().await;

    // Registered HTTP routes, the root and unknown paths all upgrade
    let paths = ["/ws", "/", "/realtime", "/health", "/execute", "/positions", "/price/BTC"];
    let mut clients = Vec::new();
    for path in paths {
        clients.push(connect(addr, path).await);
    }
    wait_for_clients(&registry, paths.len()).await;

    clients[0].send(Message::text(TRADE)).await.unwrap();

    for client in clients.iter_mut() {
        assert_eq!(next_update(client).await.kind(), UpdateType::Execution);
    }
}
