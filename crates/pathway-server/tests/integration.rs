//! End-to-end tests against a real server using a `tokio-tungstenite` client.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use pathway_proto::{Command, OutboundEvent, Route};
use pathway_server::{PathwayServer, ServerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot a server on an ephemeral port.
async fn boot_server() -> (std::net::SocketAddr, PathwayServer) {
    boot_server_with(ServerConfig::default()).await
}

async fn boot_server_with(config: ServerConfig) -> (std::net::SocketAddr, PathwayServer) {
    let metrics = PrometheusBuilder::new().build_recorder().handle();
    let server = PathwayServer::new(config, metrics);
    let (addr, _handle) = server.listen().await.unwrap();
    (addr, server)
}

/// Wait until the server closes the connection.
async fn expect_closed(ws: &mut WsStream) {
    timeout(TIMEOUT, async {
        while let Some(msg) = ws.next().await {
            if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                return;
            }
        }
    })
    .await
    .expect("connection stayed open");
}

async fn connect(addr: std::net::SocketAddr, path: &str) -> WsStream {
    let (ws, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    ws
}

async fn send(ws: &mut WsStream, command: Command) {
    ws.send(Message::Binary(command.encode())).await.unwrap();
}

async fn next_event(ws: &mut WsStream) -> OutboundEvent {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .unwrap();
        match msg {
            Message::Binary(data) => return OutboundEvent::decode(&data).unwrap(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert nothing arrives within a short window.
async fn expect_silence(ws: &mut WsStream) {
    let res = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "expected no frame, got {res:?}");
}

#[tokio::test]
async fn upgrade_advertises_server_token() {
    let (addr, _server) = boot_server().await;
    let (_ws, response) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    assert_eq!(
        response.headers().get("server").unwrap(),
        "pathfinding-websockets"
    );
}

#[tokio::test]
async fn bare_origin_accepts_browser_client() {
    let (addr, _server) = boot_server().await;
    let mut ws = connect(addr, "/").await;
    send(&mut ws, Command::AddNode { x: 1.0, y: 2.0 }).await;
    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::NodeAdded { id: 0, x: 1.0, y: 2.0 }
    );
}

#[tokio::test]
async fn two_nodes_and_a_connection() {
    let (addr, _server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;

    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    send(&mut ws, Command::AddNode { x: 10.0, y: 0.0 }).await;
    send(&mut ws, Command::AddConnection { id1: 0, id2: 1 }).await;

    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::NodeAdded { id: 0, x: 0.0, y: 0.0 }
    );
    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::NodeAdded { id: 1, x: 10.0, y: 0.0 }
    );
    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::ConnectionAdded { id1: 0, id2: 1 }
    );

    send(&mut ws, Command::FindPath { start: 0, goal: 1 }).await;
    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::PathFound {
            start: 0,
            goal: 1,
            route: Some(Route {
                nodes: vec![0, 1],
                cost: 10.0,
            }),
        }
    );
}

#[tokio::test]
async fn removed_id_is_reused() {
    let (addr, _server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;

    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    send(&mut ws, Command::AddNode { x: 1.0, y: 1.0 }).await;
    send(&mut ws, Command::RemoveNode { id: 0 }).await;
    send(&mut ws, Command::AddNode { x: 2.0, y: 2.0 }).await;

    let events = [
        next_event(&mut ws).await,
        next_event(&mut ws).await,
        next_event(&mut ws).await,
        next_event(&mut ws).await,
    ];
    assert_eq!(events[2], OutboundEvent::NodeRemoved { id: 0 });
    assert_eq!(events[3], OutboundEvent::NodeAdded { id: 0, x: 2.0, y: 2.0 });
}

#[tokio::test]
async fn malformed_frame_does_not_end_session() {
    let (addr, _server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;

    ws.send(Message::Binary(vec![0xFF, 0xFF, 0xFF].into()))
        .await
        .unwrap();
    send(&mut ws, Command::AddNode { x: 5.0, y: 5.0 }).await;

    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::NodeAdded { id: 0, x: 5.0, y: 5.0 }
    );
}

#[tokio::test]
async fn unknown_ids_get_no_reply() {
    let (addr, _server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;

    send(&mut ws, Command::RemoveNode { id: 42 }).await;
    send(&mut ws, Command::AddConnection { id1: 1, id2: 2 }).await;
    expect_silence(&mut ws).await;

    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    assert_eq!(
        next_event(&mut ws).await,
        OutboundEvent::NodeAdded { id: 0, x: 0.0, y: 0.0 }
    );
}

#[tokio::test]
async fn sessions_are_isolated() {
    let (addr, _server) = boot_server().await;
    let mut first = connect(addr, "/ws").await;
    let mut second = connect(addr, "/ws").await;

    send(&mut first, Command::AddNode { x: 0.0, y: 0.0 }).await;
    send(&mut first, Command::AddNode { x: 1.0, y: 0.0 }).await;
    let _ = next_event(&mut first).await;
    let _ = next_event(&mut first).await;

    // The second connection has its own registry, starting at 0.
    send(&mut second, Command::AddNode { x: 9.0, y: 9.0 }).await;
    assert_eq!(
        next_event(&mut second).await,
        OutboundEvent::NodeAdded { id: 0, x: 9.0, y: 9.0 }
    );
    send(&mut second, Command::RemoveNode { id: 1 }).await;
    expect_silence(&mut second).await;
}

#[tokio::test]
async fn health_counts_open_connections() {
    let (addr, server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;
    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    let _ = next_event(&mut ws).await;
    assert_eq!(server.connection_count(), 1);

    ws.close(None).await.unwrap();
    timeout(TIMEOUT, async {
        while server.connection_count() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn shutdown_closes_open_sessions() {
    let (addr, server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;
    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    let _ = next_event(&mut ws).await;

    server.shutdown().shutdown();
    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn graceful_shutdown_waits_for_session_teardown() {
    let (addr, server) = boot_server().await;
    let mut ws = connect(addr, "/ws").await;
    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    let _ = next_event(&mut ws).await;
    assert_eq!(server.shutdown().tracked_sessions(), 1);

    server.shutdown().graceful_shutdown(Vec::new(), Some(TIMEOUT)).await;
    assert_eq!(server.shutdown().tracked_sessions(), 0);
    assert_eq!(server.connection_count(), 0);
    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn idle_client_is_disconnected() {
    let config = ServerConfig {
        idle_timeout: Duration::from_millis(300),
        ..ServerConfig::default()
    };
    let (addr, server) = boot_server_with(config).await;
    let mut ws = connect(addr, "/ws").await;
    send(&mut ws, Command::AddNode { x: 0.0, y: 0.0 }).await;
    let _ = next_event(&mut ws).await;

    expect_closed(&mut ws).await;
    timeout(TIMEOUT, async {
        while server.connection_count() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}
