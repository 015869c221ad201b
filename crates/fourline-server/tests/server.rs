//! End-to-end tests over real WebSocket connections: a bound server, raw
//! tungstenite clients, JSON frames.
//!
//! Timings here are real, so the configs keep every timer short.

use std::sync::Arc;
use std::time::Duration;

use fourline_protocol::{ClientMessage, ServerMessage};
use fourline_rules::PlayerId;
use fourline_server::{EngineConfig, Server};
use fourline_store::{MemorySink, MemoryStore};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn fast_config() -> EngineConfig {
    EngineConfig {
        match_timeout: Duration::from_millis(150),
        bot_delay: Duration::from_millis(30),
        reconnect_grace: Duration::from_millis(250),
        bot_name: "HouseBot".to_string(),
    }
}

/// Config that never times out into a bot game during a two-player test.
fn paired_config() -> EngineConfig {
    EngineConfig {
        match_timeout: Duration::from_secs(3600),
        ..fast_config()
    }
}

async fn start(config: EngineConfig) -> (String, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let server = Server::bind(
        "127.0.0.1:0",
        config,
        Arc::clone(&store),
        Arc::new(MemorySink::new()),
    )
    .await
    .expect("bind");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, store)
}

async fn ws(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("connect");
    ws
}

async fn send(ws: &mut Ws, msg: &ClientMessage) {
    let bytes = serde_json::to_vec(msg).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

async fn recv(ws: &mut Ws) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            Message::Binary(data) => return serde_json::from_slice(&data).expect("decode"),
            Message::Text(text) => {
                return serde_json::from_slice(text.as_bytes()).expect("decode");
            }
            _ => continue, // ping/pong
        }
    }
}

async fn join(ws: &mut Ws, username: &str) {
    send(
        ws,
        &ClientMessage::JoinGame {
            username: username.to_string(),
        },
    )
    .await;
}

/// Joins two clients and drains `waiting` + both `game_start` messages.
/// Returns the first mover's identity.
async fn setup_game(a: &mut Ws, b: &mut Ws) -> PlayerId {
    join(a, "alice").await;
    assert!(matches!(recv(a).await, ServerMessage::Waiting));
    join(b, "bob").await;

    let a_id = match recv(a).await {
        ServerMessage::GameStart {
            participant_id,
            your_turn,
            ..
        } => {
            assert!(your_turn);
            participant_id
        }
        other => panic!("expected game_start, got {other:?}"),
    };
    assert!(matches!(recv(b).await, ServerMessage::GameStart { .. }));
    a_id
}

/// Sends a move and drains the `game_update` broadcast from both sides.
async fn play(mover: &mut Ws, other: &mut Ws, column: usize) {
    send(mover, &ClientMessage::MakeMove { column }).await;
    assert!(matches!(recv(mover).await, ServerMessage::GameUpdate { .. }));
    assert!(matches!(recv(other).await, ServerMessage::GameUpdate { .. }));
}

#[tokio::test]
async fn test_two_clients_play_to_a_vertical_win() {
    let (addr, store) = start(paired_config()).await;
    let mut a = ws(&addr).await;
    let mut b = ws(&addr).await;
    let a_id = setup_game(&mut a, &mut b).await;

    for _ in 0..3 {
        play(&mut a, &mut b, 1).await;
        play(&mut b, &mut a, 4).await;
    }
    send(&mut a, &ClientMessage::MakeMove { column: 1 }).await;

    for client in [&mut a, &mut b] {
        match recv(client).await {
            ServerMessage::GameOver { winner, reason, .. } => {
                assert_eq!(winner, Some(a_id));
                assert!(reason.is_none());
            }
            other => panic!("expected game_over, got {other:?}"),
        }
    }
    assert_eq!(store.finished_count().await, 1);
}

#[tokio::test]
async fn test_out_of_turn_move_gets_error_reply() {
    let (addr, _store) = start(paired_config()).await;
    let mut a = ws(&addr).await;
    let mut b = ws(&addr).await;
    setup_game(&mut a, &mut b).await;

    send(&mut b, &ClientMessage::MakeMove { column: 0 }).await;

    match recv(&mut b).await {
        ServerMessage::Error { message } => assert_eq!(message, "Not your turn"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_solo_client_gets_scripted_game_and_reply() {
    let (addr, _store) = start(fast_config()).await;
    let mut a = ws(&addr).await;

    join(&mut a, "alice").await;
    assert!(matches!(recv(&mut a).await, ServerMessage::Waiting));

    match recv(&mut a).await {
        ServerMessage::GameStart {
            opponent_name,
            your_turn,
            ..
        } => {
            assert_eq!(opponent_name, "HouseBot");
            assert!(your_turn);
        }
        other => panic!("expected game_start, got {other:?}"),
    }

    send(&mut a, &ClientMessage::MakeMove { column: 0 }).await;
    // Own move, then the scripted reply after the thinking delay.
    assert!(matches!(recv(&mut a).await, ServerMessage::GameUpdate { .. }));
    match recv(&mut a).await {
        ServerMessage::GameUpdate { can_move, .. } => {
            assert!(can_move, "turn returns to the human after the reply");
        }
        other => panic!("expected game_update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_forfeits_to_the_survivor() {
    let (addr, store) = start(paired_config()).await;
    let mut a = ws(&addr).await;
    let mut b = ws(&addr).await;
    setup_game(&mut a, &mut b).await;

    drop(a);

    assert!(matches!(
        recv(&mut b).await,
        ServerMessage::OpponentDisconnected { .. }
    ));
    match recv(&mut b).await {
        ServerMessage::GameOver { winner, reason, .. } => {
            assert!(winner.is_some());
            assert_eq!(reason.as_deref(), Some("forfeit"));
        }
        other => panic!("expected game_over, got {other:?}"),
    }
    assert_eq!(store.finished_count().await, 1);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped_not_fatal() {
    let (addr, _store) = start(paired_config()).await;
    let mut a = ws(&addr).await;

    a.send(Message::Text("not json at all".into())).await.expect("send");

    // The connection survives and the protocol still works on it.
    join(&mut a, "alice").await;
    assert!(matches!(recv(&mut a).await, ServerMessage::Waiting));
}
