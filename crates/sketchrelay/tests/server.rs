//! Integration tests for the SketchRelay server: real WebSocket clients
//! speaking JSON to a server on a random port.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use sketchrelay::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = SketchRelayServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Connects and consumes the `connected` greeting.
async fn connect(addr: &str) -> (ClientWs, PlayerId) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    match recv(&mut ws).await {
        ServerEvent::Connected { player_id } => (ws, player_id),
        other => panic!("expected Connected, got {other:?}"),
    }
}

async fn send(ws: &mut ClientWs, cmd: Value) {
    ws.send(Message::text(cmd.to_string()))
        .await
        .expect("send command");
}

/// Next server event, skipping control frames.
async fn recv(ws: &mut ClientWs) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("event within 2s")
            .expect("stream open")
            .expect("frame ok");
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).expect("decode event");
        }
    }
}

/// Skips events until one matches.
async fn wait_for(
    ws: &mut ClientWs,
    mut pred: impl FnMut(&ServerEvent) -> bool,
) -> ServerEvent {
    loop {
        let event = recv(ws).await;
        if pred(&event) {
            return event;
        }
    }
}

async fn create_room(ws: &mut ClientWs, name: &str, is_public: bool) -> RoomCode {
    send(ws, json!({"type": "createRoom", "name": name, "isPublic": is_public})).await;
    match wait_for(ws, |e| matches!(e, ServerEvent::RoomCreated { .. })).await {
        ServerEvent::RoomCreated { code } => code,
        _ => unreachable!(),
    }
}

async fn join_room(ws: &mut ClientWs, code: &str, name: &str) {
    send(ws, json!({"type": "joinRoom", "code": code, "name": name})).await;
    wait_for(ws, |e| matches!(e, ServerEvent::Joined { .. })).await;
}

/// Waits for this player's `roundStart` and returns `(slotIndex, content)`.
async fn round_start(ws: &mut ClientWs) -> (usize, Content) {
    match wait_for(ws, |e| matches!(e, ServerEvent::RoundStart { .. })).await {
        ServerEvent::RoundStart {
            slot_index,
            content,
            ..
        } => (slot_index, content),
        _ => unreachable!(),
    }
}

// =========================================================================
// Connection
// =========================================================================

#[tokio::test]
async fn test_each_connection_gets_its_own_player_id() {
    let addr = start_server().await;
    let (_ws1, p1) = connect(&addr).await;
    let (_ws2, p2) = connect(&addr).await;
    assert_ne!(p1, p2);
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    ws.send(Message::text("not json")).await.expect("send");
    send(&mut ws, json!({"type": "danceParty"})).await;
    send(&mut ws, json!({"type": "listPublicRooms"})).await;

    match recv(&mut ws).await {
        ServerEvent::RoomList { rooms } => assert!(rooms.is_empty()),
        other => panic!("expected RoomList, got {other:?}"),
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code_and_update() {
    let addr = start_server().await;
    let (mut ws, me) = connect(&addr).await;

    let code = create_room(&mut ws, "Ada", false).await;
    assert_eq!(code.as_str().len(), 5);

    match recv(&mut ws).await {
        ServerEvent::RoomUpdate {
            players,
            host_id,
            state,
            ..
        } => {
            assert_eq!(players.len(), 1);
            assert_eq!(host_id, Some(me));
            assert_eq!(state, Phase::Lobby);
        }
        other => panic!("expected RoomUpdate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_public_rooms_are_listed() {
    let addr = start_server().await;
    let (mut host, _) = connect(&addr).await;
    let code = create_room(&mut host, "Ada", true).await;
    let (mut private, _) = connect(&addr).await;
    create_room(&mut private, "Bea", false).await;

    let (mut browser, _) = connect(&addr).await;
    send(&mut browser, json!({"type": "listPublicRooms"})).await;
    match recv(&mut browser).await {
        ServerEvent::RoomList { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].code, code);
            assert_eq!(rooms[0].player_count, 1);
        }
        other => panic!("expected RoomList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_reports_error() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, json!({"type": "joinRoom", "code": "ZZZZZ", "name": "Ada"})).await;
    match recv(&mut ws).await {
        ServerEvent::ErrorMsg { text } => assert!(text.contains("not found"), "{text}"),
        other => panic!("expected ErrorMsg, got {other:?}"),
    }
}

#[tokio::test]
async fn test_codes_are_case_insensitive() {
    let addr = start_server().await;
    let (mut host, _) = connect(&addr).await;
    let code = create_room(&mut host, "Ada", false).await;

    let (mut guest, _) = connect(&addr).await;
    join_room(&mut guest, &code.as_str().to_lowercase(), "Bea").await;
}

#[tokio::test]
async fn test_start_by_guest_is_rejected() {
    let addr = start_server().await;
    let (mut host, _) = connect(&addr).await;
    let code = create_room(&mut host, "Ada", false).await;
    let (mut guest, _) = connect(&addr).await;
    join_room(&mut guest, code.as_str(), "Bea").await;

    send(&mut guest, json!({"type": "startGame", "code": code})).await;
    match wait_for(&mut guest, |e| matches!(e, ServerEvent::ErrorMsg { .. })).await {
        ServerEvent::ErrorMsg { text } => assert!(text.contains("host"), "{text}"),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_start_by_outsider_is_rejected() {
    let addr = start_server().await;
    let (mut host, _) = connect(&addr).await;
    let code = create_room(&mut host, "Ada", false).await;
    let (mut guest, _) = connect(&addr).await;
    join_room(&mut guest, code.as_str(), "Bea").await;
    let (mut outsider, _) = connect(&addr).await;

    send(&mut outsider, json!({"type": "startGame", "code": code})).await;
    match recv(&mut outsider).await {
        ServerEvent::ErrorMsg { text } => assert!(text.contains("host"), "{text}"),
        other => panic!("expected ErrorMsg, got {other:?}"),
    }

    // The game did not start.
    send(&mut host, json!({"type": "listPublicRooms"})).await;
    let update = wait_for(&mut host, |e| {
        matches!(e, ServerEvent::RequestInitialPrompts | ServerEvent::RoomList { .. })
    })
    .await;
    assert!(matches!(update, ServerEvent::RoomList { .. }));
}

#[tokio::test]
async fn test_command_for_unknown_room_reports_error() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, json!({"type": "toggleReady", "code": "QQQQQ"})).await;
    assert!(matches!(recv(&mut ws).await, ServerEvent::ErrorMsg { .. }));
}

#[tokio::test]
async fn test_host_disconnect_hands_over_host() {
    let addr = start_server().await;
    let (mut host, _) = connect(&addr).await;
    let code = create_room(&mut host, "Ada", false).await;
    let (mut guest, guest_id) = connect(&addr).await;
    join_room(&mut guest, code.as_str(), "Bea").await;

    host.close(None).await.expect("close");
    drop(host);

    let update = wait_for(&mut guest, |e| {
        matches!(e, ServerEvent::RoomUpdate { players, .. } if players.len() == 1)
    })
    .await;
    match update {
        ServerEvent::RoomUpdate { host_id, .. } => assert_eq!(host_id, Some(guest_id)),
        _ => unreachable!(),
    }
}

// =========================================================================
// Full game
// =========================================================================

#[tokio::test]
async fn test_two_player_game_over_websocket() {
    let addr = start_server().await;
    let (mut ada, _) = connect(&addr).await;
    let code = create_room(&mut ada, "Ada", true).await;
    let (mut bea, _) = connect(&addr).await;
    join_room(&mut bea, code.as_str(), "Bea").await;

    send(&mut ada, json!({"type": "startGame", "code": code})).await;
    wait_for(&mut ada, |e| *e == ServerEvent::RequestInitialPrompts).await;
    wait_for(&mut bea, |e| *e == ServerEvent::RequestInitialPrompts).await;

    send(&mut ada, json!({"type": "submitInitialPrompt", "code": code, "prompt": "cat"})).await;
    send(&mut bea, json!({"type": "submitInitialPrompt", "code": code, "prompt": "dog"})).await;

    let (slot, content) = round_start(&mut ada).await;
    assert_eq!(slot, 0);
    assert_eq!(content, Content::prompt("cat"));
    let (slot, content) = round_start(&mut bea).await;
    assert_eq!(slot, 1);
    assert_eq!(content, Content::prompt("dog"));

    send(&mut ada, json!({"type": "submitRound", "code": code, "slotIndex": 0,
        "payload": {"data": "data:image/png;base64,CAT", "thumbnail": "t-cat"}})).await;
    send(&mut bea, json!({"type": "submitRound", "code": code, "slotIndex": 1,
        "payload": {"data": "data:image/png;base64,DOG"}})).await;

    let (slot, content) = round_start(&mut bea).await;
    assert_eq!(slot, 0);
    assert_eq!(content.kind, ContentKind::Image);
    assert_eq!(content.thumbnail.as_deref(), Some("t-cat"));
    let (slot, _) = round_start(&mut ada).await;
    assert_eq!(slot, 1);

    send(&mut ada, json!({"type": "submitRound", "code": code, "slotIndex": 1,
        "payload": {"data": "a dog"}})).await;
    send(&mut bea, json!({"type": "submitRound", "code": code, "slotIndex": 0,
        "payload": {"data": "a cat"}})).await;

    let chains = match wait_for(&mut ada, |e| matches!(e, ServerEvent::Reveal { .. })).await {
        ServerEvent::Reveal { chains } => chains,
        _ => unreachable!(),
    };
    assert_eq!(chains.len(), 2);
    assert_eq!(chains[0].owner.name, "Ada");
    let kinds: Vec<ContentKind> = chains[0].chain.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ContentKind::Prompt, ContentKind::Image, ContentKind::Text]);
    assert_eq!(chains[0].chain[2].data, "a cat");

    send(&mut bea, json!({"type": "vote", "code": code, "slot": 0, "choiceIndex": 1})).await;
    match wait_for(&mut ada, |e| matches!(e, ServerEvent::VoteUpdate { .. })).await {
        ServerEvent::VoteUpdate { slot, counts } => {
            assert_eq!(slot, 0);
            assert_eq!(counts.get(&1), Some(&1));
        }
        _ => unreachable!(),
    }

    // A started room is no longer listed.
    send(&mut ada, json!({"type": "listPublicRooms"})).await;
    match wait_for(&mut ada, |e| matches!(e, ServerEvent::RoomList { .. })).await {
        ServerEvent::RoomList { rooms } => assert!(rooms.is_empty()),
        _ => unreachable!(),
    }
}
