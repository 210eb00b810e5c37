//! Per-connection gateway: decodes client commands and routes them to the
//! registry or to a room.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the `PlayerId` from the connection id, send `connected`
//!   2. Spawn a writer task draining the player's event channel
//!   3. Loop: receive frames → decode → dispatch
//!   4. On close, the guard removes the player from their room

use std::sync::Arc;

use sketchrelay_protocol::{ClientCommand, Codec, PlayerId, RoomCode, ServerEvent};
use sketchrelay_room::{PlayerAction, PlayerSender, RoomError, list_public};
use sketchrelay_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ServerError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct MembershipGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, "player connected");

    let hello = state.codec.encode(&ServerEvent::Connected { player_id })?;
    conn.send(&hello).await?;

    let _guard = MembershipGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        rx,
    ));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let cmd: ClientCommand = match state.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "dropping malformed frame");
                continue;
            }
        };

        tracing::trace!(%player_id, room = ?cmd.room_code(), "command received");
        dispatch(&state, player_id, &tx, cmd).await;
    }

    writer.abort();
    // _guard drops here → the player leaves their room.
    Ok(())
}

/// Forwards events from rooms (and the gateway itself) to the socket.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
    cmd: ClientCommand,
) {
    match cmd {
        ClientCommand::CreateRoom { name, is_public } => {
            let mut registry = state.registry.lock().await;
            registry
                .create_room(player_id, &name, is_public, tx.clone())
                .await;
        }

        ClientCommand::ListPublicRooms => {
            // The rooms are queried after the registry lock is released.
            let public = state.registry.lock().await.public_rooms();
            let rooms = list_public(public).await;
            let _ = tx.send(ServerEvent::RoomList { rooms });
        }

        ClientCommand::JoinRoom { code, name } => {
            let result = state
                .registry
                .lock()
                .await
                .join_room(player_id, &code, &name, tx.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, room = %code, error = %e, "join rejected");
                send_error(tx, &e);
            }
        }

        ClientCommand::LeaveRoom { code } => {
            let result = state
                .registry
                .lock()
                .await
                .leave_room(player_id, &code)
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, room = %code, error = %e, "leave room failed");
            }
        }

        other => {
            let Some((code, action)) = player_action(other) else {
                return;
            };
            // Release the registry lock before talking to the room.
            let (handle, member) = {
                let registry = state.registry.lock().await;
                let member = registry.player_room(player_id) == Some(&code);
                (registry.get(&code), member)
            };
            let result = match handle {
                // The room only reaches its members, so answer here.
                Some(_) if !member && matches!(action, PlayerAction::StartGame) => {
                    Err(RoomError::NotHost)
                }
                Some(handle) => handle.act(player_id, action).await,
                None => Err(RoomError::NotFound(code)),
            };
            if let Err(e) = result {
                send_error(tx, &e);
            }
        }
    }
}

/// Splits an in-room command into its target room and action.
fn player_action(cmd: ClientCommand) -> Option<(RoomCode, PlayerAction)> {
    let routed = match cmd {
        ClientCommand::ToggleReady { code } => (code, PlayerAction::ToggleReady),
        ClientCommand::StartGame { code } => (code, PlayerAction::StartGame),
        ClientCommand::SubmitInitialPrompt { code, prompt } => {
            (code, PlayerAction::SubmitPrompt { text: prompt })
        }
        ClientCommand::SubmitRound {
            code,
            slot_index,
            payload,
        } => (
            code,
            PlayerAction::SubmitRound {
                slot_index,
                payload,
            },
        ),
        ClientCommand::Vote {
            code,
            slot,
            choice_index,
        } => (code, PlayerAction::Vote { slot, choice_index }),
        ClientCommand::CreateRoom { .. }
        | ClientCommand::ListPublicRooms
        | ClientCommand::JoinRoom { .. }
        | ClientCommand::LeaveRoom { .. } => return None,
    };
    Some(routed)
}

/// Queues an `errorMsg` for the player.
fn send_error(tx: &PlayerSender, err: &RoomError) {
    let _ = tx.send(ServerEvent::error(err));
}
