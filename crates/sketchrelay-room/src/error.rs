//! Error types for the room layer.

use sketchrelay_protocol::RoomCode;

/// Errors that can occur during room operations.
///
/// The `Display` text of each variant is what the player sees in the
/// `errorMsg` event, so keep it readable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room has left the lobby; nobody can join or start it again.
    #[error("the game in room {0} has already started")]
    GameAlreadyStarted(RoomCode),

    /// Only the host may start the game.
    #[error("only the host can start the game")]
    NotHost,

    /// Not enough players to start.
    #[error("need at least {need} players to start, have {have}")]
    InsufficientPlayers { have: usize, need: usize },

    /// The lobby is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// A submission grid access outside `rounds × slots`.
    #[error("slot {slot} of round {round} is out of range")]
    SlotOutOfRange { round: usize, slot: usize },

    /// The room's actor is gone or its command queue is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
