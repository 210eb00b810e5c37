//! Value types shared by commands and events.
//!
//! Everything here travels on the wire, so the serde attributes are part of
//! the contract with the browser client: camelCase field names, lower-case
//! enum tags.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Players have no account: the id is the id of the connection they
/// arrived on, so it lives exactly as long as that connection.
/// `#[serde(transparent)]` puts it on the wire as a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short join code that identifies a room, e.g. `"K7QXM"`.
///
/// Codes are case-insensitive for humans typing them in: anything that
/// comes off the wire is trimmed and upper-cased on the way in, so
/// `" k7qxm"` and `"K7QXM"` name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a code, normalizing case and surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// The normalized code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is addressed to.
///
/// The room state machine returns `(Recipient, ServerEvent)` pairs and the
/// room actor fans them out to the matching connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room.
    All,
    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are strictly ordered and never go backwards:
///
/// ```text
/// Lobby → GatheringPrompts → Playing → Reveal
/// ```
///
/// `Reveal` is terminal: the room only accepts votes from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Lobby,
    GatheringPrompts,
    Playing,
    Reveal,
}

impl Phase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lobby => "lobby",
            Self::GatheringPrompts => "gatheringPrompts",
            Self::Playing => "playing",
            Self::Reveal => "reveal",
        })
    }
}

// ---------------------------------------------------------------------------
// Relay content
// ---------------------------------------------------------------------------

/// What a player is asked to produce this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expecting {
    Draw,
    Write,
}

/// How a piece of relay content should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// An original prompt typed in during prompt gathering.
    Prompt,
    /// A drawing; `data` is an opaque image string (usually a data URL).
    Image,
    /// A caption of a drawing.
    Text,
    /// The turn timer expired before anyone submitted this cell.
    Skipped,
}

/// One piece of relay content: what a player is shown at round start, and
/// one link of a reveal chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Content {
    /// A prompt item.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Prompt,
            data: text.into(),
            thumbnail: None,
        }
    }

    /// Placeholder for a cell nobody filled before the deadline.
    pub fn skipped() -> Self {
        Self {
            kind: ContentKind::Skipped,
            data: String::new(),
            thumbnail: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A player as shown in `roomUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

/// A summary of a public lobby returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub code: RoomCode,
    pub player_count: usize,
}

/// Who a reveal chain belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOwner {
    pub name: String,
}

/// The full relay for one slot: the original prompt followed by every
/// transformation of it, in round order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub slot: usize,
    pub owner: ChainOwner,
    pub chain: Vec<Content>,
}
