//! Wire protocol for SketchRelay.
//!
//! - **Messages** ([`ClientCommand`], [`ServerEvent`]) — the frames that
//!   travel between browser and server.
//! - **Types** ([`RoomCode`], [`Phase`], [`Content`], …) — the values those
//!   frames carry.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are turned
//!   into bytes and back.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! engine. It knows nothing about connections or game rules.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand) → Room (game rules)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{ClientCommand, RoundPayload, ServerEvent};
pub use types::{
    Chain, ChainOwner, Content, ContentKind, Expecting, Phase, PlayerId,
    PlayerView, Recipient, RoomCode, RoomListEntry,
};
