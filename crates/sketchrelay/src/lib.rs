//! # SketchRelay
//!
//! Server for a real-time relay drawing game: players in a room each draw
//! a prompt, pass it on to be captioned, pass the caption on to be drawn,
//! and so on until every chain has visited every player. Then the chains
//! are revealed and voted on.
//!
//! Clients speak JSON over WebSocket. Each room is a Tokio actor owning
//! its game and turn timer (see [`sketchrelay_room`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchrelay::prelude::*;
//!
//! # async fn start() -> Result<(), ServerError> {
//! let config = ServerConfig::load()?;
//! let server = SketchRelayServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_BIND, RoomSettings, ServerConfig};
pub use error::ServerError;
pub use server::{SketchRelayServer, SketchRelayServerBuilder};

pub mod prelude {
    pub use crate::{
        RoomSettings, ServerConfig, ServerError, SketchRelayServer,
        SketchRelayServerBuilder,
    };
    pub use sketchrelay_protocol::{
        Chain, ClientCommand, Codec, Content, ContentKind, Expecting,
        JsonCodec, Phase, PlayerId, RoomCode, RoundPayload, ServerEvent,
    };
    pub use sketchrelay_room::{RoomConfig, RoomError};
}
