//! Room engine for SketchRelay.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`RelayGame`] and turn timer. The [`RoomRegistry`] creates rooms,
//! routes players to them and forgets them when they empty.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: room codes, membership, public listing
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RelayGame`]: the synchronous lobby → prompts → relay → reveal
//!   state machine
//! - [`rotation`], [`reveal`]: pure slot arithmetic and chain assembly
//! - [`SubmissionStore`], [`VoteTally`]: per-game data

mod config;
mod error;
mod game;
mod prompts;
mod registry;
pub mod reveal;
mod room;
pub mod rotation;
mod store;
mod votes;

pub use config::RoomConfig;
pub use error::RoomError;
pub use game::{Deadline, Outbox, Player, RelayGame};
pub use prompts::{fallback_prompt, prompt_or_fallback};
pub use registry::{CODE_ALPHABET, CODE_LENGTH, RoomRegistry, generate_code, list_public};
pub use room::{LeaveOutcome, PlayerAction, PlayerSender, RoomHandle, RoomInfo};
pub use store::{Submission, SubmissionStore};
pub use votes::VoteTally;
