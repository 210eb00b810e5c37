//! Server configuration.
//!
//! Loaded with the `config` crate from built-in defaults, an optional
//! `sketchrelay.toml` in the working directory, and `SKETCHRELAY__*`
//! environment variables, in that order of precedence:
//!
//! ```text
//! SKETCHRELAY__BIND=127.0.0.1:4000
//! SKETCHRELAY__ROOMS__MAX_PLAYERS=8
//! SKETCHRELAY__ROOMS__AUTO_ADVANCE=false
//! ```

use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sketchrelay_room::RoomConfig;

use crate::ServerError;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Top-level server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind: String,
    /// Settings applied to every room.
    pub rooms: RoomSettings,
}

/// Room settings as they appear in configuration. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub round_time_secs: u64,
    pub round_grace_secs: u64,
    pub prompt_time_secs: u64,
    pub auto_advance: bool,
    pub channel_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            rooms: RoomSettings::default(),
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        let room = RoomConfig::default();
        Self {
            min_players: room.min_players,
            max_players: room.max_players,
            round_time_secs: room.round_time.as_secs(),
            round_grace_secs: room.round_grace.as_secs(),
            prompt_time_secs: room.prompt_time.as_secs(),
            auto_advance: room.auto_advance,
            channel_size: room.channel_size,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then `sketchrelay.toml` if present, then the
    /// environment.
    pub fn load() -> Result<Self, ServerError> {
        let settings = defaults()?
            .add_source(File::with_name("sketchrelay").required(false))
            .add_source(Environment::with_prefix("SKETCHRELAY").separator("__"))
            .build()?;
        Self::from_settings(settings)
    }

    /// Loads defaults overridden by a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ServerError> {
        let settings = defaults()?
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, ServerError> {
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no room could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rooms = &self.rooms;
        if self.bind.trim().is_empty() {
            return Err(invalid("bind address cannot be empty"));
        }
        if rooms.min_players < 2 {
            return Err(invalid("rooms.min_players must be at least 2"));
        }
        if rooms.max_players < rooms.min_players {
            return Err(invalid(
                "rooms.max_players must be at least rooms.min_players",
            ));
        }
        if rooms.round_time_secs == 0 || rooms.prompt_time_secs == 0 {
            return Err(invalid("round and prompt times must be positive"));
        }
        if rooms.channel_size == 0 {
            return Err(invalid("rooms.channel_size must be positive"));
        }
        Ok(())
    }

    /// The [`RoomConfig`] every room of this server uses.
    pub fn room_config(&self) -> RoomConfig {
        let rooms = &self.rooms;
        RoomConfig {
            min_players: rooms.min_players,
            max_players: rooms.max_players,
            round_time: Duration::from_secs(rooms.round_time_secs),
            round_grace: Duration::from_secs(rooms.round_grace_secs),
            prompt_time: Duration::from_secs(rooms.prompt_time_secs),
            auto_advance: rooms.auto_advance,
            channel_size: rooms.channel_size,
        }
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let rooms = RoomSettings::default();
    Config::builder()
        .set_default("bind", DEFAULT_BIND)?
        .set_default("rooms.min_players", rooms.min_players as u64)?
        .set_default("rooms.max_players", rooms.max_players as u64)?
        .set_default("rooms.round_time_secs", rooms.round_time_secs)?
        .set_default("rooms.round_grace_secs", rooms.round_grace_secs)?
        .set_default("rooms.prompt_time_secs", rooms.prompt_time_secs)?
        .set_default("rooms.auto_advance", rooms.auto_advance)?
        .set_default("rooms.channel_size", rooms.channel_size as u64)
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Message(msg.to_string())
}
