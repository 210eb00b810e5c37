//! Room configuration.

use std::time::Duration;

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Maximum players allowed in the lobby.
    pub max_players: usize,

    /// Drawing/writing time advertised to clients in `roundStart.timeSec`.
    pub round_time: Duration,

    /// Extra time the server waits past `round_time` before auto-advancing,
    /// so a client submitting on its own timeout still lands in time.
    pub round_grace: Duration,

    /// How long prompt gathering may take before missing prompts are
    /// filled from the fallback pool.
    pub prompt_time: Duration,

    /// Whether the server enforces deadlines at all. When `false` a round
    /// only advances once every slot is submitted.
    pub auto_advance: bool,

    /// Command queue capacity of each room actor.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 16,
            round_time: Duration::from_secs(60),
            round_grace: Duration::from_secs(10),
            prompt_time: Duration::from_secs(90),
            auto_advance: true,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// - `min_players` is at least 2: a relay of one is not a game.
    /// - `max_players` is at least `min_players`.
    /// - `channel_size` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.min_players < 2 {
            tracing::warn!(min_players = self.min_players, "min_players below 2, clamping");
            self.min_players = 2;
        }
        if self.max_players < self.min_players {
            tracing::warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, clamping"
            );
            self.max_players = self.min_players;
        }
        self.channel_size = self.channel_size.max(1);
        self
    }

    /// Server-side deadline for one relay round.
    pub fn round_deadline(&self) -> Duration {
        self.round_time + self.round_grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 16);
        assert!(config.auto_advance);
        assert_eq!(config.round_deadline(), Duration::from_secs(70));
    }

    #[test]
    fn test_validated_clamps_player_limits() {
        let config = RoomConfig {
            min_players: 0,
            max_players: 1,
            channel_size: 0,
            ..RoomConfig::default()
        }
        .validated();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 2);
        assert_eq!(config.channel_size, 1);
    }

    #[test]
    fn test_validated_keeps_sane_values() {
        let config = RoomConfig::default();
        assert_eq!(config.clone().validated(), config);
    }
}
