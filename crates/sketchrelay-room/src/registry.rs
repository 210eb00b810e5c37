//! Room registry: creates rooms, tracks which player is in which room,
//! and forgets rooms once they empty out.

use std::collections::HashMap;

use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sketchrelay_protocol::{Phase, PlayerId, RoomCode, RoomListEntry};
use tracing::{debug, info, warn};

use crate::game::RelayGame;
use crate::room::spawn_room;
use crate::{LeaveOutcome, PlayerSender, RoomConfig, RoomError, RoomHandle};

/// Characters room codes are drawn from. No `I`, `O`, `0` or `1`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a room code.
pub const CODE_LENGTH: usize = 5;

/// Draws a random room code. Uniqueness is the caller's job.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}

/// Queries `rooms` concurrently and returns those still in the lobby,
/// sorted by code. Rooms that have gone away are skipped.
pub async fn list_public(rooms: Vec<RoomHandle>) -> Vec<RoomListEntry> {
    let infos = join_all(rooms.iter().map(|h| h.get_info())).await;

    let mut entries: Vec<RoomListEntry> = rooms
        .iter()
        .zip(infos)
        .filter_map(|(handle, info)| match info {
            Ok(info) if info.phase == Phase::Lobby => Some(RoomListEntry {
                code: info.code,
                player_count: info.player_count,
            }),
            Ok(_) => None,
            Err(e) => {
                debug!(room = %handle.code(), error = %e, "skipping unavailable room");
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.code.cmp(&b.code));
    entries
}

/// All live rooms, plus the `player → room` index.
///
/// A player is in at most one room: creating or joining a room first
/// takes them out of the one they are in.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    player_rooms: HashMap<PlayerId, RoomCode>,
    config: RoomConfig,
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms all use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config: config.validated(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Like [`RoomRegistry::new`] with a fixed seed for room codes.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a new lobby with `player` as its host and only member.
    pub async fn create_room(
        &mut self,
        player: PlayerId,
        name: &str,
        is_public: bool,
        sender: PlayerSender,
    ) -> RoomCode {
        self.disconnect(player).await;

        let code = loop {
            let candidate = generate_code(&mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!(code = %candidate, "room code collision, retrying");
        };

        let game = RelayGame::new(
            code.clone(),
            is_public,
            self.config.clone(),
            player,
            name,
        );
        let handle = spawn_room(game, player, sender);
        self.rooms.insert(code.clone(), handle);
        self.player_rooms.insert(player, code.clone());
        info!(room = %code, host = %player, is_public, rooms = self.rooms.len(), "room created");
        code
    }

    /// Puts `player` into the lobby of room `code`.
    ///
    /// The room's own actor decides whether the join is accepted, and the
    /// player leaves their previous room only once it is. A failed join
    /// leaves them where they were, even if the game starts while the
    /// join is in flight. Rejoining the room they are already in is
    /// harmless.
    pub async fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        handle.join(player, name, sender).await?;

        let previous = self.player_rooms.get(&player).cloned();
        if let Some(previous) = previous.filter(|prev| prev != code) {
            if let Err(e) = self.leave_room(player, &previous).await {
                debug!(room = %previous, %player, error = %e, "leave of previous room failed");
            }
        }
        self.player_rooms.insert(player, code.clone());
        Ok(())
    }

    /// Takes `player` out of room `code`. A no-op if they are not in it.
    pub async fn leave_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        if self.player_rooms.get(&player) != Some(code) {
            debug!(room = %code, %player, "leave for a room the player is not in");
            return Ok(());
        }
        self.player_rooms.remove(&player);

        let Some(handle) = self.rooms.get(code).cloned() else {
            return Ok(());
        };
        match handle.leave(player).await {
            Ok(LeaveOutcome::Left { remaining: 0 }) => {
                self.forget(code);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                // The actor is gone, so the room is too.
                warn!(room = %code, error = %e, "room unavailable during leave");
                self.forget(code);
                Err(e)
            }
        }
    }

    /// Removes `player` from whatever room they are in, if any.
    pub async fn disconnect(&mut self, player: PlayerId) {
        let Some(code) = self.player_rooms.get(&player).cloned() else {
            return;
        };
        if let Err(e) = self.leave_room(player, &code).await {
            debug!(room = %code, %player, error = %e, "leave on disconnect failed");
        }
    }

    /// Handles of every public room, in any phase.
    ///
    /// Pass them to [`list_public`] once the registry is no longer
    /// borrowed.
    pub fn public_rooms(&self) -> Vec<RoomHandle> {
        self.rooms
            .values()
            .filter(|h| h.is_public())
            .cloned()
            .collect()
    }

    /// Handle to a live room.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).cloned()
    }

    /// Shuts a room down and forgets it and its members.
    pub async fn destroy(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        self.forget(code);
        Ok(())
    }

    /// The room `player` is in.
    pub fn player_room(&self, player: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget(&mut self, code: &RoomCode) {
        if self.rooms.remove(code).is_some() {
            self.player_rooms.retain(|_, room| room != code);
            info!(room = %code, rooms = self.rooms.len(), "room destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_codes_use_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for c in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&c));
        }
        let unique: HashSet<u8> = CODE_ALPHABET.iter().copied().collect();
        assert_eq!(unique.len(), CODE_ALPHABET.len());
    }

    #[test]
    fn test_registry_clamps_config() {
        let registry = RoomRegistry::new(RoomConfig {
            min_players: 0,
            ..RoomConfig::default()
        });
        assert_eq!(registry.config().min_players, 2);
        assert_eq!(registry.room_count(), 0);
    }
}
