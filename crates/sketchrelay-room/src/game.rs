//! The relay game state machine for one room.
//!
//! [`RelayGame`] is plain synchronous state: every command handler mutates
//! it and returns the events to send as `(Recipient, ServerEvent)` pairs.
//! The room actor (see `room.rs`) owns one, feeds it commands one at a
//! time and fans the events out, so nothing here needs locking or async.
//!
//! # Roster
//!
//! `startGame` takes a snapshot of the player list, the roster. From then
//! on slot arithmetic, round-start delivery and reveal owners all use
//! roster indices. Players leaving mid-game are removed from `players`
//! (so host reassignment and `roomUpdate` stay truthful) but never from
//! the roster: their slot keeps its index and, with auto-advance on, the
//! turn timer covers their missing turns.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use sketchrelay_protocol::{
    Phase, PlayerId, PlayerView, Recipient, RoomCode, RoundPayload,
    ServerEvent,
};
use tracing::{debug, info, warn};

use crate::prompts::{fallback_prompt, prompt_or_fallback};
use crate::reveal::build_chains;
use crate::rotation::{assignments, slot_index};
use crate::{RoomConfig, RoomError, Submission, SubmissionStore, VoteTally};

/// Events produced by one command, with their addressees.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// Longest display name kept, in characters.
const MAX_NAME_CHARS: usize = 24;

/// Identifies the phase a timer deadline was armed for. A deadline whose
/// key no longer matches [`RelayGame::deadline`] is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Deadline {
    pub phase: Phase,
    pub round: usize,
}

/// A player currently in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

#[derive(Debug, Clone)]
struct Seat {
    id: PlayerId,
    name: String,
}

/// One room's game state.
pub struct RelayGame {
    code: RoomCode,
    is_public: bool,
    config: RoomConfig,
    players: Vec<Player>,
    host: Option<PlayerId>,
    phase: Phase,
    roster: Vec<Seat>,
    prompts: Vec<Option<String>>,
    round: usize,
    n_rounds: usize,
    submissions: SubmissionStore,
    votes: VoteTally,
    rng: StdRng,
}

impl RelayGame {
    /// Opens a lobby with `host` as its only player.
    pub fn new(
        code: RoomCode,
        is_public: bool,
        config: RoomConfig,
        host: PlayerId,
        host_name: &str,
    ) -> Self {
        Self {
            code,
            is_public,
            config,
            players: vec![Player {
                id: host,
                name: normalize_name(host_name),
                ready: false,
            }],
            host: Some(host),
            phase: Phase::Lobby,
            roster: Vec::new(),
            prompts: Vec::new(),
            round: 0,
            n_rounds: 0,
            submissions: SubmissionStore::default(),
            votes: VoteTally::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the random source, for reproducible fallback prompts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Prompts by slot. Empty in the lobby; `None` entries are still
    /// being gathered.
    pub fn slot_prompts(&self) -> &[Option<String>] {
        &self.prompts
    }

    pub fn submissions(&self) -> &SubmissionStore {
        &self.submissions
    }

    pub fn votes(&self) -> &VoteTally {
        &self.votes
    }

    /// Slot index of `id` fixed at game start.
    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.roster.iter().position(|s| s.id == id)
    }

    // -----------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------

    /// Events announcing a freshly created room to its host.
    pub fn created(&self) -> Outbox {
        let mut out = Vec::with_capacity(2);
        if let Some(host) = self.host {
            out.push((
                Recipient::Player(host),
                ServerEvent::RoomCreated {
                    code: self.code.clone(),
                },
            ));
        }
        out.push((Recipient::All, self.room_update()));
        out
    }

    /// Adds a player to the lobby. Joining twice is harmless.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: &str,
    ) -> Result<Outbox, RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::GameAlreadyStarted(self.code.clone()));
        }
        if !self.contains(id) {
            if self.players.len() >= self.config.max_players {
                return Err(RoomError::RoomFull(self.code.clone()));
            }
            self.players.push(Player {
                id,
                name: normalize_name(name),
                ready: false,
            });
            if self.host.is_none() {
                self.host = Some(id);
            }
            info!(room = %self.code, player_id = %id, players = self.players.len(), "player joined");
        }

        let name = self.name_of(id).unwrap_or_default();
        Ok(vec![
            (
                Recipient::Player(id),
                ServerEvent::Joined {
                    code: self.code.clone(),
                },
            ),
            (Recipient::All, self.room_update()),
            (Recipient::All, ServerEvent::system(format!("{name} joined"))),
        ])
    }

    /// Removes a player. `None` if they were not in the room.
    ///
    /// If the host leaves, the first remaining player becomes host.
    pub fn leave(&mut self, id: PlayerId) -> Option<Outbox> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let gone = self.players.remove(index);
        info!(
            room = %self.code,
            player_id = %id,
            players = self.players.len(),
            phase = %self.phase,
            "player left"
        );

        let mut out = Vec::new();
        if self.players.is_empty() {
            self.host = None;
            return Some(out);
        }

        out.push((
            Recipient::All,
            ServerEvent::system(format!("{} left", gone.name)),
        ));
        if self.host == Some(id) {
            let next = &self.players[0];
            self.host = Some(next.id);
            info!(room = %self.code, host = %next.id, "host reassigned");
            out.push((
                Recipient::All,
                ServerEvent::system(format!("{} is now the host", next.name)),
            ));
        }
        out.push((Recipient::All, self.room_update()));
        Some(out)
    }

    /// Flips a lobby player's ready flag.
    pub fn toggle_ready(&mut self, id: PlayerId) -> Outbox {
        if self.phase != Phase::Lobby {
            debug!(room = %self.code, player_id = %id, "toggleReady outside lobby, ignoring");
            return Vec::new();
        }
        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            return Vec::new();
        };
        player.ready = !player.ready;
        vec![(Recipient::All, self.room_update())]
    }

    /// Host-only: freezes the roster and asks everyone for a prompt.
    pub fn start(&mut self, id: PlayerId) -> Result<Outbox, RoomError> {
        if self.phase != Phase::Lobby {
            return Err(RoomError::GameAlreadyStarted(self.code.clone()));
        }
        if self.host != Some(id) {
            return Err(RoomError::NotHost);
        }
        if self.players.len() < self.config.min_players {
            return Err(RoomError::InsufficientPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }

        self.roster = self
            .players
            .iter()
            .map(|p| Seat {
                id: p.id,
                name: p.name.clone(),
            })
            .collect();
        self.prompts = vec![None; self.roster.len()];
        self.phase = Phase::GatheringPrompts;
        info!(room = %self.code, players = self.roster.len(), "game started, gathering prompts");

        Ok(vec![
            (Recipient::All, self.room_update()),
            (Recipient::All, ServerEvent::RequestInitialPrompts),
        ])
    }

    // -----------------------------------------------------------------
    // Prompt gathering
    // -----------------------------------------------------------------

    /// Records a player's prompt for their own slot. Blank text gets a
    /// fallback prompt. Starts round 0 once every slot has one.
    pub fn submit_prompt(&mut self, id: PlayerId, text: &str) -> Outbox {
        if self.phase != Phase::GatheringPrompts {
            debug!(room = %self.code, player_id = %id, phase = %self.phase, "prompt outside gathering, ignoring");
            return Vec::new();
        }
        let Some(slot) = self.seat_of(id) else {
            return Vec::new();
        };
        self.prompts[slot] = Some(prompt_or_fallback(text, &mut self.rng));

        let received = self.prompts.iter().filter(|p| p.is_some()).count();
        if received < self.prompts.len() {
            return vec![(
                Recipient::All,
                ServerEvent::system(format!(
                    "{received}/{} prompts in",
                    self.prompts.len()
                )),
            )];
        }
        self.begin_playing()
    }

    fn begin_playing(&mut self) -> Outbox {
        let n = self.roster.len();
        self.n_rounds = n;
        self.round = 0;
        self.submissions = SubmissionStore::new(n, n);
        self.phase = Phase::Playing;
        info!(room = %self.code, n_rounds = n, "all prompts in, relay begins");

        let mut out = vec![(Recipient::All, self.room_update())];
        out.extend(self.distribute_round());
        out
    }

    // -----------------------------------------------------------------
    // Playing
    // -----------------------------------------------------------------

    /// One `roundStart` per roster member for the current round.
    fn distribute_round(&self) -> Outbox {
        let prompts: Vec<&str> = self
            .prompts
            .iter()
            .map(|p| p.as_deref().unwrap_or_default())
            .collect();
        assignments(self.round, &prompts, &self.submissions)
            .into_iter()
            .map(|order| {
                (
                    Recipient::Player(self.roster[order.player].id),
                    ServerEvent::RoundStart {
                        round: self.round,
                        n_rounds: self.n_rounds,
                        expecting: order.expecting,
                        slot_index: order.slot,
                        content: order.content,
                        time_sec: self.config.round_time.as_secs(),
                    },
                )
            })
            .collect()
    }

    /// Stores a player's work for the current round.
    ///
    /// Ignored unless `slot` is the caller's assignment this round.
    /// Resubmitting before the round completes overwrites.
    pub fn submit_round(
        &mut self,
        id: PlayerId,
        slot: usize,
        payload: RoundPayload,
    ) -> Outbox {
        if self.phase != Phase::Playing {
            debug!(room = %self.code, player_id = %id, phase = %self.phase, "submission outside play, ignoring");
            return Vec::new();
        }
        let Some(seat) = self.seat_of(id) else {
            return Vec::new();
        };
        let assigned = slot_index(seat, self.round, self.n_rounds);
        if slot != assigned {
            debug!(
                room = %self.code,
                player_id = %id,
                slot,
                assigned,
                round = self.round,
                "submission for someone else's slot, ignoring"
            );
            return Vec::new();
        }

        let cell = Submission {
            data: payload.data,
            thumbnail: payload.thumbnail,
            source: id,
        };
        if let Err(e) = self.submissions.set(self.round, slot, cell) {
            warn!(room = %self.code, error = %e, "submission grid rejected write");
            return Vec::new();
        }

        if self.submissions.is_round_complete(self.round) {
            return self.advance_round();
        }
        vec![(
            Recipient::All,
            ServerEvent::system(format!(
                "{}/{} submitted",
                self.submissions.filled(self.round),
                self.n_rounds
            )),
        )]
    }

    fn advance_round(&mut self) -> Outbox {
        self.round += 1;
        if self.round < self.n_rounds {
            debug!(room = %self.code, round = self.round, "next round");
            let mut out = vec![(Recipient::All, self.room_update())];
            out.extend(self.distribute_round());
            return out;
        }

        self.phase = Phase::Reveal;
        self.votes.reset();
        let owners: Vec<&str> = self.roster.iter().map(|s| s.name.as_str()).collect();
        let prompts: Vec<&str> = self
            .prompts
            .iter()
            .map(|p| p.as_deref().unwrap_or_default())
            .collect();
        let chains = build_chains(&owners, &prompts, &self.submissions);
        info!(room = %self.code, chains = chains.len(), "relay finished, revealing");

        vec![
            (Recipient::All, self.room_update()),
            (Recipient::All, ServerEvent::Reveal { chains }),
        ]
    }

    // -----------------------------------------------------------------
    // Reveal
    // -----------------------------------------------------------------

    /// Counts a vote and broadcasts the slot's new totals.
    pub fn vote(&mut self, id: PlayerId, slot: usize, choice: u32) -> Outbox {
        if self.phase != Phase::Reveal {
            debug!(room = %self.code, player_id = %id, "vote outside reveal, ignoring");
            return Vec::new();
        }
        if slot >= self.n_rounds {
            debug!(room = %self.code, player_id = %id, slot, "vote for unknown slot, ignoring");
            return Vec::new();
        }
        let counts = self.votes.vote(slot, choice).clone();
        vec![(Recipient::All, ServerEvent::VoteUpdate { slot, counts })]
    }

    // -----------------------------------------------------------------
    // Deadlines
    // -----------------------------------------------------------------

    /// The deadline the room timer should currently be armed with.
    pub fn deadline(&self) -> Option<Deadline> {
        if !self.config.auto_advance {
            return None;
        }
        match self.phase {
            Phase::GatheringPrompts | Phase::Playing => Some(Deadline {
                phase: self.phase,
                round: self.round,
            }),
            Phase::Lobby | Phase::Reveal => None,
        }
    }

    /// How long after arming a deadline should fire.
    pub fn deadline_duration(&self, deadline: Deadline) -> Duration {
        match deadline.phase {
            Phase::GatheringPrompts => self.config.prompt_time,
            _ => self.config.round_deadline(),
        }
    }

    /// Handles a fired deadline. Stale keys are ignored.
    ///
    /// Prompt gathering fills every missing prompt from the fallback
    /// pool; a relay round advances with its missing cells left empty.
    pub fn expire(&mut self, deadline: Deadline) -> Outbox {
        if self.deadline() != Some(deadline) {
            debug!(room = %self.code, ?deadline, "stale deadline, ignoring");
            return Vec::new();
        }
        match self.phase {
            Phase::GatheringPrompts => {
                let mut filled = 0;
                for prompt in self.prompts.iter_mut().filter(|p| p.is_none()) {
                    *prompt = Some(fallback_prompt(&mut self.rng).to_string());
                    filled += 1;
                }
                info!(room = %self.code, filled, "prompt time expired");
                let mut out = vec![(
                    Recipient::All,
                    ServerEvent::system(format!(
                        "Time's up! {filled} prompt(s) picked for you"
                    )),
                )];
                out.extend(self.begin_playing());
                out
            }
            Phase::Playing => {
                let missing =
                    self.n_rounds - self.submissions.filled(self.round);
                info!(room = %self.code, round = self.round, missing, "round time expired");
                let mut out = vec![(
                    Recipient::All,
                    ServerEvent::system(format!(
                        "Time's up! Moving on without {missing} submission(s)"
                    )),
                )];
                out.extend(self.advance_round());
                out
            }
            Phase::Lobby | Phase::Reveal => Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// The `roomUpdate` event describing the current state.
    pub fn room_update(&self) -> ServerEvent {
        ServerEvent::RoomUpdate {
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    ready: p.ready,
                })
                .collect(),
            host_id: self.host,
            state: self.phase,
            round: self.round,
            n_rounds: self.n_rounds,
        }
    }

    fn name_of(&self, id: PlayerId) -> Option<String> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }
}

/// Trims, caps the length, and substitutes `"Player"` for blank names.
fn normalize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    if name.is_empty() {
        "Player".to_string()
    } else {
        name
    }
}
