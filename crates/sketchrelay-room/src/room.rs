//! Room actor: one Tokio task per room, owning its [`RelayGame`] and turn
//! timer.
//!
//! Everything that touches a room goes through its bounded command
//! channel. The timer is a second branch of the actor's `select!`, so a
//! deadline firing is serialized with player commands and never races
//! them.

use std::collections::HashMap;

use sketchrelay_protocol::{
    Phase, PlayerId, Recipient, RoomCode, RoundPayload, ServerEvent,
};
use sketchrelay_timer::PhaseTimer;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::game::{Deadline, Outbox, RelayGame};
use crate::RoomError;

/// Channel delivering server events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// In-room actions a member can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    ToggleReady,
    StartGame,
    SubmitPrompt { text: String },
    SubmitRound { slot_index: usize, payload: RoundPayload },
    Vote { slot: usize, choice_index: u32 },
}

/// Result of asking a room to drop a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player was not in the room.
    NotMember,
    /// The player was removed; `remaining` players are left.
    Left { remaining: usize },
}

pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<LeaveOutcome>,
    },
    Play {
        player_id: PlayerId,
        action: PlayerAction,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Room metadata, without the game itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub player_count: usize,
    pub max_players: usize,
    pub is_public: bool,
    /// Whether a turn deadline is currently pending.
    pub timer_armed: bool,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    is_public: bool,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Adds a player to the room's lobby.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            name: name.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a player. Removing a non-member is not an error.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Delivers a gameplay action (fire-and-forget). Rejections reach the
    /// player as an `errorMsg` event.
    pub async fn act(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Play { player_id, action }).await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Stops the actor. Its pending deadline dies with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

struct RoomActor {
    game: RelayGame,
    senders: HashMap<PlayerId, PlayerSender>,
    timer: PhaseTimer<Deadline>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let code = self.game.code().clone();
        info!(room = %code, "room actor started");

        let created = self.game.created();
        self.dispatch(created);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                expiry = self.timer.expired() => {
                    debug!(room = %code, deadline = ?expiry.key, late_by = ?expiry.late_by, "deadline fired");
                    let out = self.game.expire(expiry.key);
                    self.dispatch(out);
                }
            }

            if self.game.is_empty() {
                break;
            }
            self.sync_timer();
        }

        let stats = self.timer.stats();
        info!(
            room = %code,
            deadlines_fired = stats.fired,
            deadlines_cancelled = stats.cancelled,
            "room actor stopped"
        );
    }

    /// Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, &name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let outcome = self.handle_leave(player_id);
                let _ = reply.send(outcome);
            }
            RoomCommand::Play { player_id, action } => {
                self.handle_play(player_id, action);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.game.code(), "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let out = self.game.join(player_id, name)?;
        self.senders.insert(player_id, sender);
        self.dispatch(out);
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> LeaveOutcome {
        let Some(out) = self.game.leave(player_id) else {
            return LeaveOutcome::NotMember;
        };
        self.senders.remove(&player_id);
        self.dispatch(out);
        LeaveOutcome::Left {
            remaining: self.game.players().len(),
        }
    }

    fn handle_play(&mut self, player_id: PlayerId, action: PlayerAction) {
        if !self.game.contains(player_id) {
            warn!(
                room = %self.game.code(),
                %player_id,
                "action from non-member, ignoring"
            );
            return;
        }

        let result = match action {
            PlayerAction::ToggleReady => Ok(self.game.toggle_ready(player_id)),
            PlayerAction::StartGame => self.game.start(player_id),
            PlayerAction::SubmitPrompt { text } => {
                Ok(self.game.submit_prompt(player_id, &text))
            }
            PlayerAction::SubmitRound {
                slot_index,
                payload,
            } => Ok(self.game.submit_round(player_id, slot_index, payload)),
            PlayerAction::Vote { slot, choice_index } => {
                Ok(self.game.vote(player_id, slot, choice_index))
            }
        };

        match result {
            Ok(out) => self.dispatch(out),
            Err(e) => {
                debug!(room = %self.game.code(), %player_id, error = %e, "action rejected");
                self.send_to(player_id, ServerEvent::error(&e));
            }
        }
    }

    /// Keeps the timer armed with exactly the game's current deadline.
    fn sync_timer(&mut self) {
        match self.game.deadline() {
            Some(key) if self.timer.armed_key() == Some(key) => {}
            Some(key) => {
                let after = self.game.deadline_duration(key);
                debug!(room = %self.game.code(), deadline = ?key, ?after, "arming deadline");
                self.timer.arm(key, after);
            }
            None => {
                if let Some(key) = self.timer.cancel() {
                    debug!(room = %self.game.code(), deadline = ?key, "deadline cancelled");
                }
            }
        }
    }

    fn dispatch(&self, out: Outbox) {
        for (recipient, event) in out {
            match recipient {
                Recipient::All => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, event),
            }
        }
    }

    /// Silently drops the event if the player's connection is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.game.code().clone(),
            phase: self.game.phase(),
            player_count: self.game.players().len(),
            max_players: self.game.config().max_players,
            is_public: self.game.is_public(),
            timer_armed: self.timer.is_armed(),
        }
    }
}

/// Spawns a room actor with `host` already seated, and returns its handle.
///
/// The host receives `roomCreated` and the first `roomUpdate` as soon as
/// the actor starts.
pub(crate) fn spawn_room(
    game: RelayGame,
    host: PlayerId,
    host_sender: PlayerSender,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(game.config().channel_size.max(1));
    let handle = RoomHandle {
        code: game.code().clone(),
        is_public: game.is_public(),
        sender: tx,
    };

    let mut senders = HashMap::new();
    senders.insert(host, host_sender);
    let actor = RoomActor {
        game,
        senders,
        timer: PhaseTimer::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}

