//! Commands clients send and events the server emits.
//!
//! Both enums are internally tagged: every frame is a JSON object whose
//! `"type"` field names the variant, e.g.
//!
//! ```json
//! {"type": "joinRoom", "code": "K7QXM", "name": "Ada"}
//! {"type": "roundStart", "round": 1, "nRounds": 3, "expecting": "write", ...}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Chain, Content, Expecting, Phase, PlayerId, PlayerView, RoomCode,
    RoomListEntry,
};

/// What a player submits for their slot in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPayload {
    /// A drawing (image string) in draw rounds, a caption in write rounds.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    CreateRoom {
        name: String,
        #[serde(default)]
        is_public: bool,
    },
    ListPublicRooms,
    JoinRoom {
        code: RoomCode,
        name: String,
    },
    LeaveRoom {
        code: RoomCode,
    },
    ToggleReady {
        code: RoomCode,
    },
    StartGame {
        code: RoomCode,
    },
    SubmitInitialPrompt {
        code: RoomCode,
        #[serde(default)]
        prompt: String,
    },
    SubmitRound {
        code: RoomCode,
        slot_index: usize,
        payload: RoundPayload,
    },
    Vote {
        code: RoomCode,
        slot: usize,
        choice_index: u32,
    },
}

impl ClientCommand {
    /// The room a command is addressed to, if it names one.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } | Self::ListPublicRooms => None,
            Self::JoinRoom { code, .. }
            | Self::LeaveRoom { code }
            | Self::ToggleReady { code }
            | Self::StartGame { code }
            | Self::SubmitInitialPrompt { code, .. }
            | Self::SubmitRound { code, .. }
            | Self::Vote { code, .. } => Some(code),
        }
    }
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the id this player will appear
    /// under in `roomUpdate.players` and `hostId`.
    Connected {
        player_id: PlayerId,
    },
    RoomCreated {
        code: RoomCode,
    },
    Joined {
        code: RoomCode,
    },
    RoomList {
        rooms: Vec<RoomListEntry>,
    },
    RoomUpdate {
        players: Vec<PlayerView>,
        host_id: Option<PlayerId>,
        state: Phase,
        round: usize,
        n_rounds: usize,
    },
    RequestInitialPrompts,
    RoundStart {
        round: usize,
        n_rounds: usize,
        expecting: Expecting,
        slot_index: usize,
        content: Content,
        time_sec: u64,
    },
    Reveal {
        chains: Vec<Chain>,
    },
    VoteUpdate {
        slot: usize,
        counts: BTreeMap<u32, u64>,
    },
    SystemMsg {
        text: String,
    },
    ErrorMsg {
        text: String,
    },
}

impl ServerEvent {
    /// Wraps any displayable error as an `errorMsg` event.
    pub fn error(err: impl fmt::Display) -> Self {
        Self::ErrorMsg {
            text: err.to_string(),
        }
    }

    /// Shorthand for a `systemMsg` event.
    pub fn system(text: impl Into<String>) -> Self {
        Self::SystemMsg { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentKind;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> ClientCommand {
        serde_json::from_value(value).expect("should decode")
    }

    #[test]
    fn test_create_room_defaults_to_private() {
        let cmd = decode(json!({"type": "createRoom", "name": "Ada"}));
        assert_eq!(
            cmd,
            ClientCommand::CreateRoom {
                name: "Ada".into(),
                is_public: false
            }
        );
        let cmd = decode(json!({"type": "createRoom", "name": "Ada", "isPublic": true}));
        assert!(matches!(cmd, ClientCommand::CreateRoom { is_public: true, .. }));
    }

    #[test]
    fn test_unit_command_decodes() {
        let cmd = decode(json!({"type": "listPublicRooms"}));
        assert_eq!(cmd, ClientCommand::ListPublicRooms);
        assert_eq!(cmd.room_code(), None);
    }

    #[test]
    fn test_submit_round_shape() {
        let cmd = decode(json!({
            "type": "submitRound",
            "code": "abcde",
            "slotIndex": 2,
            "payload": {"data": "data:image/png;base64,AAA"}
        }));
        match cmd {
            ClientCommand::SubmitRound {
                code,
                slot_index,
                payload,
            } => {
                assert_eq!(code.as_str(), "ABCDE");
                assert_eq!(slot_index, 2);
                assert_eq!(payload.thumbnail, None);
            }
            other => panic!("expected SubmitRound, got {other:?}"),
        }
    }

    #[test]
    fn test_vote_uses_camel_case_choice_index() {
        let cmd = decode(json!({"type": "vote", "code": "X", "slot": 1, "choiceIndex": 4}));
        assert_eq!(
            cmd,
            ClientCommand::Vote {
                code: RoomCode::new("X"),
                slot: 1,
                choice_index: 4
            }
        );
    }

    #[test]
    fn test_blank_prompt_field_is_optional() {
        let cmd = decode(json!({"type": "submitInitialPrompt", "code": "X"}));
        assert!(matches!(cmd, ClientCommand::SubmitInitialPrompt { ref prompt, .. } if prompt.is_empty()));
    }

    #[test]
    fn test_room_update_wire_shape() {
        let event = ServerEvent::RoomUpdate {
            players: vec![PlayerView {
                id: PlayerId(1),
                name: "Ada".into(),
                ready: true,
            }],
            host_id: Some(PlayerId(1)),
            state: Phase::GatheringPrompts,
            round: 0,
            n_rounds: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "roomUpdate",
                "players": [{"id": 1, "name": "Ada", "ready": true}],
                "hostId": 1,
                "state": "gatheringPrompts",
                "round": 0,
                "nRounds": 0
            })
        );
    }

    #[test]
    fn test_round_start_wire_shape() {
        let event = ServerEvent::RoundStart {
            round: 1,
            n_rounds: 3,
            expecting: Expecting::Write,
            slot_index: 2,
            content: Content {
                kind: ContentKind::Image,
                data: "img".into(),
                thumbnail: None,
            },
            time_sec: 60,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "roundStart");
        assert_eq!(json["nRounds"], 3);
        assert_eq!(json["expecting"], "write");
        assert_eq!(json["slotIndex"], 2);
        assert_eq!(json["content"]["type"], "image");
        assert_eq!(json["timeSec"], 60);
    }

    #[test]
    fn test_request_initial_prompts_is_bare_tag() {
        let json = serde_json::to_value(ServerEvent::RequestInitialPrompts).unwrap();
        assert_eq!(json, json!({"type": "requestInitialPrompts"}));
    }

    #[test]
    fn test_vote_update_counts_keyed_by_choice() {
        let event = ServerEvent::VoteUpdate {
            slot: 0,
            counts: BTreeMap::from([(2, 3)]),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({"type": "voteUpdate", "slot": 0, "counts": {"2": 3}}));
    }

    #[test]
    fn test_error_helper_uses_display() {
        let event = ServerEvent::error("room ABCDE not found");
        assert_eq!(
            event,
            ServerEvent::ErrorMsg {
                text: "room ABCDE not found".into()
            }
        );
    }
}
