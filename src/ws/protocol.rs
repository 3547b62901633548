//! WebSocket protocol message definitions
//! These are the wire types shared by the relay and both peers

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Team a player belongs to; decides start side and kit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Starts on the left, scores through the right goal
    Red,
    /// Starts on the right, scores through the left goal
    Blue,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Red => f.write_str("red"),
            Team::Blue => f.write_str("blue"),
        }
    }
}

/// Keyboard state of one player.
///
/// Every field accepts any JSON value so a corrupt payload degrades to
/// "released" instead of being rejected; unknown fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFlags {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub w: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub a: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub s: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub d: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub space: bool,
}

impl InputFlags {
    /// Apply a key event; arrow keys map onto WASD.
    /// Returns false when the key is not bound.
    pub fn apply_key(&mut self, key: &str, down: bool) -> bool {
        let slot = match key.to_lowercase().as_str() {
            "w" | "arrowup" => &mut self.w,
            "a" | "arrowleft" => &mut self.a,
            "s" | "arrowdown" => &mut self.s,
            "d" | "arrowright" => &mut self.d,
            " " | "space" | "spacebar" => &mut self.space,
            _ => return false,
        };
        *slot = down;
        true
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(pressed) => pressed,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    })
}

/// Messages sent from a peer to the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Allocate a room with the caller as host
    CreateRoom {
        #[serde(default)]
        player_name: Option<String>,
        /// Non-empty password locks the room
        #[serde(default)]
        password: Option<String>,
        /// Match duration in seconds
        #[serde(default)]
        duration: Option<u32>,
    },

    /// Join an existing room as the client
    JoinRoom {
        room_code: String,
        player_name: String,
        #[serde(default)]
        password: Option<String>,
    },

    /// List open rooms
    GetRooms,

    /// Client keyboard state, forwarded to the host
    SendInput(InputFlags),

    /// Authoritative snapshot, forwarded to the client
    SendState(StateSnapshot),
}

/// Messages sent from the relay to a peer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Response to create-room
    RoomCreated {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Response to join-room
    RoomJoined {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u32>,
    },

    /// Response to get-rooms
    Rooms { rooms: Vec<RoomSummary> },

    /// Pushed to every endpoint whenever the room list changes
    RoomsUpdated { rooms: Vec<RoomSummary> },

    /// A client joined the host's room
    PlayerJoined {
        player_id: String,
        player_name: String,
    },

    /// Client input delivered to the host
    ReceiveInput {
        player_id: String,
        input: InputFlags,
    },

    /// Host snapshot delivered to the client
    ReceiveState(StateSnapshot),

    /// The host left; the client session is over
    HostDisconnected,

    /// The client left the host's room
    PlayerLeft { player_id: String },
}

/// Public listing entry for a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: String,
    /// Host display name
    pub host: String,
    pub player_count: usize,
    pub is_locked: bool,
}

/// Goal count per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub red: u32,
    pub blue: u32,
}

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn award(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Team, which is also the render colour
    pub color: Team,
    /// Current input, used for visual cues (kick glow)
    pub inputs: InputFlags,
    pub can_shoot: bool,
}

/// Ball state in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
}

/// Full authoritative state sent by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub players: BTreeMap<String, PlayerSnapshot>,
    pub ball: BallSnapshot,
    pub scores: Scores,
}
