//! Room state and room protocol errors

use uuid::Uuid;

use crate::ws::protocol::RoomSummary;

/// Relay-assigned id of a connected socket
pub type ConnId = Uuid;

/// Clients admitted per room; the game is strictly two-player
pub const MAX_CLIENTS: usize = 1;

/// Match length announced to joining clients when the host gives none
pub const DEFAULT_MATCH_DURATION_SECS: u32 = 120;

/// Room lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Host present, waiting for a client
    Open,
    /// Host and one client
    Paired,
    /// Host left; the entry is about to be removed
    Closed,
}

/// Settings chosen by the host on create-room
#[derive(Debug, Clone)]
pub struct RoomOptions {
    pub host_name: String,
    /// Empty means unlocked
    pub password: String,
    pub duration_secs: u32,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            host_name: "Host".to_string(),
            password: String::new(),
            duration_secs: DEFAULT_MATCH_DURATION_SECS,
        }
    }
}

/// A joined client endpoint
#[derive(Debug, Clone)]
pub struct ClientSlot {
    pub conn_id: ConnId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host: ConnId,
    pub host_name: String,
    pub clients: Vec<ClientSlot>,
    pub password: String,
    pub duration_secs: u32,
    pub closed: bool,
}

impl Room {
    pub fn new(code: String, host: ConnId, options: RoomOptions) -> Self {
        Self {
            code,
            host,
            host_name: options.host_name,
            clients: Vec::new(),
            password: options.password,
            duration_secs: options.duration_secs,
            closed: false,
        }
    }

    pub fn phase(&self) -> RoomPhase {
        if self.closed {
            RoomPhase::Closed
        } else if self.clients.is_empty() {
            RoomPhase::Open
        } else {
            RoomPhase::Paired
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= MAX_CLIENTS
    }

    pub fn accepts_password(&self, given: Option<&str>) -> bool {
        !self.is_locked() || given == Some(self.password.as_str())
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            host: self.host_name.clone(),
            player_count: self.clients.len() + 1,
            is_locked: self.is_locked(),
        }
    }
}

/// Room protocol errors, returned to the caller without closing the socket
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("Room is full")]
    Full,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Too many room requests, slow down")]
    RateLimited,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_membership() {
        let mut room = Room::new("123456".to_string(), Uuid::new_v4(), RoomOptions::default());
        assert_eq!(room.phase(), RoomPhase::Open);
        assert!(!room.is_full());

        room.clients.push(ClientSlot {
            conn_id: Uuid::new_v4(),
            name: "Guest".to_string(),
        });
        assert_eq!(room.phase(), RoomPhase::Paired);
        assert!(room.is_full());
        assert_eq!(room.summary().player_count, 2);

        room.closed = true;
        assert_eq!(room.phase(), RoomPhase::Closed);
    }

    #[test]
    fn password_lock() {
        let options = RoomOptions {
            password: "goal".to_string(),
            ..Default::default()
        };
        let room = Room::new("654321".to_string(), Uuid::new_v4(), options);
        assert!(room.summary().is_locked);
        assert!(room.accepts_password(Some("goal")));
        assert!(!room.accepts_password(Some("miss")));
        assert!(!room.accepts_password(None));
    }
}
