//! Room registry - pairing, routing and teardown for all live rooms

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ws::protocol::{InputFlags, RoomSummary, ServerMsg, StateSnapshot};

use super::room::{ClientSlot, ConnId, Room, RoomError, RoomOptions, RoomPhase};

/// Outbound queue of a connected endpoint
pub type Outbox = mpsc::UnboundedSender<ServerMsg>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Host,
    Client,
}

#[derive(Debug, Clone)]
struct Membership {
    code: String,
    role: Role,
}

/// Result of a successful join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAccepted {
    pub duration_secs: u32,
}

/// Registry of rooms and connected endpoints.
///
/// Code allocation goes through the vacant-entry API and joins mutate the
/// room under its entry lock, so neither a code nor a client slot can be
/// handed out twice. Notifications go to unbounded outboxes and are never
/// awaited while a lock is held.
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    endpoints: DashMap<ConnId, Outbox>,
    memberships: DashMap<ConnId, Membership>,
    rng: Mutex<ChaCha8Rng>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Registry with a reproducible room code sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rooms: DashMap::new(),
            endpoints: DashMap::new(),
            memberships: DashMap::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Register a freshly connected endpoint
    pub fn register_endpoint(&self, conn_id: ConnId, outbox: Outbox) {
        self.endpoints.insert(conn_id, outbox);
        debug!(conn_id = %conn_id, "Endpoint registered");
    }

    fn next_code(&self) -> String {
        self.rng.lock().gen_range(100_000..1_000_000u32).to_string()
    }

    /// Allocate a room with the caller as host
    pub fn create_room(&self, conn_id: ConnId, options: RoomOptions) -> Result<String, RoomError> {
        if self.memberships.contains_key(&conn_id) {
            return Err(RoomError::AlreadyInRoom);
        }

        let code = loop {
            let candidate = self.next_code();
            match self.rooms.entry(candidate.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Room::new(candidate.clone(), conn_id, options.clone()));
                    break candidate;
                }
                Entry::Occupied(_) => {
                    debug!(room_code = %candidate, "Room code collision, retrying");
                }
            }
        };

        self.memberships.insert(
            conn_id,
            Membership {
                code: code.clone(),
                role: Role::Host,
            },
        );

        info!(
            room_code = %code,
            conn_id = %conn_id,
            locked = !options.password.is_empty(),
            duration_secs = options.duration_secs,
            "Room created"
        );

        self.broadcast_rooms();
        Ok(code)
    }

    /// Join a room as its client
    pub fn join_room(
        &self,
        conn_id: ConnId,
        code: &str,
        player_name: &str,
        password: Option<&str>,
    ) -> Result<JoinAccepted, RoomError> {
        if self.memberships.contains_key(&conn_id) {
            return Err(RoomError::AlreadyInRoom);
        }

        let (host, duration_secs) = {
            let mut room = self.rooms.get_mut(code).ok_or(RoomError::NotFound)?;
            if room.closed {
                return Err(RoomError::NotFound);
            }
            if !room.accepts_password(password) {
                return Err(RoomError::WrongPassword);
            }
            if room.is_full() {
                return Err(RoomError::Full);
            }
            room.clients.push(ClientSlot {
                conn_id,
                name: player_name.to_string(),
            });
            // Recorded under the room lock so a concurrent host disconnect
            // either sees this membership or runs before the join
            self.memberships.insert(
                conn_id,
                Membership {
                    code: code.to_string(),
                    role: Role::Client,
                },
            );
            (room.host, room.duration_secs)
        };

        self.send(
            host,
            ServerMsg::PlayerJoined {
                player_id: conn_id.to_string(),
                player_name: player_name.to_string(),
            },
        );

        info!(room_code = %code, conn_id = %conn_id, "Client joined room");

        self.broadcast_rooms();
        Ok(JoinAccepted { duration_secs })
    }

    /// Deliver client input to its host. Returns false when the sender is
    /// not a room client.
    pub fn forward_input(&self, conn_id: ConnId, input: InputFlags) -> bool {
        let Some(code) = self.membership_code(conn_id, Role::Client) else {
            return false;
        };
        let Some(host) = self.rooms.get(&code).map(|room| room.host) else {
            return false;
        };

        self.send(
            host,
            ServerMsg::ReceiveInput {
                player_id: conn_id.to_string(),
                input,
            },
        );
        true
    }

    /// Deliver a host snapshot to the room's client. Returns false when the
    /// sender is not a room host.
    pub fn forward_state(&self, conn_id: ConnId, snapshot: StateSnapshot) -> bool {
        let Some(code) = self.membership_code(conn_id, Role::Host) else {
            return false;
        };
        let clients: Vec<ConnId> = match self.rooms.get(&code) {
            Some(room) => room.clients.iter().map(|c| c.conn_id).collect(),
            None => return false,
        };

        for client in clients {
            self.send(client, ServerMsg::ReceiveState(snapshot.clone()));
        }
        true
    }

    /// Tear down everything owned by a disconnected endpoint
    pub fn disconnect(&self, conn_id: ConnId) {
        self.endpoints.remove(&conn_id);

        let Some((_, membership)) = self.memberships.remove(&conn_id) else {
            return;
        };

        match membership.role {
            Role::Host => {
                // Notify inside the room lock so no join can slip in between
                // the notice and the removal
                if let Some(mut room) = self.rooms.get_mut(&membership.code) {
                    room.closed = true;
                    for client in &room.clients {
                        self.memberships.remove(&client.conn_id);
                        self.send(client.conn_id, ServerMsg::HostDisconnected);
                    }
                }

                self.rooms.remove(&membership.code);

                info!(room_code = %membership.code, conn_id = %conn_id, "Room closed (host left)");
            }
            Role::Client => {
                let host = self.rooms.get_mut(&membership.code).map(|mut room| {
                    room.clients.retain(|c| c.conn_id != conn_id);
                    room.host
                });

                match host {
                    Some(host) => {
                        self.send(
                            host,
                            ServerMsg::PlayerLeft {
                                player_id: conn_id.to_string(),
                            },
                        );
                        info!(room_code = %membership.code, conn_id = %conn_id, "Client left room");
                    }
                    None => {
                        warn!(room_code = %membership.code, conn_id = %conn_id, "Client left a room that no longer exists");
                    }
                }
            }
        }

        self.broadcast_rooms();
    }

    /// Open rooms, ordered by code
    pub fn public_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .iter()
            .filter(|entry| !entry.value().closed)
            .map(|entry| entry.value().summary())
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    pub fn room_phase(&self, code: &str) -> Option<RoomPhase> {
        self.rooms.get(code).map(|room| room.phase())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn connected_endpoints(&self) -> usize {
        self.endpoints.len()
    }

    fn membership_code(&self, conn_id: ConnId, role: Role) -> Option<String> {
        self.memberships
            .get(&conn_id)
            .filter(|m| m.role == role)
            .map(|m| m.code.clone())
    }

    /// Queue a message for one endpoint; unknown or closed endpoints are skipped
    pub fn send(&self, conn_id: ConnId, msg: ServerMsg) {
        if let Some(outbox) = self.endpoints.get(&conn_id) {
            if outbox.send(msg).is_err() {
                debug!(conn_id = %conn_id, "Outbox closed");
            }
        }
    }

    fn broadcast_rooms(&self) {
        let rooms = self.public_rooms();
        for entry in self.endpoints.iter() {
            let _ = entry.value().send(ServerMsg::RoomsUpdated {
                rooms: rooms.clone(),
            });
        }
    }

    #[cfg(test)]
    fn reseed(&self, seed: u64) {
        *self.rng.lock() = ChaCha8Rng::seed_from_u64(seed);
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
