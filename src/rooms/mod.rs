//! Room pairing and relay routing

pub mod registry;
pub mod room;

pub use registry::{JoinAccepted, Outbox, RoomRegistry};
pub use room::{ConnId, RoomError, RoomOptions, RoomPhase, DEFAULT_MATCH_DURATION_SECS};
