//! Peer side of a match: the host and client sessions, their relay
//! transport, and render output

pub mod client;
pub mod host;
pub mod render;
pub mod transport;

use tokio::sync::mpsc;

use crate::ws::protocol::{ClientMsg, ServerMsg};

pub use client::ClientSession;
pub use host::{HostPhase, HostSession};
pub use render::{LogRenderer, RenderFrame, Renderer};

/// Message channels to and from the relay
pub struct RelayLink {
    pub tx: mpsc::UnboundedSender<ClientMsg>,
    pub rx: mpsc::UnboundedReceiver<ServerMsg>,
}

impl RelayLink {
    /// Queue a message for the relay. Returns false once the link is gone.
    pub fn send(&self, msg: ClientMsg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Why a peer session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client left the host's room
    PeerLeft,
    /// The host left; only seen by clients
    HostDisconnected,
    /// The relay connection dropped
    ConnectionLost,
    /// The relay refused create or join
    Rejected(String),
    /// Local input closed
    Shutdown,
}

impl SessionEnd {
    /// Notice shown to the player when the session ends
    pub fn notice(&self) -> String {
        match self {
            SessionEnd::PeerLeft => "Opponent left the match".to_string(),
            SessionEnd::HostDisconnected => "Host disconnected".to_string(),
            SessionEnd::ConnectionLost => "Connection to the relay was lost".to_string(),
            SessionEnd::Rejected(reason) => format!("Relay refused the request: {}", reason),
            SessionEnd::Shutdown => "Session closed".to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Far end of a [`RelayLink`], standing in for the relay
    pub struct FakeRelay {
        pub from_peer: mpsc::UnboundedReceiver<ClientMsg>,
        pub to_peer: mpsc::UnboundedSender<ServerMsg>,
    }

    pub fn link() -> (RelayLink, FakeRelay) {
        let (tx, from_peer) = mpsc::unbounded_channel();
        let (to_peer, rx) = mpsc::unbounded_channel();
        (RelayLink { tx, rx }, FakeRelay { from_peer, to_peer })
    }
}
