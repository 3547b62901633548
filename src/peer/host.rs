//! Host session: owns the authoritative simulation.
//!
//! Physics, snapshot broadcast and render run on three intervals multiplexed
//! with relay messages and local input in one `select!` loop, so a step never
//! overlaps another step or an input update. Inputs received between two
//! steps are picked up by the next step.

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::{PhysicsConfig, Simulation, SnapshotBuilder, HOST_PLAYER_ID, REMOTE_PLAYER_ID};
use crate::util::time::{frame_interval, snapshot_interval, step_interval};
use crate::ws::protocol::{ClientMsg, InputFlags, ServerMsg, Team};

use super::render::{RenderFrame, Renderer};
use super::{RelayLink, SessionEnd};

/// Host lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// Waiting for the relay to allocate a room
    Connecting,
    /// Room open, waiting for an opponent
    Lobby,
    /// Both players on the field
    Playing,
}

pub struct HostSession<R: Renderer> {
    link: RelayLink,
    input: watch::Receiver<InputFlags>,
    renderer: R,
    sim: Simulation,
    snapshots: SnapshotBuilder,
    phase: HostPhase,
    host_name: String,
    password: Option<String>,
    duration_secs: Option<u32>,
    room_code: Option<String>,
}

impl<R: Renderer> HostSession<R> {
    pub fn new(
        link: RelayLink,
        input: watch::Receiver<InputFlags>,
        renderer: R,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            link,
            input,
            renderer,
            sim: Simulation::new(PhysicsConfig::default()),
            snapshots: SnapshotBuilder::new(),
            phase: HostPhase::Connecting,
            host_name: host_name.into(),
            password: None,
            duration_secs: None,
            room_code: None,
        }
    }

    /// Lock the room with a password
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Match duration announced to the joining player
    pub fn with_duration(mut self, duration_secs: Option<u32>) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn snapshots(&self) -> &SnapshotBuilder {
        &self.snapshots
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Create a room and run the match until the session ends
    pub async fn run(&mut self) -> SessionEnd {
        if let Err(end) = self.create_room().await {
            return end;
        }

        let mut physics = interval(step_interval());
        physics.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut broadcast = interval(snapshot_interval());
        broadcast.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames = interval(frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = self.input.changed() => {
                    if changed.is_err() {
                        return SessionEnd::Shutdown;
                    }
                    let flags = *self.input.borrow_and_update();
                    self.sim.set_input(HOST_PLAYER_ID, flags);
                }

                msg = self.link.rx.recv() => {
                    let Some(msg) = msg else {
                        return SessionEnd::ConnectionLost;
                    };
                    if let Some(end) = self.handle_relay(msg) {
                        return end;
                    }
                }

                _ = physics.tick() => {
                    if self.phase == HostPhase::Playing {
                        if let Some(team) = self.sim.step() {
                            debug!(team = %team, step = self.sim.current_step(), "Reset for kick-off");
                        }
                    }
                }

                _ = broadcast.tick() => {
                    if self.phase == HostPhase::Playing {
                        let snapshot = self.snapshots.build(&self.sim);
                        if !self.link.send(ClientMsg::SendState(snapshot)) {
                            return SessionEnd::ConnectionLost;
                        }
                    }
                }

                _ = frames.tick() => {
                    if self.phase == HostPhase::Playing {
                        self.renderer.draw(&RenderFrame::from_simulation(&self.sim));
                    }
                }
            }
        }
    }

    async fn create_room(&mut self) -> Result<(), SessionEnd> {
        let request = ClientMsg::CreateRoom {
            player_name: Some(self.host_name.clone()),
            password: self.password.clone(),
            duration: self.duration_secs,
        };
        if !self.link.send(request) {
            return Err(SessionEnd::ConnectionLost);
        }

        loop {
            match self.link.rx.recv().await {
                Some(ServerMsg::RoomCreated {
                    success: true,
                    room_code,
                    ..
                }) => {
                    info!(room_code = ?room_code, "Room created, waiting for an opponent");
                    self.room_code = room_code;
                    self.phase = HostPhase::Lobby;
                    return Ok(());
                }
                Some(ServerMsg::RoomCreated { error, .. }) => {
                    let reason = error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(SessionEnd::Rejected(reason));
                }
                Some(other) => {
                    debug!(msg = ?other, "Ignoring message before room creation");
                }
                None => return Err(SessionEnd::ConnectionLost),
            }
        }
    }

    fn handle_relay(&mut self, msg: ServerMsg) -> Option<SessionEnd> {
        match msg {
            ServerMsg::PlayerJoined {
                player_id,
                player_name,
            } => {
                if self.phase == HostPhase::Playing {
                    self.sim.set_player_name(REMOTE_PLAYER_ID, &player_name);
                    return None;
                }

                self.sim.add_player(HOST_PLAYER_ID, &self.host_name, Team::Red);
                self.sim.add_player(REMOTE_PLAYER_ID, &player_name, Team::Blue);
                self.sim.set_input(HOST_PLAYER_ID, *self.input.borrow());
                self.phase = HostPhase::Playing;
                info!(
                    room_code = ?self.room_code,
                    endpoint = %player_id,
                    opponent = %player_name,
                    "Opponent joined, kick-off"
                );
            }
            ServerMsg::ReceiveInput { input, .. } => {
                self.sim.set_input(REMOTE_PLAYER_ID, input);
            }
            ServerMsg::PlayerLeft { player_id } => {
                warn!(endpoint = %player_id, "Opponent left");
                return Some(SessionEnd::PeerLeft);
            }
            ServerMsg::Rooms { .. } | ServerMsg::RoomsUpdated { .. } => {}
            other => {
                debug!(msg = ?other, "Unexpected message for host");
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::render::FrameRecorder;
    use crate::peer::testing::{link, FakeRelay};
    use tokio::time::Instant;

    fn created(room_code: &str) -> ServerMsg {
        ServerMsg::RoomCreated {
            success: true,
            room_code: Some(room_code.to_string()),
            error: None,
        }
    }

    fn joined() -> ServerMsg {
        ServerMsg::PlayerJoined {
            player_id: "endpoint-2".to_string(),
            player_name: "Guest".to_string(),
        }
    }

    async fn next_state(relay: &mut FakeRelay) -> crate::ws::protocol::StateSnapshot {
        loop {
            match relay.from_peer.recv().await {
                Some(ClientMsg::SendState(snapshot)) => return snapshot,
                Some(_) => continue,
                None => panic!("host session stopped"),
            }
        }
    }

    fn spawn_host(
        session: HostSession<FrameRecorder>,
    ) -> tokio::task::JoinHandle<(SessionEnd, HostSession<FrameRecorder>)> {
        tokio::spawn(async move {
            let mut session = session;
            let end = session.run().await;
            (end, session)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn host_plays_after_opponent_joins() {
        let (peer_link, mut relay) = link();
        let (_input_tx, input_rx) = watch::channel(InputFlags::default());
        let session = HostSession::new(peer_link, input_rx, FrameRecorder::default(), "Ayla")
            .with_duration(Some(90));
        let handle = spawn_host(session);

        match relay.from_peer.recv().await {
            Some(ClientMsg::CreateRoom {
                player_name,
                duration,
                ..
            }) => {
                assert_eq!(player_name.as_deref(), Some("Ayla"));
                assert_eq!(duration, Some(90));
            }
            other => panic!("unexpected message {:?}", other),
        }

        relay.to_peer.send(created("123456")).unwrap();
        relay.to_peer.send(joined()).unwrap();
        relay
            .to_peer
            .send(ServerMsg::ReceiveInput {
                player_id: "endpoint-2".to_string(),
                input: InputFlags {
                    a: true,
                    ..Default::default()
                },
            })
            .unwrap();

        let first = next_state(&mut relay).await;
        assert_eq!(first.players.len(), 2);
        assert_eq!(first.players[HOST_PLAYER_ID].color, Team::Red);
        assert_eq!(first.players[REMOTE_PLAYER_ID].name, "Guest");

        let later = next_state(&mut relay).await;
        assert!(later.players[REMOTE_PLAYER_ID].x < first.players[REMOTE_PLAYER_ID].x);
        assert!(later.players[REMOTE_PLAYER_ID].inputs.a);

        relay
            .to_peer
            .send(ServerMsg::PlayerLeft {
                player_id: "endpoint-2".to_string(),
            })
            .unwrap();

        let (end, session) = handle.await.unwrap();
        assert_eq!(end, SessionEnd::PeerLeft);
        assert_eq!(session.room_code(), Some("123456"));
        assert_eq!(session.phase(), HostPhase::Playing);
        assert!(!session.renderer().frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_go_out_every_forty_millis() {
        let (peer_link, mut relay) = link();
        let (_input_tx, input_rx) = watch::channel(InputFlags::default());
        let handle = spawn_host(HostSession::new(
            peer_link,
            input_rx,
            FrameRecorder::default(),
            "Host",
        ));

        relay.to_peer.send(created("222222")).unwrap();
        relay.to_peer.send(joined()).unwrap();

        next_state(&mut relay).await;
        let start = Instant::now();
        next_state(&mut relay).await;
        assert_eq!(start.elapsed(), snapshot_interval());

        drop(relay);
        let (end, session) = handle.await.unwrap();
        assert_eq!(end, SessionEnd::ConnectionLost);
        assert!(session.snapshots().stats().total_snapshots >= 2);
        assert!(session.simulation().current_step() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn local_input_moves_host_player() {
        let (peer_link, mut relay) = link();
        let (input_tx, input_rx) = watch::channel(InputFlags::default());
        let handle = spawn_host(HostSession::new(
            peer_link,
            input_rx,
            FrameRecorder::default(),
            "Host",
        ));

        relay.to_peer.send(created("333333")).unwrap();
        relay.to_peer.send(joined()).unwrap();
        next_state(&mut relay).await;

        input_tx
            .send(InputFlags {
                s: true,
                ..Default::default()
            })
            .unwrap();

        let mut moved = false;
        for _ in 0..10 {
            let snapshot = next_state(&mut relay).await;
            if snapshot.players[HOST_PLAYER_ID].y > 240.0 {
                moved = true;
                break;
            }
        }
        assert!(moved);

        drop(input_tx);
        let (end, _) = handle.await.unwrap();
        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_room_ends_session() {
        let (peer_link, relay) = link();
        let (_input_tx, input_rx) = watch::channel(InputFlags::default());
        let handle = spawn_host(HostSession::new(
            peer_link,
            input_rx,
            FrameRecorder::default(),
            "Host",
        ));

        relay
            .to_peer
            .send(ServerMsg::RoomCreated {
                success: false,
                room_code: None,
                error: Some("Already in a room".to_string()),
            })
            .unwrap();

        let (end, session) = handle.await.unwrap();
        assert_eq!(end, SessionEnd::Rejected("Already in a room".to_string()));
        assert_eq!(session.phase(), HostPhase::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn lobby_sends_nothing_until_opponent() {
        let (peer_link, mut relay) = link();
        let (_input_tx, input_rx) = watch::channel(InputFlags::default());
        let handle = spawn_host(HostSession::new(
            peer_link,
            input_rx,
            FrameRecorder::default(),
            "Host",
        ));

        relay.from_peer.recv().await;
        relay.to_peer.send(created("444444")).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert!(relay.from_peer.try_recv().is_err());

        drop(relay);
        let (end, session) = handle.await.unwrap();
        assert_eq!(end, SessionEnd::ConnectionLost);
        assert_eq!(session.phase(), HostPhase::Lobby);
        assert!(session.renderer().frames.is_empty());
    }
}
