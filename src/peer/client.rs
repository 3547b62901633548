//! Client session: sends input, renders interpolated host state

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::{ClientWorld, InterpolationConfig, PhysicsConfig};
use crate::util::time::frame_interval;
use crate::ws::protocol::{ClientMsg, InputFlags, ServerMsg};

use super::render::{RenderFrame, Renderer};
use super::{RelayLink, SessionEnd};

pub struct ClientSession<R: Renderer> {
    link: RelayLink,
    input: watch::Receiver<InputFlags>,
    renderer: R,
    world: ClientWorld,
    player_radius: f64,
    room_code: String,
    player_name: String,
    password: Option<String>,
    match_duration_secs: Option<u32>,
}

impl<R: Renderer> ClientSession<R> {
    pub fn new(
        link: RelayLink,
        input: watch::Receiver<InputFlags>,
        renderer: R,
        room_code: impl Into<String>,
        player_name: impl Into<String>,
    ) -> Self {
        Self {
            link,
            input,
            renderer,
            world: ClientWorld::new(InterpolationConfig::default()),
            player_radius: PhysicsConfig::default().player_radius,
            room_code: room_code.into(),
            player_name: player_name.into(),
            password: None,
            match_duration_secs: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn world(&self) -> &ClientWorld {
        &self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Match duration announced by the room, once joined
    pub fn match_duration_secs(&self) -> Option<u32> {
        self.match_duration_secs
    }

    /// Join the room and mirror the host until the session ends
    pub async fn run(&mut self) -> SessionEnd {
        if let Err(end) = self.join_room().await {
            return end;
        }

        let mut frames = interval(frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = self.input.changed() => {
                    if changed.is_err() {
                        return SessionEnd::Shutdown;
                    }
                    let flags = *self.input.borrow_and_update();
                    if !self.link.send(ClientMsg::SendInput(flags)) {
                        return SessionEnd::ConnectionLost;
                    }
                }

                msg = self.link.rx.recv() => match msg {
                    Some(ServerMsg::ReceiveState(snapshot)) => {
                        self.world.apply_snapshot(&snapshot);
                    }
                    Some(ServerMsg::HostDisconnected) => {
                        return SessionEnd::HostDisconnected;
                    }
                    Some(ServerMsg::Rooms { .. }) | Some(ServerMsg::RoomsUpdated { .. }) => {}
                    Some(other) => {
                        debug!(msg = ?other, "Unexpected message for client");
                    }
                    None => return SessionEnd::ConnectionLost,
                },

                _ = frames.tick() => {
                    self.world.advance_frame();
                    // Nothing to show until the host has sent a snapshot
                    if self.world.snapshots_applied() > 0 {
                        self.renderer
                            .draw(&RenderFrame::from_world(&self.world, self.player_radius));
                    }
                }
            }
        }
    }

    async fn join_room(&mut self) -> Result<(), SessionEnd> {
        let request = ClientMsg::JoinRoom {
            room_code: self.room_code.clone(),
            player_name: self.player_name.clone(),
            password: self.password.clone(),
        };
        if !self.link.send(request) {
            return Err(SessionEnd::ConnectionLost);
        }

        loop {
            match self.link.rx.recv().await {
                Some(ServerMsg::RoomJoined {
                    success: true,
                    duration,
                    ..
                }) => {
                    info!(room_code = %self.room_code, duration_secs = ?duration, "Joined room");
                    self.match_duration_secs = duration;
                    return Ok(());
                }
                Some(ServerMsg::RoomJoined { error, .. }) => {
                    let reason = error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(SessionEnd::Rejected(reason));
                }
                // The host can leave between our join and its confirmation
                Some(ServerMsg::HostDisconnected) => return Err(SessionEnd::HostDisconnected),
                Some(other) => {
                    debug!(msg = ?other, "Ignoring message before join");
                }
                None => return Err(SessionEnd::ConnectionLost),
            }
        }
    }
}
