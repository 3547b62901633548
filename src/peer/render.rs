//! Render loop output.
//!
//! A frame is read from whatever state the peer currently shows (the
//! authoritative simulation on the host, the interpolated world on the
//! client) and handed to a [`Renderer`]. Frames are produced on their own
//! interval and never drive the simulation.

use tracing::{info, trace};

use crate::game::{ClientWorld, Simulation};
use crate::ws::protocol::{Scores, Team};

/// One player as drawn
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSprite {
    pub id: String,
    pub name: String,
    pub team: Team,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Shoot held, drawn as a kick ring
    pub kicking: bool,
    pub can_shoot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSprite {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub players: Vec<PlayerSprite>,
    pub ball: BallSprite,
    pub scores: Scores,
}

impl RenderFrame {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let radius = sim.config().player_radius;
        Self {
            players: sim
                .players
                .iter()
                .map(|p| PlayerSprite {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    team: p.team,
                    x: p.x,
                    y: p.y,
                    radius,
                    kicking: p.input.space,
                    can_shoot: sim.can_shoot(p),
                })
                .collect(),
            ball: BallSprite {
                x: sim.ball.x,
                y: sim.ball.y,
                radius: sim.ball.radius,
            },
            scores: sim.scores,
        }
    }

    pub fn from_world(world: &ClientWorld, player_radius: f64) -> Self {
        Self {
            players: world
                .players
                .values()
                .map(|p| PlayerSprite {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    team: p.team,
                    x: p.position.x,
                    y: p.position.y,
                    radius: player_radius,
                    kicking: p.inputs.space,
                    can_shoot: p.can_shoot,
                })
                .collect(),
            ball: BallSprite {
                x: world.ball.x,
                y: world.ball.y,
                radius: world.ball_radius,
            },
            scores: world.scores,
        }
    }
}

/// Draw target for render frames
pub trait Renderer: Send {
    fn draw(&mut self, frame: &RenderFrame);
}

/// Headless renderer that writes frames to the log.
///
/// Every frame goes out at `trace`; score changes are reported at `info`.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    last_scores: Option<Scores>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: &RenderFrame) {
        self.frames += 1;

        if self.last_scores != Some(frame.scores) {
            info!(
                red = frame.scores.get(Team::Red),
                blue = frame.scores.get(Team::Blue),
                "Score"
            );
            self.last_scores = Some(frame.scores);
        }

        trace!(
            frame = self.frames,
            ball_x = frame.ball.x,
            ball_y = frame.ball.y,
            players = frame.players.len(),
            "Frame"
        );
        for p in &frame.players {
            trace!(player_id = %p.id, team = %p.team, x = p.x, y = p.y, kicking = p.kicking, "Player");
        }
    }
}

/// Renderer that keeps every frame, for inspecting session output
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: Vec<RenderFrame>,
}

impl Renderer for FrameRecorder {
    fn draw(&mut self, frame: &RenderFrame) {
        self.frames.push(frame.clone());
    }
}
