//! Client-side smoothing of host snapshots.
//!
//! Snapshots arrive at the broadcast rate (25/s) while frames render at the
//! display rate. Each frame moves every entity a fixed fraction of the way
//! toward its latest snapshot position; large jumps (goal resets, newly
//! seen players) snap instead of sliding across the field.

use std::collections::BTreeMap;

use crate::ws::protocol::{InputFlags, Scores, StateSnapshot, Team};

use super::physics::PhysicsConfig;

pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.15;
pub const DEFAULT_TELEPORT_THRESHOLD: f64 = 100.0;

/// Below this remaining distance a position settles on its target
const SETTLE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct InterpolationConfig {
    /// Fraction of the remaining distance covered per frame
    pub smoothing_factor: f64,
    /// Distance beyond which positions snap
    pub teleport_threshold: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            teleport_threshold: DEFAULT_TELEPORT_THRESHOLD,
        }
    }
}

/// A rendered position chasing a network target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    pub x: f64,
    pub y: f64,
    target: Option<(f64, f64)>,
}

impl Smoothed {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, target: None }
    }

    pub fn target(&self) -> Option<(f64, f64)> {
        self.target
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn snap(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Record a new target; snaps on the first target or on a teleport
    pub fn set_target(&mut self, x: f64, y: f64, config: &InterpolationConfig) {
        if self.target.is_none() || self.distance_to(x, y) > config.teleport_threshold {
            self.snap(x, y);
        }
        self.target = Some((x, y));
    }

    /// Move one frame toward the target
    pub fn advance(&mut self, config: &InterpolationConfig) {
        let Some((tx, ty)) = self.target else {
            return;
        };

        let dist = self.distance_to(tx, ty);
        if dist > config.teleport_threshold || dist < SETTLE_EPSILON {
            self.snap(tx, ty);
        } else {
            self.x += (tx - self.x) * config.smoothing_factor;
            self.y += (ty - self.y) * config.smoothing_factor;
        }
    }
}

/// Render-only mirror of a player
#[derive(Debug, Clone)]
pub struct MirroredPlayer {
    pub id: String,
    pub name: String,
    pub team: Team,
    pub inputs: InputFlags,
    pub can_shoot: bool,
    pub position: Smoothed,
}

/// Client view of the match, fed by snapshots and advanced per frame
#[derive(Debug, Clone)]
pub struct ClientWorld {
    config: InterpolationConfig,
    pub players: BTreeMap<String, MirroredPlayer>,
    pub ball: Smoothed,
    pub ball_radius: f64,
    pub scores: Scores,
    snapshots_applied: u64,
}

impl ClientWorld {
    pub fn new(config: InterpolationConfig) -> Self {
        let field = PhysicsConfig::default();
        let (x, y) = field.center();
        Self {
            config,
            players: BTreeMap::new(),
            ball: Smoothed::new(x, y),
            ball_radius: field.ball_radius,
            scores: Scores::default(),
            snapshots_applied: 0,
        }
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    /// Take a snapshot's positions as targets and its other fields as-is
    pub fn apply_snapshot(&mut self, snapshot: &StateSnapshot) {
        let config = self.config;

        self.scores = snapshot.scores;
        self.ball_radius = snapshot.ball.radius;
        self.ball.set_target(snapshot.ball.x, snapshot.ball.y, &config);

        self.players
            .retain(|id, _| snapshot.players.contains_key(id));

        for (id, state) in &snapshot.players {
            let player = self
                .players
                .entry(id.clone())
                .or_insert_with(|| MirroredPlayer {
                    id: id.clone(),
                    name: state.name.clone(),
                    team: state.color,
                    inputs: state.inputs,
                    can_shoot: state.can_shoot,
                    position: Smoothed::new(state.x, state.y),
                });

            player.name = state.name.clone();
            player.team = state.color;
            player.inputs = state.inputs;
            player.can_shoot = state.can_shoot;
            player.position.set_target(state.x, state.y, &config);
        }

        self.snapshots_applied += 1;
    }

    /// Advance every entity one render frame
    pub fn advance_frame(&mut self) {
        let config = self.config;
        self.ball.advance(&config);
        for player in self.players.values_mut() {
            player.position.advance(&config);
        }
    }
}

impl Default for ClientWorld {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{BallSnapshot, PlayerSnapshot};
    use assert_approx_eq::assert_approx_eq;

    fn tracking(x: f64, y: f64) -> Smoothed {
        let mut s = Smoothed::new(x, y);
        s.set_target(x, y, &InterpolationConfig::default());
        s
    }

    fn snapshot(player_x: f64, ball_x: f64, red: u32) -> StateSnapshot {
        let mut players = BTreeMap::new();
        players.insert(
            "peer_blue".to_string(),
            PlayerSnapshot {
                id: "peer_blue".to_string(),
                name: "Guest".to_string(),
                x: player_x,
                y: 240.0,
                color: Team::Blue,
                inputs: InputFlags {
                    space: true,
                    ..Default::default()
                },
                can_shoot: false,
            },
        );
        StateSnapshot {
            players,
            ball: BallSnapshot {
                x: ball_x,
                y: 240.0,
                vx: 0.0,
                vy: 0.0,
                radius: 10.0,
            },
            scores: Scores { red, blue: 0 },
        }
    }

    #[test]
    fn one_frame_covers_smoothing_fraction() {
        let config = InterpolationConfig::default();
        let mut s = tracking(0.0, 0.0);
        s.set_target(100.0, 0.0, &config);
        assert_eq!(s.x, 0.0);

        s.advance(&config);
        assert_approx_eq!(s.x, 15.0, 1e-12);
    }

    #[test]
    fn large_jump_snaps_on_receipt() {
        let config = InterpolationConfig::default();
        let mut s = tracking(0.0, 0.0);
        s.set_target(200.0, 0.0, &config);
        assert_eq!(s.x, 200.0);

        s.advance(&config);
        assert_eq!(s.x, 200.0);
    }

    #[test]
    fn first_target_bootstraps_position() {
        let config = InterpolationConfig::default();
        let mut s = Smoothed::new(400.0, 240.0);
        assert!(s.target().is_none());
        s.advance(&config);
        assert_eq!((s.x, s.y), (400.0, 240.0));

        s.set_target(420.0, 250.0, &config);
        assert_eq!((s.x, s.y), (420.0, 250.0));
    }

    #[test]
    fn repeated_frames_converge_without_overshoot() {
        let config = InterpolationConfig::default();
        let mut s = tracking(0.0, 0.0);
        s.set_target(80.0, -40.0, &config);

        let mut last = 0.0;
        for _ in 0..200 {
            s.advance(&config);
            assert!(s.x >= last && s.x <= 80.0);
            assert!(s.y <= 0.0 && s.y >= -40.0);
            last = s.x;
        }
        assert_eq!((s.x, s.y), (80.0, -40.0));
    }

    #[test]
    fn world_applies_scores_and_flags_immediately() {
        let mut world = ClientWorld::default();
        world.apply_snapshot(&snapshot(700.0, 400.0, 0));
        world.apply_snapshot(&snapshot(650.0, 450.0, 2));

        assert_eq!(world.scores.red, 2);
        let player = &world.players["peer_blue"];
        assert!(player.inputs.space);
        assert!(!player.can_shoot);
        assert_eq!(player.position.x, 700.0);
        assert_eq!(player.position.target(), Some((650.0, 240.0)));

        world.advance_frame();
        let player = &world.players["peer_blue"];
        assert_approx_eq!(player.position.x, 700.0 - 50.0 * 0.15, 1e-9);
        assert_approx_eq!(world.ball.x, 400.0 + 50.0 * 0.15, 1e-9);
    }

    #[test]
    fn goal_reset_snaps_players_home() {
        let mut world = ClientWorld::default();
        world.apply_snapshot(&snapshot(150.0, 30.0, 0));
        world.apply_snapshot(&snapshot(700.0, 400.0, 1));

        assert_eq!(world.players["peer_blue"].position.x, 700.0);
        assert_eq!(world.ball.x, 400.0);
    }

    #[test]
    fn players_missing_from_snapshot_are_dropped() {
        let mut world = ClientWorld::default();
        world.apply_snapshot(&snapshot(700.0, 400.0, 0));
        let mut empty = snapshot(700.0, 400.0, 0);
        empty.players.clear();
        world.apply_snapshot(&empty);
        assert!(world.players.is_empty());
        assert_eq!(world.snapshots_applied(), 2);
    }
}
