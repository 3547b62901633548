//! Field geometry, movement and ball/wall physics

use std::time::Duration;

use crate::util::time::steps_for;
use crate::ws::protocol::{InputFlags, Team};

/// Physics constants for a match
#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    /// Field width
    pub width: f64,
    /// Field height
    pub height: f64,
    /// Player collision radius
    pub player_radius: f64,
    /// Ball radius
    pub ball_radius: f64,
    /// Distance moved per step per active direction
    pub player_speed: f64,
    /// Ball velocity multiplier applied every step
    pub friction: f64,
    /// Reach added to the contact distance for kicks
    pub kick_extra_range: f64,
    /// Impulse of a kick
    pub kick_force: f64,
    /// Impulse of a dribble contact
    pub dribble_force: f64,
    /// Steps before a player may kick again
    pub shoot_cooldown_steps: u64,
    /// Goal mouth, exclusive on both ends
    pub goal_top: f64,
    pub goal_bottom: f64,
    /// Distance of each team's start position from its own wall
    pub start_inset: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 480.0,
            player_radius: 15.0,
            ball_radius: 10.0,
            player_speed: 7.0,
            friction: 0.98,
            kick_extra_range: 8.0,
            kick_force: 12.0,
            dribble_force: 2.5,
            shoot_cooldown_steps: steps_for(Duration::from_millis(300)),
            goal_top: 180.0,
            goal_bottom: 300.0,
            start_inset: 100.0,
        }
    }
}

impl PhysicsConfig {
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Kick-off x position of a team
    pub fn start_x(&self, team: Team) -> f64 {
        match team {
            Team::Red => self.start_inset,
            Team::Blue => self.width - self.start_inset,
        }
    }

    pub fn in_goal_band(&self, y: f64) -> bool {
        y > self.goal_top && y < self.goal_bottom
    }
}

/// What happened when the ball met a wall this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallOutcome {
    /// Inside the field or bounced
    InPlay,
    /// Crossed a goal line inside the band; the team scored
    Goal(Team),
}

/// Physics system for players and ball
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Move a player by its input and clamp it inside the field.
    /// Returns (new_x, new_y)
    pub fn move_player(x: f64, y: f64, input: &InputFlags, config: &PhysicsConfig) -> (f64, f64) {
        let mut new_x = x;
        let mut new_y = y;

        // No diagonal normalisation: each axis moves at full speed
        if input.w {
            new_y -= config.player_speed;
        }
        if input.s {
            new_y += config.player_speed;
        }
        if input.a {
            new_x -= config.player_speed;
        }
        if input.d {
            new_x += config.player_speed;
        }

        Self::clamp_player(new_x, new_y, config)
    }

    /// Hard wall for players: no bounce
    pub fn clamp_player(x: f64, y: f64, config: &PhysicsConfig) -> (f64, f64) {
        let r = config.player_radius;
        (
            x.max(r).min(config.width - r),
            y.max(r).min(config.height - r),
        )
    }

    /// Advance the ball one step and apply friction.
    /// Returns (new_x, new_y, new_vx, new_vy)
    pub fn integrate_ball(
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        config: &PhysicsConfig,
    ) -> (f64, f64, f64, f64) {
        let new_x = x + vx;
        let new_y = y + vy;
        (new_x, new_y, vx * config.friction, vy * config.friction)
    }

    /// Resolve ball against the four walls, detecting goals on the side walls.
    /// Mutates the ball in place when it bounces.
    pub fn collide_walls(
        x: &mut f64,
        y: &mut f64,
        vx: &mut f64,
        vy: &mut f64,
        config: &PhysicsConfig,
    ) -> WallOutcome {
        let r = config.ball_radius;

        if *y < r || *y > config.height - r {
            *vy = -*vy;
            *y = y.max(r).min(config.height - r);
        }

        if *x < r {
            if config.in_goal_band(*y) {
                return WallOutcome::Goal(Team::Blue);
            }
            *vx = -*vx;
            *x = r;
        }

        if *x > config.width - r {
            if config.in_goal_band(*y) {
                return WallOutcome::Goal(Team::Red);
            }
            *vx = -*vx;
            *x = config.width - r;
        }

        WallOutcome::InPlay
    }
}
