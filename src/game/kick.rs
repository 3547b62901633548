//! Player/ball contact: kicks and dribbling

use super::physics::PhysicsConfig;

/// Geometry of a player relative to the ball for one step
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Distance between centres
    pub dist: f64,
    /// Angle of the player→ball vector
    pub angle: f64,
}

impl Contact {
    pub fn between(player_x: f64, player_y: f64, ball_x: f64, ball_y: f64) -> Self {
        let dx = ball_x - player_x;
        let dy = ball_y - player_y;
        Self {
            dist: (dx * dx + dy * dy).sqrt(),
            angle: dy.atan2(dx),
        }
    }
}

/// Kick and dribble rules
pub struct KickSystem;

impl KickSystem {
    /// Check if a player can kick at `step` (cooldown check)
    pub fn can_shoot(step: u64, ready_at: u64) -> bool {
        step >= ready_at
    }

    /// Step at which a kick taken at `step` wears off
    pub fn cooldown_until(step: u64, config: &PhysicsConfig) -> u64 {
        step + config.shoot_cooldown_steps
    }

    /// Reach of a kick, slightly larger than contact
    pub fn in_kick_range(contact: &Contact, config: &PhysicsConfig) -> bool {
        contact.dist < config.player_radius + config.ball_radius + config.kick_extra_range
    }

    pub fn in_contact(contact: &Contact, config: &PhysicsConfig) -> bool {
        contact.dist < config.player_radius + config.ball_radius
    }

    /// Velocity after a hard kick.
    /// Returns (new_vx, new_vy)
    pub fn kick(vx: f64, vy: f64, contact: &Contact, config: &PhysicsConfig) -> (f64, f64) {
        (
            vx + contact.angle.cos() * config.kick_force,
            vy + contact.angle.sin() * config.kick_force,
        )
    }

    /// Push the ball out of the player and add a dribble impulse.
    /// Returns (new_x, new_y, new_vx, new_vy)
    pub fn dribble(
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        contact: &Contact,
        config: &PhysicsConfig,
    ) -> (f64, f64, f64, f64) {
        let (sin, cos) = contact.angle.sin_cos();
        let overlap = (config.player_radius + config.ball_radius) - contact.dist;
        (
            x + cos * overlap,
            y + sin * overlap,
            vx + cos * config.dribble_force,
            vy + sin * config.dribble_force,
        )
    }
}
