//! Authoritative match state and the fixed-step simulation

use tracing::{debug, info};

use crate::ws::protocol::{InputFlags, Scores, Team};

use super::kick::{Contact, KickSystem};
use super::physics::{PhysicsConfig, PhysicsSystem, WallOutcome};

/// Id the host uses for its own player
pub const HOST_PLAYER_ID: &str = "peer_host";
/// Id the host gives the remote peer's player
pub const REMOTE_PLAYER_ID: &str = "peer_blue";

/// Player state in a match (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub id: String,
    pub name: String,
    pub team: Team,
    pub x: f64,
    pub y: f64,
    /// Latest input; replaced wholesale, never queued
    pub input: InputFlags,
    /// First step at which this player may kick again
    pub shoot_ready_at: u64,
}

/// Ball state (authoritative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
}

impl BallState {
    fn at_center(config: &PhysicsConfig) -> Self {
        let (x, y) = config.center();
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: config.ball_radius,
        }
    }
}

/// Deterministic soccer simulation.
///
/// Players are kept in insertion order so two runs fed the same inputs
/// visit them identically.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: PhysicsConfig,
    step: u64,
    pub players: Vec<PlayerState>,
    pub ball: BallState,
    pub scores: Scores,
}

impl Simulation {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            step: 0,
            players: Vec::new(),
            ball: BallState::at_center(&config),
            scores: Scores::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of steps run so far
    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Add a player at its team's kick-off spot. An existing id is replaced.
    pub fn add_player(&mut self, id: &str, name: &str, team: Team) {
        let (_, center_y) = self.config.center();
        let player = PlayerState {
            id: id.to_string(),
            name: name.to_string(),
            team,
            x: self.config.start_x(team),
            y: center_y,
            input: InputFlags::default(),
            shoot_ready_at: 0,
        };

        info!(player_id = %id, team = %team, "Added player");
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = player,
            None => self.players.push(player),
        }
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn set_player_name(&mut self, id: &str, name: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.name = name.to_string();
        }
    }

    /// Replace a player's input (latest wins). Unknown ids are ignored.
    pub fn set_input(&mut self, id: &str, input: InputFlags) -> bool {
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) => {
                player.input = input;
                true
            }
            None => false,
        }
    }

    pub fn can_shoot(&self, player: &PlayerState) -> bool {
        KickSystem::can_shoot(self.step, player.shoot_ready_at)
    }

    /// Run one fixed step. Returns the team that scored, if any.
    pub fn step(&mut self) -> Option<Team> {
        let step = self.step;
        let config = self.config;
        let ball = &mut self.ball;

        for player in self.players.iter_mut() {
            let (x, y) = PhysicsSystem::move_player(player.x, player.y, &player.input, &config);
            player.x = x;
            player.y = y;

            let contact = Contact::between(player.x, player.y, ball.x, ball.y);

            if player.input.space
                && KickSystem::can_shoot(step, player.shoot_ready_at)
                && KickSystem::in_kick_range(&contact, &config)
            {
                let (vx, vy) = KickSystem::kick(ball.vx, ball.vy, &contact, &config);
                ball.vx = vx;
                ball.vy = vy;
                player.shoot_ready_at = KickSystem::cooldown_until(step, &config);
                debug!(player_id = %player.id, step, "Kick");
            }

            // Evaluated independently of the kick; both impulses may stack
            if KickSystem::in_contact(&contact, &config) {
                let (bx, by, vx, vy) =
                    KickSystem::dribble(ball.x, ball.y, ball.vx, ball.vy, &contact, &config);
                ball.x = bx;
                ball.y = by;
                ball.vx = vx;
                ball.vy = vy;
            }
        }

        let (x, y, vx, vy) = PhysicsSystem::integrate_ball(ball.x, ball.y, ball.vx, ball.vy, &config);
        ball.x = x;
        ball.y = y;
        ball.vx = vx;
        ball.vy = vy;

        let outcome = PhysicsSystem::collide_walls(
            &mut ball.x,
            &mut ball.y,
            &mut ball.vx,
            &mut ball.vy,
            &config,
        );

        self.step += 1;

        match outcome {
            WallOutcome::Goal(team) => {
                self.score(team);
                Some(team)
            }
            WallOutcome::InPlay => None,
        }
    }

    /// Award a goal and reset ball, players and cooldowns for kick-off
    pub fn score(&mut self, team: Team) {
        self.scores.award(team);

        self.ball = BallState::at_center(&self.config);

        let (_, center_y) = self.config.center();
        for player in self.players.iter_mut() {
            player.x = self.config.start_x(player.team);
            player.y = center_y;
            player.shoot_ready_at = 0;
        }

        info!(
            team = %team,
            red = self.scores.red,
            blue = self.scores.blue,
            "Goal scored"
        );
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn two_player_sim() -> Simulation {
        let mut sim = Simulation::default();
        sim.add_player(HOST_PLAYER_ID, "Host", Team::Red);
        sim.add_player(REMOTE_PLAYER_ID, "Guest", Team::Blue);
        sim
    }

    fn random_input(rng: &mut ChaCha8Rng) -> InputFlags {
        InputFlags {
            w: rng.gen_bool(0.3),
            a: rng.gen_bool(0.3),
            s: rng.gen_bool(0.3),
            d: rng.gen_bool(0.3),
            space: rng.gen_bool(0.2),
        }
    }

    fn scripted_inputs(seed: u64, steps: usize) -> Vec<(InputFlags, InputFlags)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..steps)
            .map(|_| (random_input(&mut rng), random_input(&mut rng)))
            .collect()
    }

    #[test]
    fn players_start_on_their_side() {
        let sim = two_player_sim();
        let red = sim.player(HOST_PLAYER_ID).unwrap();
        let blue = sim.player(REMOTE_PLAYER_ID).unwrap();
        assert_eq!((red.x, red.y), (100.0, 240.0));
        assert_eq!((blue.x, blue.y), (700.0, 240.0));
        assert_eq!((sim.ball.x, sim.ball.y), (400.0, 240.0));
    }

    #[test]
    fn identical_inputs_give_identical_trajectories() {
        let script = scripted_inputs(7, 3_000);
        let mut first = two_player_sim();
        let mut second = two_player_sim();

        for (host, remote) in &script {
            first.set_input(HOST_PLAYER_ID, *host);
            first.set_input(REMOTE_PLAYER_ID, *remote);
            second.set_input(HOST_PLAYER_ID, *host);
            second.set_input(REMOTE_PLAYER_ID, *remote);

            assert_eq!(first.step(), second.step());
            assert_eq!(first.ball, second.ball);
            assert_eq!(first.players, second.players);
            assert_eq!(first.scores, second.scores);
        }
    }

    #[test]
    fn players_never_leave_the_field() {
        let script = scripted_inputs(42, 2_000);
        let mut sim = two_player_sim();
        let config = *sim.config();
        let r = config.player_radius;

        for (host, remote) in script {
            sim.set_input(HOST_PLAYER_ID, host);
            sim.set_input(REMOTE_PLAYER_ID, remote);
            sim.step();

            for p in &sim.players {
                assert!(p.x >= r && p.x <= config.width - r, "x out of bounds: {}", p.x);
                assert!(p.y >= r && p.y <= config.height - r, "y out of bounds: {}", p.y);
            }
        }
    }

    #[test]
    fn ball_in_left_goal_scores_for_blue() {
        let mut sim = two_player_sim();
        sim.players[0].x = 300.0;
        sim.players[0].y = 100.0;
        sim.players[0].shoot_ready_at = 99;
        sim.ball.x = sim.ball.radius - 1.0;
        sim.ball.y = 240.0;

        assert_eq!(sim.step(), Some(Team::Blue));
        assert_eq!(sim.scores, Scores { red: 0, blue: 1 });
        assert_eq!(
            (sim.ball.x, sim.ball.y, sim.ball.vx, sim.ball.vy),
            (400.0, 240.0, 0.0, 0.0)
        );

        let red = sim.player(HOST_PLAYER_ID).unwrap();
        assert_eq!((red.x, red.y, red.shoot_ready_at), (100.0, 240.0, 0));
        let blue = sim.player(REMOTE_PLAYER_ID).unwrap();
        assert_eq!((blue.x, blue.y), (700.0, 240.0));
    }

    #[test]
    fn ball_in_right_goal_scores_for_red() {
        let mut sim = two_player_sim();
        sim.ball.x = sim.config().width - sim.ball.radius + 1.0;
        sim.ball.y = 260.0;

        assert_eq!(sim.step(), Some(Team::Red));
        assert_eq!(sim.scores, Scores { red: 1, blue: 0 });
        assert_eq!((sim.ball.x, sim.ball.y), (400.0, 240.0));
    }

    #[test]
    fn side_wall_outside_band_bounces() {
        let mut sim = two_player_sim();
        sim.ball.x = 9.0;
        sim.ball.y = 100.0;
        sim.ball.vx = -3.0;

        assert_eq!(sim.step(), None);
        assert_eq!(sim.scores, Scores::default());
        assert_eq!(sim.ball.x, sim.ball.radius);
        assert!(sim.ball.vx > 0.0);
        assert_approx_eq!(sim.ball.vx, 3.0 * 0.98, 1e-12);

        sim.ball.x = 795.0;
        sim.ball.y = 400.0;
        sim.ball.vx = 4.0;
        assert_eq!(sim.step(), None);
        assert_eq!(sim.ball.x, sim.config().width - sim.ball.radius);
        assert!(sim.ball.vx < 0.0);
        assert_eq!(sim.scores, Scores::default());
    }

    #[test]
    fn held_shoot_respects_cooldown() {
        let mut sim = two_player_sim();
        let held = InputFlags {
            space: true,
            ..Default::default()
        };
        sim.set_input(HOST_PLAYER_ID, held);

        let mut kick_steps = Vec::new();
        for _ in 0..40 {
            // Keep the ball inside kick range but out of dribble contact
            sim.ball.x = 130.0;
            sim.ball.y = 240.0;
            sim.ball.vx = 0.0;
            sim.ball.vy = 0.0;

            let step = sim.current_step();
            sim.step();
            if sim.ball.vx > 1.0 {
                kick_steps.push(step);
            }
        }

        assert_eq!(kick_steps, vec![0, 18, 36]);
    }

    #[test]
    fn kick_and_dribble_stack_in_one_step() {
        let mut sim = two_player_sim();
        sim.set_input(
            HOST_PLAYER_ID,
            InputFlags {
                space: true,
                ..Default::default()
            },
        );
        sim.ball.x = 120.0;
        sim.ball.y = 240.0;

        sim.step();

        assert_approx_eq!(sim.ball.vx, (12.0 + 2.5) * 0.98, 1e-9);
        assert_approx_eq!(sim.ball.x, 125.0 + 14.5, 1e-9);
        assert!(!sim.can_shoot(sim.player(HOST_PLAYER_ID).unwrap()));
    }

    #[test]
    fn unknown_player_input_is_ignored() {
        let mut sim = two_player_sim();
        assert!(!sim.set_input("ghost", InputFlags::default()));
        assert!(sim.set_input(REMOTE_PLAYER_ID, InputFlags::default()));
    }

    #[test]
    fn add_player_replaces_existing_id() {
        let mut sim = two_player_sim();
        sim.add_player(REMOTE_PLAYER_ID, "Again", Team::Blue);
        assert_eq!(sim.players.len(), 2);
        sim.set_player_name(REMOTE_PLAYER_ID, "Renamed");
        assert_eq!(sim.player(REMOTE_PLAYER_ID).unwrap().name, "Renamed");
    }
}
